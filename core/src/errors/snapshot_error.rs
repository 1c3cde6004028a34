use miette::Diagnostic;
use thiserror::Error;

use crate::runtime::{GcRef, ObjectKind};

#[derive(Debug, Error, Diagnostic)]
pub enum SnapshotError {
    #[error("could not read snapshot '{path}'")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed snapshot: {0}")]
    #[diagnostic(code(heapscope::snapshot::json))]
    Json(#[from] serde_json::Error),

    #[error("address {address} is used by more than one object")]
    DuplicateAddress { address: GcRef },

    #[error("upvalue {id} is declared more than once")]
    DuplicateUpvalue { id: u32 },

    #[error("{from} references missing object {missing}")]
    #[diagnostic(help("every referenced address must appear in `objects`"))]
    MissingObject { from: String, missing: GcRef },

    #[error("{from} references undeclared upvalue {id}")]
    MissingUpvalue { from: String, id: u32 },

    #[error("{what} must be a thread, but {object} is a {found}")]
    NotAThread {
        what: String,
        object: GcRef,
        found: ObjectKind,
    },

    #[error("thread {thread} has top {top} beyond its stack of {len} slots")]
    TopOutOfRange {
        thread: GcRef,
        top: usize,
        len: usize,
    },
}
