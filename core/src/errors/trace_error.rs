use miette::Diagnostic;
use thiserror::Error;

use crate::runtime::{GcRef, ObjectKind};

/// Fatal trace failures. Any of these means the heap model no longer matches
/// the runtime it describes, so no partial graph is returned.
#[derive(Debug, Error, Diagnostic)]
pub enum TraceError {
    #[error("object {object} carries unknown type tag {tag:#04x}")]
    #[diagnostic(
        code(heapscope::trace::unknown_kind),
        help("the object model is out of sync with the runtime's heap layout")
    )]
    UnknownObjectKind { object: GcRef, tag: u8 },

    #[error("reference to {object} does not resolve to a heap object")]
    #[diagnostic(code(heapscope::trace::dangling))]
    DanglingReference { object: GcRef },

    #[error("thread list reaches {thread} twice without a terminating link")]
    MalformedThreadList { thread: GcRef },

    #[error("thread list entry {object} is a {found}, not a thread")]
    NotAThread { object: GcRef, found: ObjectKind },
}
