use miette::Diagnostic;
use thiserror::Error;

use crate::runtime::{GcRef, ObjectKind, UpValId};

#[derive(Debug, Error, Diagnostic)]
pub enum RuntimeError {
    #[error("no object at {object}")]
    NoSuchObject { object: GcRef },

    #[error("expected a {expected} at {object}, found a {found}")]
    WrongKind {
        object: GcRef,
        expected: &'static str,
        found: ObjectKind,
    },

    #[error("invalid table key: {reason}")]
    InvalidKey { reason: &'static str },

    #[error("slot {slot} is outside the stack of thread {thread} ({len} slots)")]
    SlotOutOfRange {
        thread: GcRef,
        slot: usize,
        len: usize,
    },

    #[error("unknown upvalue #{}", .id.index())]
    UnknownUpvalue { id: UpValId },
}
