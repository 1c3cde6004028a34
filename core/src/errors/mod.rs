mod runtime_error;
mod snapshot_error;
mod trace_error;

pub use runtime_error::RuntimeError;
pub use snapshot_error::SnapshotError;
pub use trace_error::TraceError;

use miette::Diagnostic;
use thiserror::Error;

/// Unified error type wrapping all heapscope errors.
#[derive(Debug, Error, Diagnostic)]
pub enum HeapScopeError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Trace(#[from] TraceError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Runtime(#[from] RuntimeError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Snapshot(#[from] SnapshotError),
}
