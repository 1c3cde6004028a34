pub mod dump;
pub mod engine;
pub mod errors;
pub mod report;
pub mod runtime;
pub mod snapshot;

pub use dump::{Edge, HeapGraph, LabelPolicy, NodeId};
pub use engine::Inspector;
pub use report::Report;
pub use runtime::{GcRef, ObjectKind, Runtime, Value};

use std::path::Path;

use errors::{HeapScopeError, TraceError};

/// Traces every object reachable from the runtime's roots with the default
/// settings.
pub fn inspect(runtime: &Runtime) -> Result<HeapGraph, TraceError> {
    Inspector::default().inspect(runtime)
}

/// Loads a JSON heap snapshot and traces it end-to-end.
pub fn inspect_file(path: impl AsRef<Path>) -> Result<(Runtime, HeapGraph), HeapScopeError> {
    let runtime = snapshot::load_file(path)?;
    let graph = inspect(&runtime)?;
    Ok((runtime, graph))
}
