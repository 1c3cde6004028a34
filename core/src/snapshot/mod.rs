//! JSON snapshots of a quiescent heap, for inspecting a runtime that was
//! captured elsewhere.

pub mod format;
pub mod loader;

pub use format::{ObjectRecord, ObjectSpec, Snapshot, UpvalRecord, UpvalState};
pub use loader::{build, load_file, load_str};
