pub mod classify;
pub mod graph;
pub mod label;
pub mod roots;
pub mod tracer;

pub use classify::{Class, classify, classify_object, is_collectable};
pub use graph::{ChildInfo, Edge, HeapGraph, LabelPolicy, NodeId};
pub use roots::enumerate_roots;
pub use tracer::{GraphTracer, WeakMode, weak_mode};
