use crate::runtime::heap::{GcRef, UpValId};
use crate::runtime::value::Value;

/// A coroutine or the main execution context.
#[derive(Debug, Clone, Default)]
pub struct Thread {
    pub stack: Vec<Value>,
    /// First free slot. Slots at or above `top` may hold stale values.
    pub top: usize,
    /// Open upvalues, highest stack slot first.
    pub open_upvalues: Vec<UpValId>,
    /// Next thread in the list of threads with open upvalues. A thread that
    /// links to itself is not in the list.
    pub twups: Option<GcRef>,
}

impl Thread {
    pub fn live_slots(&self) -> &[Value] {
        &self.stack[..self.top.min(self.stack.len())]
    }

    pub fn is_listed(&self, this: GcRef) -> bool {
        self.twups != Some(this)
    }
}
