use std::cell::Cell;

use crate::runtime::heap::GcRef;
use crate::runtime::value::Value;

/// Hash-part slot. A node whose value is nil is empty; its key may be dead.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Node {
    pub key: Value,
    pub value: Value,
}

#[derive(Debug, Clone, Default)]
pub struct Table {
    pub array: Vec<Value>,
    pub hash: Vec<Node>,
    pub metatable: Option<GcRef>,
    flags: Cell<u8>,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bits set here record metamethods known to be absent.
    pub fn flags(&self) -> u8 {
        self.flags.get()
    }

    pub(crate) fn set_flag(&self, bit: u8) {
        self.flags.set(self.flags.get() | bit);
    }

    pub(crate) fn invalidate_tm_cache(&self) {
        self.flags.set(0);
    }

    pub fn live_nodes(&self) -> impl Iterator<Item = &Node> + '_ {
        self.hash.iter().filter(|node| !node.value.is_nil())
    }

    pub fn get(&self, key: &Value) -> Value {
        if let Some(idx) = array_index(key)
            && idx < self.array.len()
        {
            return self.array[idx];
        }
        self.hash
            .iter()
            .find(|node| node.key == *key)
            .map(|node| node.value)
            .unwrap_or_default()
    }

    /// Raw store. The key must already be normalized and non-nil.
    pub(crate) fn set(&mut self, key: Value, value: Value) {
        if let Some(idx) = array_index(&key) {
            if idx < self.array.len() {
                self.array[idx] = value;
                return;
            }
            if idx == self.array.len() && !value.is_nil() {
                self.hash.retain(|node| node.key != key);
                self.array.push(value);
                self.migrate_to_array();
                return;
            }
        }

        if let Some(node) = self.hash.iter_mut().find(|node| node.key == key) {
            node.value = value;
            return;
        }
        if !value.is_nil() {
            self.hash.push(Node { key, value });
        }
    }

    fn migrate_to_array(&mut self) {
        loop {
            let next = Value::Integer(self.array.len() as i64 + 1);
            let Some(pos) = self
                .hash
                .iter()
                .position(|node| node.key == next && !node.value.is_nil())
            else {
                break;
            };
            let node = self.hash.remove(pos);
            self.array.push(node.value);
        }
    }
}

fn array_index(key: &Value) -> Option<usize> {
    match key {
        Value::Integer(i) if *i >= 1 => usize::try_from(*i - 1).ok(),
        _ => None,
    }
}
