use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::object::{LuaString, ObjectBody, Proto, Table, Thread};
use super::value::Value;

const FIRST_ADDRESS: u64 = 0x1000;
const OBJECT_ALIGN: u64 = 0x10;

/// Address-like identity of a heap object. Two references are the same object
/// iff their addresses are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GcRef(u64);

impl GcRef {
    pub const fn from_address(address: u64) -> Self {
        Self(address)
    }

    pub const fn address(self) -> u64 {
        self.0
    }
}

impl fmt::Display for GcRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UpValId(u32);

impl UpValId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Upvalue cell. Open cells alias a live stack slot of their thread; closed
/// cells own a copy of the value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UpVal {
    Open { thread: GcRef, slot: usize },
    Closed(Value),
}

#[derive(Debug, Clone)]
pub struct GcBox {
    tag: u8,
    body: ObjectBody,
}

impl GcBox {
    /// Raw type tag as stored in the object header.
    pub fn tag(&self) -> u8 {
        self.tag
    }

    pub fn body(&self) -> &ObjectBody {
        &self.body
    }
}

#[derive(Debug)]
pub struct Heap {
    objects: BTreeMap<GcRef, GcBox>,
    upvals: Vec<UpVal>,
    next_address: u64,
}

impl Heap {
    pub fn new() -> Self {
        Self {
            objects: BTreeMap::new(),
            upvals: Vec::new(),
            next_address: FIRST_ADDRESS,
        }
    }

    pub fn alloc(&mut self, body: ObjectBody) -> GcRef {
        let gc = GcRef(self.next_address);
        let tag = body.kind().tag();
        self.objects.insert(gc, GcBox { tag, body });
        self.next_address += OBJECT_ALIGN;
        gc
    }

    /// Places an object at a fixed address with an explicit header tag.
    /// Returns `false` if the address is already taken.
    pub(crate) fn alloc_at(&mut self, gc: GcRef, tag: u8, body: ObjectBody) -> bool {
        if self.objects.contains_key(&gc) {
            return false;
        }
        self.objects.insert(gc, GcBox { tag, body });
        let after = gc.0.saturating_add(OBJECT_ALIGN);
        if after > self.next_address {
            self.next_address = after;
        }
        true
    }

    pub fn get(&self, gc: GcRef) -> Option<&GcBox> {
        self.objects.get(&gc)
    }

    pub fn body(&self, gc: GcRef) -> Option<&ObjectBody> {
        self.objects.get(&gc).map(|boxed| &boxed.body)
    }

    pub(crate) fn body_mut(&mut self, gc: GcRef) -> Option<&mut ObjectBody> {
        self.objects.get_mut(&gc).map(|boxed| &mut boxed.body)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (GcRef, &GcBox)> + '_ {
        self.objects.iter().map(|(gc, boxed)| (*gc, boxed))
    }

    pub fn string(&self, gc: GcRef) -> Option<&LuaString> {
        match self.body(gc)? {
            ObjectBody::ShortString(s) | ObjectBody::LongString(s) => Some(s),
            _ => None,
        }
    }

    pub fn table(&self, gc: GcRef) -> Option<&Table> {
        match self.body(gc)? {
            ObjectBody::Table(t) => Some(t),
            _ => None,
        }
    }

    pub fn thread(&self, gc: GcRef) -> Option<&Thread> {
        match self.body(gc)? {
            ObjectBody::Thread(t) => Some(t),
            _ => None,
        }
    }

    pub fn proto(&self, gc: GcRef) -> Option<&Proto> {
        match self.body(gc)? {
            ObjectBody::Proto(p) => Some(p),
            _ => None,
        }
    }

    pub fn alloc_upval(&mut self, upval: UpVal) -> UpValId {
        let id = UpValId(self.upvals.len() as u32);
        self.upvals.push(upval);
        id
    }

    pub fn upval(&self, id: UpValId) -> Option<&UpVal> {
        self.upvals.get(id.index())
    }

    pub(crate) fn upval_mut(&mut self, id: UpValId) -> Option<&mut UpVal> {
        self.upvals.get_mut(id.index())
    }

    /// Current value seen through an upvalue cell. An open cell reads its
    /// thread's stack slot; a slot past the end of the stack reads as nil.
    pub fn upval_value(&self, id: UpValId) -> Value {
        match self.upval(id) {
            Some(UpVal::Closed(value)) => *value,
            Some(UpVal::Open { thread, slot }) => self
                .thread(*thread)
                .and_then(|t| t.stack.get(*slot))
                .copied()
                .unwrap_or_default(),
            None => Value::Nil,
        }
    }
}

impl Default for Heap {
    fn default() -> Self {
        Self::new()
    }
}
