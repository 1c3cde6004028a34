pub mod heap;
pub mod object;
pub mod tag_method;
pub mod value;

pub use heap::{GcBox, GcRef, Heap, UpVal, UpValId};
pub use object::{
    CClosure, LocVar, LuaClosure, LuaString, Node, ObjectBody, ObjectKind, Proto, Table, Thread,
    UpvalDesc, Userdata,
};
pub use tag_method::TagMethod;
pub use value::Value;

use std::collections::HashMap;

use crate::errors::RuntimeError;

/// Registry array slot holding the globals table.
pub const REGISTRY_GLOBALS: i64 = 2;

/// Global state of an observed runtime: its heap plus the fixed roots.
#[derive(Debug)]
pub struct Runtime {
    heap: Heap,
    main_thread: GcRef,
    registry: Value,
    twups: Option<GcRef>,
    strings: HashMap<String, GcRef>,
}

impl Runtime {
    pub fn new() -> Self {
        let mut heap = Heap::new();
        let main_thread = heap.alloc(ObjectBody::Thread(Thread::default()));
        if let Some(ObjectBody::Thread(thread)) = heap.body_mut(main_thread) {
            thread.twups = Some(main_thread);
        }
        let globals = heap.alloc(ObjectBody::Table(Table::new()));
        let mut registry = Table::new();
        registry.array = vec![Value::Object(main_thread), Value::Object(globals)];
        let registry = heap.alloc(ObjectBody::Table(registry));

        Self {
            heap,
            main_thread,
            registry: Value::Object(registry),
            twups: None,
            strings: HashMap::new(),
        }
    }

    pub(crate) fn from_parts(
        heap: Heap,
        main_thread: GcRef,
        registry: Value,
        twups: Option<GcRef>,
    ) -> Self {
        let strings = heap
            .iter()
            .filter_map(|(gc, boxed)| match boxed.body() {
                ObjectBody::ShortString(s) => Some((s.as_str().to_string(), gc)),
                _ => None,
            })
            .collect();
        Self {
            heap,
            main_thread,
            registry,
            twups,
            strings,
        }
    }

    pub fn heap(&self) -> &Heap {
        &self.heap
    }

    pub fn main_thread(&self) -> GcRef {
        self.main_thread
    }

    pub fn registry(&self) -> Value {
        self.registry
    }

    /// Head of the list of threads with open upvalues.
    pub fn twups(&self) -> Option<GcRef> {
        self.twups
    }

    pub fn globals(&self) -> Option<GcRef> {
        let registry = self.heap.table(self.registry.as_object()?)?;
        registry
            .get(&Value::Integer(REGISTRY_GLOBALS))
            .as_object()
    }

    pub fn new_string(&mut self, contents: &str) -> GcRef {
        let string = LuaString::new(contents);
        if !string.fits_short() {
            return self.heap.alloc(ObjectBody::LongString(string));
        }
        if let Some(existing) = self.strings.get(contents) {
            return *existing;
        }
        let gc = self.heap.alloc(ObjectBody::ShortString(string));
        self.strings.insert(contents.to_string(), gc);
        gc
    }

    pub fn new_table(&mut self) -> GcRef {
        self.heap.alloc(ObjectBody::Table(Table::new()))
    }

    pub fn new_userdata(&mut self, size: usize) -> GcRef {
        self.heap.alloc(ObjectBody::Userdata(Userdata {
            size,
            ..Userdata::default()
        }))
    }

    pub fn new_proto(&mut self, proto: Proto) -> GcRef {
        self.heap.alloc(ObjectBody::Proto(proto))
    }

    pub fn new_lua_closure(
        &mut self,
        proto: Option<GcRef>,
        upvalues: Vec<Option<UpValId>>,
    ) -> Result<GcRef, RuntimeError> {
        if let Some(proto) = proto {
            self.expect_kind(proto, ObjectKind::Proto)?;
        }
        if let Some(id) = upvalues
            .iter()
            .flatten()
            .find(|id| self.heap.upval(**id).is_none())
        {
            return Err(RuntimeError::UnknownUpvalue { id: *id });
        }
        Ok(self
            .heap
            .alloc(ObjectBody::LuaClosure(LuaClosure { proto, upvalues })))
    }

    pub fn new_c_closure(&mut self, function: u64, upvalues: Vec<Value>) -> GcRef {
        self.heap
            .alloc(ObjectBody::CClosure(CClosure { function, upvalues }))
    }

    pub fn new_thread(&mut self) -> GcRef {
        let gc = self.heap.alloc(ObjectBody::Thread(Thread::default()));
        if let Some(ObjectBody::Thread(thread)) = self.heap.body_mut(gc) {
            thread.twups = Some(gc);
        }
        gc
    }

    pub fn new_closed_upval(&mut self, value: Value) -> UpValId {
        self.heap.alloc_upval(UpVal::Closed(value))
    }

    pub fn upval_value(&self, id: UpValId) -> Value {
        self.heap.upval_value(id)
    }

    pub fn table_set(&mut self, table: GcRef, key: Value, value: Value) -> Result<(), RuntimeError> {
        let key = normalize_key(key)?;
        let t = self.table_mut(table)?;
        t.set(key, value);
        t.invalidate_tm_cache();
        Ok(())
    }

    pub fn table_set_field(
        &mut self,
        table: GcRef,
        field: &str,
        value: Value,
    ) -> Result<(), RuntimeError> {
        let key = self.new_string(field);
        self.table_set(table, Value::Object(key), value)
    }

    pub fn table_get(&self, table: GcRef, key: &Value) -> Result<Value, RuntimeError> {
        let key = normalize_key(*key)?;
        match self.heap.body(table) {
            Some(ObjectBody::Table(t)) => Ok(t.get(&key)),
            Some(other) => Err(wrong_kind(table, "table", other)),
            None => Err(RuntimeError::NoSuchObject { object: table }),
        }
    }

    pub fn set_global(&mut self, name: &str, value: Value) -> Result<(), RuntimeError> {
        let globals = self.globals().ok_or(RuntimeError::NoSuchObject {
            object: self.registry.as_object().unwrap_or(self.main_thread),
        })?;
        self.table_set_field(globals, name, value)
    }

    /// Sets or clears the metatable of a table or userdata.
    pub fn set_metatable(
        &mut self,
        object: GcRef,
        metatable: Option<GcRef>,
    ) -> Result<(), RuntimeError> {
        if let Some(mt) = metatable {
            self.expect_kind(mt, ObjectKind::Table)?;
        }
        match self.heap.body_mut(object) {
            Some(ObjectBody::Table(t)) => {
                t.metatable = metatable;
                Ok(())
            }
            Some(ObjectBody::Userdata(u)) => {
                u.metatable = metatable;
                Ok(())
            }
            Some(other) => Err(wrong_kind(object, "table or userdata", other)),
            None => Err(RuntimeError::NoSuchObject { object }),
        }
    }

    pub fn set_user_value(&mut self, userdata: GcRef, value: Value) -> Result<(), RuntimeError> {
        match self.heap.body_mut(userdata) {
            Some(ObjectBody::Userdata(u)) => {
                u.user_value = value;
                Ok(())
            }
            Some(other) => Err(wrong_kind(userdata, "userdata", other)),
            None => Err(RuntimeError::NoSuchObject { object: userdata }),
        }
    }

    /// Pushes onto a thread's stack and returns the slot used.
    pub fn push(&mut self, thread: GcRef, value: Value) -> Result<usize, RuntimeError> {
        let th = self.thread_mut(thread)?;
        let slot = th.top;
        if slot < th.stack.len() {
            th.stack[slot] = value;
        } else {
            th.stack.push(value);
        }
        th.top += 1;
        Ok(slot)
    }

    /// Moves a thread's top. Slots above the new top keep their old values.
    pub fn set_top(&mut self, thread: GcRef, top: usize) -> Result<(), RuntimeError> {
        let th = self.thread_mut(thread)?;
        if top > th.stack.len() {
            return Err(RuntimeError::SlotOutOfRange {
                thread,
                slot: top,
                len: th.stack.len(),
            });
        }
        th.top = top;
        Ok(())
    }

    /// Finds or creates the open upvalue for a stack slot. The first open
    /// upvalue of a thread links it into the thread list.
    pub fn find_upval(&mut self, thread: GcRef, slot: usize) -> Result<UpValId, RuntimeError> {
        let th = self.thread_ref(thread)?;
        if slot >= th.stack.len() {
            return Err(RuntimeError::SlotOutOfRange {
                thread,
                slot,
                len: th.stack.len(),
            });
        }

        let mut insert_at = th.open_upvalues.len();
        for (pos, id) in th.open_upvalues.iter().enumerate() {
            if let Some(UpVal::Open { slot: level, .. }) = self.heap.upval(*id) {
                if *level == slot {
                    return Ok(*id);
                }
                if *level < slot {
                    insert_at = pos;
                    break;
                }
            }
        }

        let id = self.heap.alloc_upval(UpVal::Open { thread, slot });
        let head = self.twups;
        let th = self.thread_mut(thread)?;
        th.open_upvalues.insert(insert_at, id);
        if !th.is_listed(thread) {
            th.twups = head;
            self.twups = Some(thread);
        }
        Ok(id)
    }

    /// Closes every open upvalue at or above `level`, copying the slot value
    /// into the upvalue.
    pub fn close_upvals(&mut self, thread: GcRef, level: usize) -> Result<(), RuntimeError> {
        let th = self.thread_ref(thread)?;
        let closing: Vec<(UpValId, Value)> = th
            .open_upvalues
            .iter()
            .filter_map(|id| match self.heap.upval(*id) {
                Some(UpVal::Open { slot, .. }) if *slot >= level => {
                    Some((*id, th.stack.get(*slot).copied().unwrap_or_default()))
                }
                _ => None,
            })
            .collect();

        for (id, value) in &closing {
            if let Some(upval) = self.heap.upval_mut(*id) {
                *upval = UpVal::Closed(*value);
            }
        }
        let th = self.thread_mut(thread)?;
        th.open_upvalues
            .retain(|id| !closing.iter().any(|(closed, _)| closed == id));
        Ok(())
    }

    /// Looks up a metamethod in a metatable's hash part. A failed lookup sets
    /// the event's absence bit on the metatable; later lookups skip the scan.
    pub fn fast_tag_method(&self, metatable: Option<GcRef>, event: TagMethod) -> Option<Value> {
        let mt = self.heap.table(metatable?)?;
        if mt.flags() & event.cache_bit() != 0 {
            return None;
        }
        let found = mt
            .live_nodes()
            .find(|node| self.is_short_string(&node.key, event.name()))
            .map(|node| node.value);
        if found.is_none() {
            mt.set_flag(event.cache_bit());
        }
        found
    }

    fn is_short_string(&self, value: &Value, expected: &str) -> bool {
        match value.as_object().and_then(|gc| self.heap.body(gc)) {
            Some(ObjectBody::ShortString(s)) => s.as_str() == expected,
            _ => false,
        }
    }

    fn expect_kind(&self, object: GcRef, kind: ObjectKind) -> Result<(), RuntimeError> {
        match self.heap.body(object) {
            Some(body) if body.kind() == kind => Ok(()),
            Some(other) => Err(wrong_kind(object, kind.type_name(), other)),
            None => Err(RuntimeError::NoSuchObject { object }),
        }
    }

    fn table_mut(&mut self, table: GcRef) -> Result<&mut Table, RuntimeError> {
        match self.heap.body_mut(table) {
            Some(ObjectBody::Table(t)) => Ok(t),
            Some(other) => Err(wrong_kind(table, "table", other)),
            None => Err(RuntimeError::NoSuchObject { object: table }),
        }
    }

    fn thread_ref(&self, thread: GcRef) -> Result<&Thread, RuntimeError> {
        match self.heap.body(thread) {
            Some(ObjectBody::Thread(t)) => Ok(t),
            Some(other) => Err(wrong_kind(thread, "thread", other)),
            None => Err(RuntimeError::NoSuchObject { object: thread }),
        }
    }

    fn thread_mut(&mut self, thread: GcRef) -> Result<&mut Thread, RuntimeError> {
        match self.heap.body_mut(thread) {
            Some(ObjectBody::Thread(t)) => Ok(t),
            Some(other) => Err(wrong_kind(thread, "thread", other)),
            None => Err(RuntimeError::NoSuchObject { object: thread }),
        }
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

fn wrong_kind(object: GcRef, expected: &'static str, found: &ObjectBody) -> RuntimeError {
    RuntimeError::WrongKind {
        object,
        expected,
        found: found.kind(),
    }
}

fn normalize_key(key: Value) -> Result<Value, RuntimeError> {
    match key {
        Value::Nil => Err(RuntimeError::InvalidKey {
            reason: "key is nil",
        }),
        Value::Float(n) if n.is_nan() => Err(RuntimeError::InvalidKey {
            reason: "key is NaN",
        }),
        Value::Float(n) if n.fract() == 0.0 && n >= i64::MIN as f64 && n < i64::MAX as f64 => {
            Ok(Value::Integer(n as i64))
        }
        other => Ok(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_mode_lookup_sets_absence_bit() {
        let mut rt = Runtime::new();
        let mt = rt.new_table();
        rt.table_set_field(mt, "__index", Value::Boolean(true))
            .expect("set __index");

        assert!(rt.fast_tag_method(Some(mt), TagMethod::Mode).is_none());
        let flags = rt.heap().table(mt).expect("metatable").flags();
        assert_ne!(flags & TagMethod::Mode.cache_bit(), 0);
        assert_eq!(flags & TagMethod::Index.cache_bit(), 0);
    }

    #[test]
    fn cached_absence_skips_scan_until_table_is_written() {
        let mut rt = Runtime::new();
        let mt = rt.new_table();
        assert!(rt.fast_tag_method(Some(mt), TagMethod::Mode).is_none());

        let mode = rt.new_string("v");
        rt.table_set_field(mt, "__mode", Value::Object(mode))
            .expect("set __mode");
        assert_eq!(rt.heap().table(mt).expect("metatable").flags(), 0);
        assert_eq!(
            rt.fast_tag_method(Some(mt), TagMethod::Mode),
            Some(Value::Object(mode))
        );
    }

    #[test]
    fn metatable_that_is_not_a_table_has_no_metamethods() {
        let mut rt = Runtime::new();
        let s = rt.new_string("__mode");
        assert!(rt.fast_tag_method(Some(s), TagMethod::Mode).is_none());
        assert!(rt.fast_tag_method(None, TagMethod::Mode).is_none());
    }

    #[test]
    fn integral_float_keys_land_in_array_part() {
        let mut rt = Runtime::new();
        let t = rt.new_table();
        rt.table_set(t, Value::Float(1.0), Value::Integer(10))
            .expect("set 1");
        rt.table_set(t, Value::Integer(3), Value::Integer(30))
            .expect("set 3");
        rt.table_set(t, Value::Integer(2), Value::Integer(20))
            .expect("set 2");

        let table = rt.heap().table(t).expect("table");
        assert_eq!(
            table.array,
            vec![Value::Integer(10), Value::Integer(20), Value::Integer(30)]
        );
        assert!(table.hash.is_empty());
    }

    #[test]
    fn nil_and_nan_keys_are_rejected() {
        let mut rt = Runtime::new();
        let t = rt.new_table();
        assert!(rt.table_set(t, Value::Nil, Value::Integer(1)).is_err());
        assert!(
            rt.table_set(t, Value::Float(f64::NAN), Value::Integer(1))
                .is_err()
        );
    }

    #[test]
    fn short_strings_are_interned() {
        let mut rt = Runtime::new();
        let a = rt.new_string("name");
        let b = rt.new_string("name");
        assert_eq!(a, b);

        let long = "x".repeat(object::MAX_SHORT_LEN + 1);
        assert_ne!(rt.new_string(&long), rt.new_string(&long));
    }
}
