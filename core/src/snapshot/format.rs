use serde::{Deserialize, Serialize};

use crate::runtime::{GcRef, Value};

/// On-disk description of a quiescent heap.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub main_thread: GcRef,
    pub registry: Value,
    /// Head of the list of threads with open upvalues.
    #[serde(default)]
    pub twups: Option<GcRef>,
    #[serde(default)]
    pub upvalues: Vec<UpvalRecord>,
    pub objects: Vec<ObjectRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpvalRecord {
    pub id: u32,
    #[serde(flatten)]
    pub state: UpvalState,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpvalState {
    Open { thread: GcRef, slot: usize },
    Closed(Value),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectRecord {
    pub address: GcRef,
    /// Raw header tag. Defaults to the tag implied by `kind`.
    #[serde(default)]
    pub tag: Option<u8>,
    #[serde(flatten)]
    pub body: ObjectSpec,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ObjectSpec {
    ShortString {
        value: String,
    },
    LongString {
        value: String,
    },
    Userdata {
        #[serde(default)]
        size: usize,
        #[serde(default)]
        metatable: Option<GcRef>,
        #[serde(default)]
        user_value: Value,
    },
    LuaClosure {
        #[serde(default)]
        proto: Option<GcRef>,
        #[serde(default)]
        upvalues: Vec<Option<u32>>,
    },
    CClosure {
        #[serde(default)]
        function: u64,
        #[serde(default)]
        upvalues: Vec<Value>,
    },
    Table {
        #[serde(default)]
        array: Vec<Value>,
        #[serde(default)]
        hash: Vec<(Value, Value)>,
        #[serde(default)]
        metatable: Option<GcRef>,
    },
    Thread {
        #[serde(default)]
        stack: Vec<Value>,
        /// Defaults to the full stack.
        #[serde(default)]
        top: Option<usize>,
        #[serde(default)]
        open_upvalues: Vec<u32>,
        /// Next listed thread. Absent means the thread links to itself.
        #[serde(default)]
        twups: Option<GcRef>,
    },
    Proto {
        #[serde(default)]
        source: Option<GcRef>,
        #[serde(default)]
        constants: Vec<Value>,
        #[serde(default)]
        upvalue_names: Vec<Option<GcRef>>,
        #[serde(default)]
        protos: Vec<GcRef>,
        #[serde(default)]
        local_names: Vec<Option<GcRef>>,
    },
}
