use serde::{Deserialize, Serialize};

use super::heap::GcRef;

/// A tagged value slot as the runtime stores it in stacks, tables and upvalues.
///
/// Only `Object` refers to the managed heap. Light userdata and light native
/// functions are raw addresses embedded in the slot itself.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Value {
    #[default]
    Nil,
    Boolean(bool),
    LightUserdata(u64),
    Integer(i64),
    Float(f64),
    LightFunction(u64),
    Object(GcRef),
}

impl Value {
    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    pub fn as_object(&self) -> Option<GcRef> {
        match self {
            Value::Object(gc) => Some(*gc),
            _ => None,
        }
    }
}

impl From<GcRef> for Value {
    fn from(gc: GcRef) -> Self {
        Value::Object(gc)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
    }
}
