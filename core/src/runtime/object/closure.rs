use crate::runtime::heap::{GcRef, UpValId};
use crate::runtime::value::Value;

#[derive(Debug, Clone, Default)]
pub struct LuaClosure {
    pub proto: Option<GcRef>,
    pub upvalues: Vec<Option<UpValId>>,
}

#[derive(Debug, Clone, Default)]
pub struct CClosure {
    pub function: u64,
    pub upvalues: Vec<Value>,
}
