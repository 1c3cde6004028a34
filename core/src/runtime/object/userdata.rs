use crate::runtime::heap::GcRef;
use crate::runtime::value::Value;

#[derive(Debug, Clone, Default)]
pub struct Userdata {
    pub size: usize,
    pub metatable: Option<GcRef>,
    pub user_value: Value,
}
