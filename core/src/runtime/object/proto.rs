use crate::runtime::heap::GcRef;
use crate::runtime::value::Value;

#[derive(Debug, Clone, Copy, Default)]
pub struct UpvalDesc {
    pub name: Option<GcRef>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LocVar {
    pub name: Option<GcRef>,
}

/// Compiled function template shared by every closure built from it.
#[derive(Debug, Clone, Default)]
pub struct Proto {
    pub source: Option<GcRef>,
    pub constants: Vec<Value>,
    pub upvalues: Vec<UpvalDesc>,
    pub protos: Vec<GcRef>,
    pub locvars: Vec<LocVar>,
}
