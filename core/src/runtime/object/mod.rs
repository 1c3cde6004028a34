mod closure;
mod proto;
mod string;
mod table;
mod thread;
mod userdata;

pub use closure::{CClosure, LuaClosure};
pub use proto::{LocVar, Proto, UpvalDesc};
pub use string::{LuaString, MAX_SHORT_LEN};
pub use table::{Node, Table};
pub use thread::Thread;
pub use userdata::Userdata;

use std::fmt;

use serde::Serialize;

const BASE_STRING: u8 = 4;
const BASE_TABLE: u8 = 5;
const BASE_FUNCTION: u8 = 6;
const BASE_USERDATA: u8 = 7;
const BASE_THREAD: u8 = 8;
const BASE_PROTO: u8 = 9;

const BASE_MASK: u8 = 0x0F;

const fn variant(base: u8, v: u8) -> u8 {
    base | (v << 4)
}

/// Every kind of collectable object the runtime allocates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    ShortString,
    LongString,
    Userdata,
    LuaClosure,
    CClosure,
    Table,
    Thread,
    Proto,
}

impl ObjectKind {
    pub const ALL: [ObjectKind; 8] = [
        ObjectKind::ShortString,
        ObjectKind::LongString,
        ObjectKind::Userdata,
        ObjectKind::LuaClosure,
        ObjectKind::CClosure,
        ObjectKind::Table,
        ObjectKind::Thread,
        ObjectKind::Proto,
    ];

    pub const fn tag(self) -> u8 {
        match self {
            ObjectKind::ShortString => variant(BASE_STRING, 0),
            ObjectKind::LongString => variant(BASE_STRING, 1),
            ObjectKind::Userdata => BASE_USERDATA,
            ObjectKind::LuaClosure => variant(BASE_FUNCTION, 0),
            ObjectKind::CClosure => variant(BASE_FUNCTION, 2),
            ObjectKind::Table => BASE_TABLE,
            ObjectKind::Thread => BASE_THREAD,
            ObjectKind::Proto => BASE_PROTO,
        }
    }

    pub fn from_tag(tag: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.tag() == tag)
    }

    /// Type name of the base type, ignoring variant bits.
    pub const fn type_name(self) -> &'static str {
        base_type_name(self.tag())
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

pub const fn base_type_name(tag: u8) -> &'static str {
    match tag & BASE_MASK {
        BASE_STRING => "string",
        BASE_TABLE => "table",
        BASE_FUNCTION => "function",
        BASE_USERDATA => "userdata",
        BASE_THREAD => "thread",
        BASE_PROTO => "proto",
        _ => "unknown",
    }
}

#[derive(Debug, Clone)]
pub enum ObjectBody {
    ShortString(LuaString),
    LongString(LuaString),
    Userdata(Userdata),
    LuaClosure(LuaClosure),
    CClosure(CClosure),
    Table(Table),
    Thread(Thread),
    Proto(Proto),
}

impl ObjectBody {
    pub fn kind(&self) -> ObjectKind {
        match self {
            ObjectBody::ShortString(_) => ObjectKind::ShortString,
            ObjectBody::LongString(_) => ObjectKind::LongString,
            ObjectBody::Userdata(_) => ObjectKind::Userdata,
            ObjectBody::LuaClosure(_) => ObjectKind::LuaClosure,
            ObjectBody::CClosure(_) => ObjectKind::CClosure,
            ObjectBody::Table(_) => ObjectKind::Table,
            ObjectBody::Thread(_) => ObjectKind::Thread,
            ObjectBody::Proto(_) => ObjectKind::Proto,
        }
    }
}
