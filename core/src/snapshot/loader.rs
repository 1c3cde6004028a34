use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::errors::SnapshotError;
use crate::runtime::{
    CClosure, GcRef, Heap, LocVar, LuaClosure, LuaString, Node, ObjectBody, ObjectKind, Proto,
    Runtime, Table, Thread, UpVal, UpValId, UpvalDesc, Userdata, Value,
};

use super::format::{ObjectRecord, ObjectSpec, Snapshot, UpvalState};

pub fn load_file(path: impl AsRef<Path>) -> Result<Runtime, SnapshotError> {
    let path = path.as_ref();
    let json = fs::read_to_string(path).map_err(|source| SnapshotError::Io {
        path: path.display().to_string(),
        source,
    })?;
    load_str(&json)
}

pub fn load_str(json: &str) -> Result<Runtime, SnapshotError> {
    let snapshot: Snapshot = serde_json::from_str(json)?;
    build(snapshot)
}

/// Validates a snapshot and materializes it as a runtime heap. Addresses are
/// kept as object identities; explicit header tags are kept verbatim.
pub fn build(snapshot: Snapshot) -> Result<Runtime, SnapshotError> {
    let mut kinds: HashMap<GcRef, ObjectKind> = HashMap::new();
    for record in &snapshot.objects {
        if kinds.insert(record.address, record.body.kind()).is_some() {
            return Err(SnapshotError::DuplicateAddress {
                address: record.address,
            });
        }
    }
    let check = Checker { kinds: &kinds };

    let mut heap = Heap::new();
    let mut upvals: HashMap<u32, UpValId> = HashMap::new();
    for record in &snapshot.upvalues {
        let upval = match record.state {
            UpvalState::Open { thread, slot } => {
                check.thread(thread, || format!("upvalue {}", record.id))?;
                UpVal::Open { thread, slot }
            }
            UpvalState::Closed(value) => {
                check.value(&value, || format!("upvalue {}", record.id))?;
                UpVal::Closed(value)
            }
        };
        if upvals.insert(record.id, heap.alloc_upval(upval)).is_some() {
            return Err(SnapshotError::DuplicateUpvalue { id: record.id });
        }
    }

    for record in snapshot.objects {
        let address = record.address;
        let tag = record.tag.unwrap_or_else(|| record.body.kind().tag());
        let body = materialize(record, &check, &upvals)?;
        heap.alloc_at(address, tag, body);
    }

    check.thread(snapshot.main_thread, || "main_thread".to_string())?;
    check.value(&snapshot.registry, || "registry".to_string())?;
    if let Some(head) = snapshot.twups {
        check.thread(head, || "twups".to_string())?;
    }

    tracing::debug!(
        objects = heap.len(),
        upvalues = upvals.len(),
        "snapshot loaded"
    );
    Ok(Runtime::from_parts(
        heap,
        snapshot.main_thread,
        snapshot.registry,
        snapshot.twups,
    ))
}

impl ObjectSpec {
    pub fn kind(&self) -> ObjectKind {
        match self {
            ObjectSpec::ShortString { .. } => ObjectKind::ShortString,
            ObjectSpec::LongString { .. } => ObjectKind::LongString,
            ObjectSpec::Userdata { .. } => ObjectKind::Userdata,
            ObjectSpec::LuaClosure { .. } => ObjectKind::LuaClosure,
            ObjectSpec::CClosure { .. } => ObjectKind::CClosure,
            ObjectSpec::Table { .. } => ObjectKind::Table,
            ObjectSpec::Thread { .. } => ObjectKind::Thread,
            ObjectSpec::Proto { .. } => ObjectKind::Proto,
        }
    }
}

struct Checker<'a> {
    kinds: &'a HashMap<GcRef, ObjectKind>,
}

impl Checker<'_> {
    fn object(&self, object: GcRef, from: impl Fn() -> String) -> Result<ObjectKind, SnapshotError> {
        self.kinds
            .get(&object)
            .copied()
            .ok_or_else(|| SnapshotError::MissingObject {
                from: from(),
                missing: object,
            })
    }

    fn maybe(&self, object: Option<GcRef>, from: impl Fn() -> String) -> Result<(), SnapshotError> {
        if let Some(object) = object {
            self.object(object, from)?;
        }
        Ok(())
    }

    fn value(&self, value: &Value, from: impl Fn() -> String) -> Result<(), SnapshotError> {
        self.maybe(value.as_object(), from)
    }

    fn thread(&self, object: GcRef, what: impl Fn() -> String) -> Result<(), SnapshotError> {
        match self.object(object, &what)? {
            ObjectKind::Thread => Ok(()),
            found => Err(SnapshotError::NotAThread {
                what: what(),
                object,
                found,
            }),
        }
    }
}

fn upval_id(
    upvals: &HashMap<u32, UpValId>,
    id: u32,
    from: GcRef,
) -> Result<UpValId, SnapshotError> {
    upvals
        .get(&id)
        .copied()
        .ok_or_else(|| SnapshotError::MissingUpvalue {
            from: format!("object {from}"),
            id,
        })
}

fn materialize(
    record: ObjectRecord,
    check: &Checker<'_>,
    upvals: &HashMap<u32, UpValId>,
) -> Result<ObjectBody, SnapshotError> {
    let address = record.address;
    let from = || format!("object {address}");

    let body = match record.body {
        ObjectSpec::ShortString { value } => ObjectBody::ShortString(LuaString::new(value)),
        ObjectSpec::LongString { value } => ObjectBody::LongString(LuaString::new(value)),
        ObjectSpec::Userdata {
            size,
            metatable,
            user_value,
        } => {
            check.maybe(metatable, from)?;
            check.value(&user_value, from)?;
            ObjectBody::Userdata(Userdata {
                size,
                metatable,
                user_value,
            })
        }
        ObjectSpec::LuaClosure { proto, upvalues } => {
            check.maybe(proto, from)?;
            let upvalues = upvalues
                .into_iter()
                .map(|slot| slot.map(|id| upval_id(upvals, id, address)).transpose())
                .collect::<Result<Vec<_>, _>>()?;
            ObjectBody::LuaClosure(LuaClosure { proto, upvalues })
        }
        ObjectSpec::CClosure { function, upvalues } => {
            for upvalue in &upvalues {
                check.value(upvalue, from)?;
            }
            ObjectBody::CClosure(CClosure { function, upvalues })
        }
        ObjectSpec::Table {
            array,
            hash,
            metatable,
        } => {
            check.maybe(metatable, from)?;
            for value in &array {
                check.value(value, from)?;
            }
            for (key, value) in &hash {
                check.value(key, from)?;
                check.value(value, from)?;
            }
            let mut table = Table::new();
            table.array = array;
            table.hash = hash
                .into_iter()
                .map(|(key, value)| Node { key, value })
                .collect();
            table.metatable = metatable;
            ObjectBody::Table(table)
        }
        ObjectSpec::Thread {
            stack,
            top,
            open_upvalues,
            twups,
        } => {
            for slot in &stack {
                check.value(slot, from)?;
            }
            let top = top.unwrap_or(stack.len());
            if top > stack.len() {
                return Err(SnapshotError::TopOutOfRange {
                    thread: address,
                    top,
                    len: stack.len(),
                });
            }
            if let Some(next) = twups {
                check.thread(next, from)?;
            }
            let open_upvalues = open_upvalues
                .into_iter()
                .map(|id| upval_id(upvals, id, address))
                .collect::<Result<Vec<_>, _>>()?;
            ObjectBody::Thread(Thread {
                stack,
                top,
                open_upvalues,
                twups: Some(twups.unwrap_or(address)),
            })
        }
        ObjectSpec::Proto {
            source,
            constants,
            upvalue_names,
            protos,
            local_names,
        } => {
            check.maybe(source, from)?;
            for constant in &constants {
                check.value(constant, from)?;
            }
            for name in upvalue_names.iter().chain(local_names.iter()) {
                check.maybe(*name, from)?;
            }
            for nested in &protos {
                check.object(*nested, from)?;
            }
            ObjectBody::Proto(Proto {
                source,
                constants,
                upvalues: upvalue_names
                    .into_iter()
                    .map(|name| UpvalDesc { name })
                    .collect(),
                protos,
                locvars: local_names.into_iter().map(|name| LocVar { name }).collect(),
            })
        }
    };
    Ok(body)
}
