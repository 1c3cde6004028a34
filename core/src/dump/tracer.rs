use crate::errors::TraceError;
use crate::runtime::{
    GcRef, Heap, LuaClosure, ObjectBody, Proto, Runtime, Table, TagMethod, Value,
};

use super::classify::{Class, classify_object, is_collectable};
use super::graph::{HeapGraph, LabelPolicy, NodeId};
use super::label::{self, NAME_KEY, NO_NAME};

/// Weak flags of a table, derived from its metatable's `__mode` each time the
/// table is traversed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WeakMode {
    pub keys: bool,
    pub values: bool,
}

struct Task {
    parent: NodeId,
    object: GcRef,
    label: String,
}

/// Children discovered while expanding one object, in discovery order.
struct Discovered {
    parent: GcRef,
    tasks: Vec<Task>,
}

impl Discovered {
    fn new(parent: GcRef) -> Self {
        Self {
            parent,
            tasks: Vec::new(),
        }
    }

    fn object(&mut self, object: Option<GcRef>, label: impl FnOnce() -> String) {
        if let Some(object) = object {
            self.tasks.push(Task {
                parent: NodeId::Object(self.parent),
                object,
                label: label(),
            });
        }
    }

    fn value(&mut self, value: &Value, label: impl FnOnce() -> String) {
        if is_collectable(value) {
            self.object(value.as_object(), label);
        }
    }
}

/// Depth-first walker over the observed heap. Each object is expanded at
/// most once; the pending work-list replaces recursion.
pub struct GraphTracer<'rt> {
    runtime: &'rt Runtime,
    graph: HeapGraph,
    pending: Vec<Task>,
    record_revisits: bool,
    label_policy: LabelPolicy,
}

impl<'rt> GraphTracer<'rt> {
    pub fn new(runtime: &'rt Runtime) -> Self {
        Self {
            runtime,
            graph: HeapGraph::new(),
            pending: Vec::new(),
            record_revisits: true,
            label_policy: LabelPolicy::default(),
        }
    }

    pub fn with_record_revisits(mut self, record: bool) -> Self {
        self.record_revisits = record;
        self
    }

    pub fn with_label_policy(mut self, policy: LabelPolicy) -> Self {
        self.label_policy = policy;
        self
    }

    pub fn runtime(&self) -> &'rt Runtime {
        self.runtime
    }

    pub fn finish(self) -> HeapGraph {
        self.graph
    }

    /// Records `parent -> object` and expands everything newly reachable
    /// through it. An absent object is a no-op.
    pub fn trace(
        &mut self,
        parent: NodeId,
        object: Option<GcRef>,
        label: impl Into<String>,
    ) -> Result<(), TraceError> {
        let Some(object) = object else {
            return Ok(());
        };
        self.pending.push(Task {
            parent,
            object,
            label: label.into(),
        });

        while let Some(task) = self.pending.pop() {
            if let Err(err) = self.visit(task) {
                self.pending.clear();
                return Err(err);
            }
        }
        Ok(())
    }

    pub fn trace_value(
        &mut self,
        parent: NodeId,
        value: &Value,
        label: impl Into<String>,
    ) -> Result<(), TraceError> {
        if !is_collectable(value) {
            return Ok(());
        }
        self.trace(parent, value.as_object(), label)
    }

    fn visit(&mut self, task: Task) -> Result<(), TraceError> {
        let runtime = self.runtime;
        let heap = runtime.heap();
        let kind = match classify_object(heap, task.object) {
            Class::Collectable { kind, .. } => kind,
            Class::Unrecognized { object, tag } => {
                return Err(TraceError::UnknownObjectKind { object, tag });
            }
            Class::Dangling { object } => return Err(TraceError::DanglingReference { object }),
            Class::NotCollectable => return Ok(()),
        };

        if self.graph.is_visited(task.object) {
            if self.record_revisits {
                // A root keeps the label it was first seeded with.
                let policy = match task.parent {
                    NodeId::Roots => LabelPolicy::KeepFirst,
                    NodeId::Object(_) => self.label_policy,
                };
                self.graph
                    .record(task.parent, task.object, kind, task.label, policy);
            }
            return Ok(());
        }

        self.graph
            .record(task.parent, task.object, kind, task.label, self.label_policy);
        self.graph.mark_visited(task.object, kind);
        tracing::trace!(object = %task.object, %kind, "expanding");

        let body = heap
            .body(task.object)
            .ok_or(TraceError::DanglingReference {
                object: task.object,
            })?;
        let mut found = Discovered::new(task.object);
        discover(runtime, body, &mut found);
        self.pending.extend(found.tasks.into_iter().rev());
        Ok(())
    }
}

fn discover(runtime: &Runtime, body: &ObjectBody, out: &mut Discovered) {
    let heap = runtime.heap();
    match body {
        ObjectBody::ShortString(_) | ObjectBody::LongString(_) => {}
        ObjectBody::Userdata(u) => {
            out.object(u.metatable, || "metatable_u".to_string());
            out.value(&u.user_value, || "uservalue_u".to_string());
        }
        ObjectBody::LuaClosure(cl) => discover_lua_closure(heap, cl, out),
        ObjectBody::CClosure(cl) => {
            for (i, upvalue) in cl.upvalues.iter().enumerate() {
                out.value(upvalue, || format!("cclosure_upval[{i}]"));
            }
        }
        ObjectBody::Table(t) => discover_table(runtime, t, out),
        ObjectBody::Thread(th) => {
            for (i, slot) in th.live_slots().iter().enumerate() {
                out.value(slot, || format!("stack[{i}]"));
            }
        }
        ObjectBody::Proto(p) => discover_proto(heap, p, out),
    }
}

fn discover_lua_closure(heap: &Heap, cl: &LuaClosure, out: &mut Discovered) {
    let Some(proto_ref) = cl.proto else {
        return;
    };
    out.object(Some(proto_ref), || "luaclosure_proto".to_string());

    let proto = heap.proto(proto_ref);
    for (i, slot) in cl.upvalues.iter().enumerate() {
        let Some(id) = slot else {
            continue;
        };
        let value = heap.upval_value(*id);
        out.value(&value, || {
            let name = proto
                .and_then(|p| p.upvalues.get(i))
                .and_then(|desc| desc.name)
                .and_then(|name| label::string_contents(heap, name))
                .unwrap_or(NO_NAME);
            format!("luaclosure_upval[{i}:\"{name}\"]")
        });
    }
}

fn discover_table(runtime: &Runtime, table: &Table, out: &mut Discovered) {
    let heap = runtime.heap();
    out.object(table.metatable, || "metatable_t".to_string());

    let weak = weak_mode(runtime, table.metatable);
    for node in table.live_nodes() {
        if !weak.keys {
            out.value(&node.key, || match label::value_string(heap, &node.key) {
                Some(key) => format!("tb_key:\"{key}\""),
                None => "tb_key".to_string(),
            });
        }
        if !weak.values {
            out.value(&node.value, || {
                let key = label::render_value(heap, &node.key);
                if label::value_string(heap, &node.key) == Some(NAME_KEY) {
                    let name = label::value_string(heap, &node.value)
                        .map(str::to_string)
                        .unwrap_or_else(|| label::render_value(heap, &node.value));
                    format!("tb_val[{key}]:\"{name}\"")
                } else {
                    format!("tb_val[{key}]")
                }
            });
        }
    }

    if !weak.values {
        for (i, element) in table.array.iter().enumerate() {
            out.value(element, || format!("arr[{}]", i + 1));
        }
    }
}

fn discover_proto(heap: &Heap, proto: &Proto, out: &mut Discovered) {
    let name_of = |gc: GcRef| label::string_contents(heap, gc).unwrap_or_default();

    out.object(proto.source, || {
        let source = proto.source.map(name_of).unwrap_or_default();
        format!("proto_source:\"{}\"", label::shorten_source(source))
    });
    for (i, constant) in proto.constants.iter().enumerate() {
        out.value(constant, || format!("proto_literal[{i}]"));
    }
    for (i, desc) in proto.upvalues.iter().enumerate() {
        out.object(desc.name, || {
            format!("proto_uvname[{i}]:\"{}\"", desc.name.map(name_of).unwrap_or_default())
        });
    }
    for (i, nested) in proto.protos.iter().enumerate() {
        out.object(Some(*nested), || format!("nested_proto[{i}]"));
    }
    for (i, local) in proto.locvars.iter().enumerate() {
        out.object(local.name, || {
            format!("proto_locname[{i}]:\"{}\"", local.name.map(name_of).unwrap_or_default())
        });
    }
}

/// Weak flags from the metatable's `__mode`. A non-string mode sets neither
/// flag.
pub fn weak_mode(runtime: &Runtime, metatable: Option<GcRef>) -> WeakMode {
    let Some(mode) = runtime.fast_tag_method(metatable, TagMethod::Mode) else {
        return WeakMode::default();
    };
    match label::value_string(runtime.heap(), &mode) {
        Some(mode) => WeakMode {
            keys: mode.contains('k'),
            values: mode.contains('v'),
        },
        None => {
            tracing::debug!(?mode, "ignoring non-string __mode");
            WeakMode::default()
        }
    }
}
