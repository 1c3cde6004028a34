use heapscope::dump::{HeapGraph, NodeId};
use heapscope::inspect;
use heapscope::runtime::{GcRef, LocVar, Proto, Runtime, UpvalDesc, Value};

fn label(graph: &HeapGraph, parent: GcRef, child: GcRef) -> Option<String> {
    graph
        .child(NodeId::Object(parent), child)
        .map(|info| info.label.clone())
}

/// Registers `proto` behind a closure stored in a global.
fn publish(rt: &mut Runtime, proto: GcRef) -> GcRef {
    let closure = rt.new_lua_closure(Some(proto), Vec::new()).expect("closure");
    rt.set_global("f", Value::Object(closure)).expect("set f");
    closure
}

#[test]
fn proto_children_in_order() {
    let mut rt = Runtime::new();
    let source = rt.new_string("@scripts/init.lua");
    let literal = rt.new_string("hello");
    let uv_name = rt.new_string("env");
    let loc_name = rt.new_string("count");
    let nested = rt.new_proto(Proto::default());
    let proto = rt.new_proto(Proto {
        source: Some(source),
        constants: vec![Value::Integer(1), Value::Object(literal)],
        upvalues: vec![UpvalDesc { name: Some(uv_name) }, UpvalDesc { name: None }],
        protos: vec![nested],
        locvars: vec![LocVar { name: Some(loc_name) }, LocVar { name: None }],
    });
    let closure = publish(&mut rt, proto);

    let graph = inspect(&rt).expect("trace");

    assert_eq!(
        label(&graph, closure, proto).as_deref(),
        Some("luaclosure_proto")
    );
    assert_eq!(
        label(&graph, proto, source).as_deref(),
        Some("proto_source:\"@scripts/init.lua\"")
    );
    assert_eq!(
        label(&graph, proto, literal).as_deref(),
        Some("proto_literal[1]")
    );
    assert_eq!(
        label(&graph, proto, uv_name).as_deref(),
        Some("proto_uvname[0]:\"env\"")
    );
    assert_eq!(
        label(&graph, proto, nested).as_deref(),
        Some("nested_proto[0]")
    );
    assert_eq!(
        label(&graph, proto, loc_name).as_deref(),
        Some("proto_locname[0]:\"count\"")
    );
    assert_eq!(graph.children(NodeId::Object(proto)).count(), 5);
}

#[test]
fn long_source_label_is_shortened() {
    let mut rt = Runtime::new();
    let chunk = "local t = {}\nfor i = 1, 10 do\n  t[i] = i * i\nend\nreturn t\n";
    let source = rt.new_string(chunk);
    let proto = rt.new_proto(Proto {
        source: Some(source),
        ..Proto::default()
    });
    publish(&mut rt, proto);

    let graph = inspect(&rt).expect("trace");
    let expected = "proto_source:\"local t = {} for i = 1, 1 ... [i] = i * i end return t \"";
    assert_eq!(label(&graph, proto, source).as_deref(), Some(expected));
}

#[test]
fn shared_proto_is_expanded_once() {
    let mut rt = Runtime::new();
    let source = rt.new_string("=shared");
    let proto = rt.new_proto(Proto {
        source: Some(source),
        ..Proto::default()
    });
    let first = rt.new_lua_closure(Some(proto), Vec::new()).expect("first");
    let second = rt.new_lua_closure(Some(proto), Vec::new()).expect("second");
    rt.set_global("a", Value::Object(first)).expect("set a");
    rt.set_global("b", Value::Object(second)).expect("set b");

    let graph = inspect(&rt).expect("trace");
    assert_eq!(graph.parents_of(proto).len(), 2);
    assert_eq!(graph.parents_of(source).len(), 1);
}

#[test]
fn lua_closure_rejects_non_proto() {
    let mut rt = Runtime::new();
    let t = rt.new_table();
    assert!(rt.new_lua_closure(Some(t), Vec::new()).is_err());
}
