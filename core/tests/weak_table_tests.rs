use heapscope::dump::{NodeId, WeakMode, weak_mode};
use heapscope::inspect;
use heapscope::runtime::{GcRef, Runtime, TagMethod, Value};

/// Builds `t = setmetatable({}, {__mode = mode})` as a global and returns
/// `(t, metatable)`.
fn weak_table(rt: &mut Runtime, mode: Value) -> (GcRef, GcRef) {
    let t = rt.new_table();
    let mt = rt.new_table();
    rt.table_set_field(mt, "__mode", mode).expect("set __mode");
    rt.set_metatable(t, Some(mt)).expect("set metatable");
    rt.set_global("weak", Value::Object(t)).expect("set weak");
    (t, mt)
}

fn mode_string(rt: &mut Runtime, mode: &str) -> Value {
    Value::Object(rt.new_string(mode))
}

#[test]
fn weak_values_are_not_traversed() {
    let mut rt = Runtime::new();
    let mode = mode_string(&mut rt, "v");
    let (t, mt) = weak_table(&mut rt, mode);
    let v = rt.new_table();
    let element = rt.new_table();
    rt.table_set_field(t, "str", Value::Object(v)).expect("t.str");
    rt.table_set(t, Value::Integer(1), Value::Object(element))
        .expect("t[1]");

    let graph = inspect(&rt).expect("trace");

    assert!(graph.child(NodeId::Object(t), v).is_none());
    assert!(!graph.is_visited(v));
    assert!(!graph.is_visited(element));
    assert!(graph.unreached(rt.heap()).contains(&v));

    // Keys and the metatable are still strong.
    let key = rt.new_string("str");
    assert_eq!(
        graph.child(NodeId::Object(t), key).map(|c| c.label.as_str()),
        Some("tb_key:\"str\"")
    );
    assert!(graph.child(NodeId::Object(t), mt).is_some());
}

#[test]
fn weakly_held_value_reachable_elsewhere_is_still_traced() {
    let mut rt = Runtime::new();
    let mode = mode_string(&mut rt, "v");
    let (t, _) = weak_table(&mut rt, mode);
    let v = rt.new_table();
    rt.table_set_field(t, "str", Value::Object(v)).expect("t.str");
    rt.set_global("strong", Value::Object(v)).expect("set strong");

    let graph = inspect(&rt).expect("trace");
    assert!(graph.is_visited(v));
    assert!(graph.child(NodeId::Object(t), v).is_none());
}

#[test]
fn weak_keys_are_not_traversed() {
    let mut rt = Runtime::new();
    let mode = mode_string(&mut rt, "k");
    let (t, _) = weak_table(&mut rt, mode);
    let key = rt.new_table();
    let value = rt.new_table();
    let element = rt.new_table();
    rt.table_set(t, Value::Object(key), Value::Object(value))
        .expect("t[key]");
    rt.table_set(t, Value::Integer(1), Value::Object(element))
        .expect("t[1]");

    let graph = inspect(&rt).expect("trace");

    assert!(!graph.is_visited(key));
    assert_eq!(
        graph.child(NodeId::Object(t), value).map(|c| c.label.clone()),
        Some(format!("tb_val[table_{key}]"))
    );
    assert!(graph.is_visited(element));
}

#[test]
fn weak_keys_and_values() {
    let mut rt = Runtime::new();
    let mode = mode_string(&mut rt, "kv");
    let (t, mt) = weak_table(&mut rt, mode);
    let key = rt.new_table();
    let value = rt.new_table();
    rt.table_set(t, Value::Object(key), Value::Object(value))
        .expect("t[key]");

    let graph = inspect(&rt).expect("trace");
    assert!(!graph.is_visited(key));
    assert!(!graph.is_visited(value));
    let children: Vec<GcRef> = graph
        .children(NodeId::Object(t))
        .map(|edge| edge.child)
        .collect();
    assert_eq!(children, vec![mt]);
}

#[test]
fn non_string_mode_is_ignored() {
    let mut rt = Runtime::new();
    let (t, _) = weak_table(&mut rt, Value::Integer(1));
    let key = rt.new_table();
    let value = rt.new_table();
    rt.table_set(t, Value::Object(key), Value::Object(value))
        .expect("t[key]");

    let graph = inspect(&rt).expect("trace");
    assert!(graph.is_visited(key));
    assert!(graph.is_visited(value));
    assert_eq!(weak_mode(&rt, rt.heap().table(t).and_then(|t| t.metatable)), WeakMode::default());
}

#[test]
fn weak_mode_reads_flags() {
    let mut rt = Runtime::new();
    let mt = rt.new_table();
    let kv = mode_string(&mut rt, "kv");
    rt.table_set_field(mt, "__mode", kv).expect("set __mode");

    assert_eq!(
        weak_mode(&rt, Some(mt)),
        WeakMode {
            keys: true,
            values: true
        }
    );
    assert_eq!(weak_mode(&rt, None), WeakMode::default());
}

#[test]
fn failed_mode_lookup_is_cached_on_the_metatable() {
    let mut rt = Runtime::new();
    let t = rt.new_table();
    let mt = rt.new_table();
    rt.set_metatable(t, Some(mt)).expect("set metatable");
    rt.set_global("t", Value::Object(t)).expect("set t");

    let before = rt.heap().table(mt).expect("metatable").flags();
    assert_eq!(before & TagMethod::Mode.cache_bit(), 0);

    inspect(&rt).expect("trace");

    let after = rt.heap().table(mt).expect("metatable").flags();
    assert_ne!(after & TagMethod::Mode.cache_bit(), 0);

    // A later write clears the cache so a new __mode is seen.
    let v = mode_string(&mut rt, "v");
    rt.table_set_field(mt, "__mode", v).expect("set __mode");
    assert!(weak_mode(&rt, Some(mt)).values);
}
