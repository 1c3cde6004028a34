use heapscope::report::{Report, Summary, render_lines};
use heapscope::runtime::{ObjectKind, Runtime, Value};
use heapscope::{GcRef, inspect};

#[test]
fn fresh_runtime_renders_roots_first() {
    let rt = Runtime::new();
    let graph = inspect(&rt).expect("trace");

    assert_eq!(
        render_lines(&graph),
        vec![
            "roots -> 0x1000 : thread { mainthread }",
            "roots -> 0x1020 : table { registry }",
            "0x1020 -> 0x1000 : thread { arr[1] }",
            "0x1020 -> 0x1010 : table { arr[2] }",
        ]
    );
}

#[test]
fn strings_render_with_base_type_name() {
    let mut rt = Runtime::new();
    let s = rt.new_string("hello");
    rt.set_global("greeting", Value::Object(s))
        .expect("set greeting");
    let graph = inspect(&rt).expect("trace");

    let globals = rt.globals().expect("globals");
    let line = format!("{globals} -> {s} : string {{ tb_val[\"greeting\"] }}");
    assert!(render_lines(&graph).contains(&line), "{line}");
}

#[test]
fn summary_counts_objects_edges_and_garbage() {
    let mut rt = Runtime::new();
    let kept = rt.new_table();
    rt.new_table();
    let globals = rt.globals().expect("globals");
    rt.table_set(globals, Value::Integer(1), Value::Object(kept))
        .expect("globals[1]");

    let graph = inspect(&rt).expect("trace");
    let summary = Summary::new(&graph, rt.heap());

    assert_eq!(summary.objects, 4);
    assert_eq!(summary.edges, 5);
    assert_eq!(summary.unreached, 1);
    assert_eq!(summary.by_kind.get(&ObjectKind::Table), Some(&3));
    assert_eq!(summary.by_kind.get(&ObjectKind::Thread), Some(&1));
}

#[test]
fn report_serializes_to_json() {
    let rt = Runtime::new();
    let graph = inspect(&rt).expect("trace");
    let json = Report::new(&graph, rt.heap()).to_json().expect("json");

    let parsed: serde_json::Value = serde_json::from_str(&json).expect("valid json");
    assert_eq!(parsed["summary"]["objects"], 3);
    assert_eq!(parsed["summary"]["edges"], 4);
    assert_eq!(parsed["summary"]["unreached"], 0);
    assert_eq!(parsed["summary"]["by_kind"]["table"], 2);
    assert_eq!(parsed["edges"][0]["parent"], "roots");
    assert_eq!(parsed["edges"][0]["child"], GcRef::from_address(0x1000).to_string());
    assert_eq!(parsed["edges"][0]["kind"], "thread");
    assert_eq!(parsed["edges"][0]["label"], "mainthread");
}

#[test]
fn retention_path_follows_shortest_chain() {
    let mut rt = Runtime::new();
    let a = rt.new_table();
    let b = rt.new_table();
    rt.table_set_field(a, "next", Value::Object(b)).expect("a.next");
    rt.set_global("a", Value::Object(a)).expect("set a");
    let orphan = rt.new_table();

    let graph = inspect(&rt).expect("trace");
    let labels: Vec<&str> = graph
        .retention_path(b)
        .expect("b is reachable")
        .into_iter()
        .map(|edge| edge.label)
        .collect();
    assert_eq!(
        labels,
        vec!["registry", "arr[2]", "tb_val[\"a\"]", "tb_val[\"next\"]"]
    );
    assert!(graph.retention_path(orphan).is_none());
}
