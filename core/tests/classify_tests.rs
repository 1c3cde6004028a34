use heapscope::dump::{Class, classify, classify_object, is_collectable};
use heapscope::errors::TraceError;
use heapscope::inspect;
use heapscope::runtime::{GcRef, ObjectKind, Runtime, Value};
use heapscope::snapshot::load_str;

#[test]
fn primitives_are_not_collectable() {
    let rt = Runtime::new();
    let primitives = [
        Value::Nil,
        Value::Boolean(false),
        Value::Integer(42),
        Value::Float(0.5),
        Value::LightUserdata(0x1234),
        Value::LightFunction(0x5678),
    ];
    for value in primitives {
        assert!(!is_collectable(&value), "{value:?}");
        assert_eq!(classify(rt.heap(), &value), Class::NotCollectable);
    }
}

#[test]
fn heap_objects_report_their_kind() {
    let mut rt = Runtime::new();
    let short = rt.new_string("short");
    let long = rt.new_string(&"x".repeat(64));
    let table = rt.new_table();
    let thread = rt.new_thread();
    let native = rt.new_c_closure(1, Vec::new());

    let cases = [
        (short, ObjectKind::ShortString),
        (long, ObjectKind::LongString),
        (table, ObjectKind::Table),
        (thread, ObjectKind::Thread),
        (native, ObjectKind::CClosure),
    ];
    for (object, kind) in cases {
        assert_eq!(
            classify(rt.heap(), &Value::Object(object)),
            Class::Collectable { object, kind }
        );
    }
}

#[test]
fn kind_type_names_follow_the_base_tag() {
    assert_eq!(ObjectKind::ShortString.type_name(), "string");
    assert_eq!(ObjectKind::LongString.type_name(), "string");
    assert_eq!(ObjectKind::LuaClosure.type_name(), "function");
    assert_eq!(ObjectKind::CClosure.type_name(), "function");
    assert_eq!(ObjectKind::Proto.type_name(), "proto");
    assert_eq!(ObjectKind::LongString.tag(), 20);
    assert_eq!(ObjectKind::CClosure.tag(), 38);
    assert_eq!(ObjectKind::from_tag(0x0b), None);
}

#[test]
fn missing_object_is_dangling() {
    let rt = Runtime::new();
    let bogus = GcRef::from_address(0xdead0);
    assert_eq!(
        classify_object(rt.heap(), bogus),
        Class::Dangling { object: bogus }
    );
}

#[test]
fn dangling_stack_slot_aborts_the_trace() {
    let mut rt = Runtime::new();
    let bogus = GcRef::from_address(0xdead0);
    let main = rt.main_thread();
    rt.push(main, Value::Object(bogus)).expect("push");

    let err = inspect(&rt).expect_err("dangling reference");
    assert!(matches!(
        err,
        TraceError::DanglingReference { object } if object == bogus
    ));
}

const UNKNOWN_TAG: &str = r#"{
    "main_thread": 4096,
    "registry": {"object": 4112},
    "objects": [
        {"address": 4096, "kind": "thread"},
        {"address": 4112, "kind": "table", "array": [{"object": 4128}]},
        {"address": 4128, "kind": "table", "tag": 11}
    ]
}"#;

#[test]
fn unknown_tag_is_fatal() {
    let rt = load_str(UNKNOWN_TAG).expect("load");
    let object = GcRef::from_address(4128);
    assert_eq!(
        classify_object(rt.heap(), object),
        Class::Unrecognized { object, tag: 11 }
    );

    let err = inspect(&rt).expect_err("unknown tag");
    assert!(matches!(
        err,
        TraceError::UnknownObjectKind { tag: 11, .. }
    ));
}

#[test]
fn tag_disagreeing_with_body_is_fatal() {
    let json = UNKNOWN_TAG.replace(r#""tag": 11"#, r#""tag": 4"#);
    let rt = load_str(&json).expect("load");

    let err = inspect(&rt).expect_err("inconsistent tag");
    assert!(matches!(err, TraceError::UnknownObjectKind { tag: 4, .. }));
}

#[test]
fn explicit_matching_tag_is_accepted() {
    let json = UNKNOWN_TAG.replace(r#""tag": 11"#, r#""tag": 5"#);
    let rt = load_str(&json).expect("load");

    let graph = inspect(&rt).expect("trace");
    assert!(graph.is_visited(GcRef::from_address(4128)));
}
