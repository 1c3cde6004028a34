use crate::runtime::{GcRef, Heap, ObjectKind, Value};

/// Result of classifying a value slot or an object reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Class {
    NotCollectable,
    Collectable { object: GcRef, kind: ObjectKind },
    /// The header tag is outside the known set or disagrees with the body.
    Unrecognized { object: GcRef, tag: u8 },
    Dangling { object: GcRef },
}

/// Tag-level collectability test: does this slot point into the heap?
pub fn is_collectable(value: &Value) -> bool {
    matches!(value, Value::Object(_))
}

pub fn classify(heap: &Heap, value: &Value) -> Class {
    match value {
        Value::Object(gc) => classify_object(heap, *gc),
        _ => Class::NotCollectable,
    }
}

pub fn classify_object(heap: &Heap, object: GcRef) -> Class {
    let Some(boxed) = heap.get(object) else {
        return Class::Dangling { object };
    };
    match ObjectKind::from_tag(boxed.tag()) {
        Some(kind) if kind == boxed.body().kind() => Class::Collectable { object, kind },
        _ => Class::Unrecognized {
            object,
            tag: boxed.tag(),
        },
    }
}
