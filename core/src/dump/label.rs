use crate::runtime::object::base_type_name;
use crate::runtime::{GcRef, Heap, Value};

const SHOW_HALF: usize = 25;

/// Placeholder used when a closure upvalue has no declared name.
pub const NO_NAME: &str = "(*no name)";

/// Key under which a table may carry its display name.
pub const NAME_KEY: &str = "__name";

pub fn string_contents(heap: &Heap, gc: GcRef) -> Option<&str> {
    heap.string(gc).map(|s| s.as_str())
}

pub fn value_string<'h>(heap: &'h Heap, value: &Value) -> Option<&'h str> {
    value.as_object().and_then(|gc| string_contents(heap, gc))
}

/// Renders a value for an edge label: strings quoted, numbers and booleans
/// literally, everything else as `<type>_<address>`.
pub fn render_value(heap: &Heap, value: &Value) -> String {
    match value {
        Value::Nil => "nil".to_string(),
        Value::Boolean(b) => b.to_string(),
        Value::Integer(i) => i.to_string(),
        Value::Float(n) => format_float(*n),
        Value::LightUserdata(addr) => format!("userdata_{addr:#x}"),
        Value::LightFunction(addr) => format!("function_{addr:#x}"),
        Value::Object(gc) => {
            if let Some(s) = string_contents(heap, *gc) {
                return format!("\"{s}\"");
            }
            match heap.get(*gc) {
                Some(boxed) => format!("{}_{gc}", base_type_name(boxed.tag())),
                None => format!("unknown_{gc}"),
            }
        }
    }
}

/// Shortest round-trip rendering, switching to `1e+20` style exponents for
/// magnitudes of at least 1e16 or below 1e-4.
fn format_float(n: f64) -> String {
    if n.is_nan() {
        return "nan".to_string();
    }
    let magnitude = n.abs();
    if !n.is_finite() || magnitude == 0.0 || (1e-4..1e16).contains(&magnitude) {
        return n.to_string();
    }
    let plain = format!("{n:e}");
    let Some((mantissa, exponent)) = plain.split_once('e') else {
        return plain;
    };
    let (sign, digits) = match exponent.strip_prefix('-') {
        Some(digits) => ('-', digits),
        None => ('+', exponent),
    };
    format!("{mantissa}e{sign}{digits:0>2}")
}

/// Flattens a chunk source name onto one short line. Newlines become three
/// spaces, then every double space is dropped; anything longer than 50
/// characters keeps its first and last 25 around `" ... "`.
pub fn shorten_source(source: &str) -> String {
    let flattened = source.replace('\n', "   ").replace("  ", "");
    let len = flattened.chars().count();
    if len <= SHOW_HALF * 2 {
        return flattened;
    }
    let head: String = flattened.chars().take(SHOW_HALF).collect();
    let tail: String = flattened.chars().skip(len - SHOW_HALF).collect();
    format!("{head} ... {tail}")
}
