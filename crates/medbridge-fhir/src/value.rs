//! The `{"value": <scalar>}` wrapper convention.
//!
//! Writers always wrap. Readers accept a bare scalar first and fall back to
//! the wrapped object, since producers in the system emit either shape.

use serde_json::{Value, json};

/// Wrap a scalar as `{"value": scalar}`.
pub fn wrap(value: impl Into<Value>) -> Value {
    json!({ "value": value.into() })
}

fn unwrap_scalar(field: &Value) -> &Value {
    match field {
        Value::Object(map) => map.get("value").unwrap_or(&Value::Null),
        other => other,
    }
}

/// String content of a bare or wrapped field.
pub fn string_value(field: Option<&Value>) -> Option<String> {
    match unwrap_scalar(field?) {
        Value::String(s) => Some(s.clone()),
        _ => None,
    }
}

/// Integer content of a bare or wrapped field. Numbers and numeric strings
/// are both accepted.
pub fn i64_value(field: Option<&Value>) -> Option<i64> {
    match unwrap_scalar(field?) {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Walk object keys and array indices, e.g. `path(v, &["name", "0", "family"])`.
pub fn path<'a>(value: &'a Value, segments: &[&str]) -> Option<&'a Value> {
    segments.iter().try_fold(value, |current, segment| match current {
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        Value::Object(map) => map.get(*segment),
        _ => None,
    })
}
