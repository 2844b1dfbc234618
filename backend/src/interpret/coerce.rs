use serde_json::{Map, Value};
use std::borrow::Cow;

/// Accepts an object as is, or a string holding a JSON object. Anything else
/// reads as an empty mapping.
pub(super) fn as_mapping(raw: &Value) -> Cow<'_, Map<String, Value>> {
    match raw {
        Value::Object(map) => Cow::Borrowed(map),
        Value::String(text) => match serde_json::from_str::<Value>(text) {
            Ok(Value::Object(map)) => Cow::Owned(map),
            _ => Cow::Owned(Map::new()),
        },
        _ => Cow::Owned(Map::new()),
    }
}

/// Value of the first key present in `map`, in `keys` order.
///
/// Presence is what counts: an empty string or `0` still wins over a later key.
pub(super) fn first_present<'a>(map: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|key| map.get(*key))
}

pub(super) fn as_sequence(value: Option<&Value>) -> &[Value] {
    match value {
        Some(Value::Array(items)) => items.as_slice(),
        Some(Value::Null) | None => &[],
        Some(other) => std::slice::from_ref(other),
    }
}

pub(super) fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// Renders a label element as text. Null and booleans use the `None`/`True`/`False`
/// spelling of the upstream service; arrays and objects fall back to compact JSON.
pub(super) fn to_label(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "None".to_string(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        other => other.to_string(),
    }
}

pub(super) fn to_confidence(value: &Value) -> f64 {
    if let Some(number) = to_number(value) {
        return number;
    }
    match value {
        Value::Object(fields) => fields.values().find_map(to_number).unwrap_or(0.0),
        _ => 0.0,
    }
}

fn to_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }?;
    number.is_finite().then_some(number)
}
