//! Lenient accessors over untyped upstream JSON
//!
//! Upstream fields change type between endpoints and releases (a price may be a
//! number on one page and a string on the next), so parsers read through these
//! helpers instead of deriving `Deserialize`. Every accessor falls back to the
//! type default.

use serde_json::Value;

use crate::normalize::{parse_amount, parse_leading_number};

/// True when the value carries something usable (not null, not a blank string)
pub fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        _ => true,
    }
}

/// True when an upstream envelope reports success (`result == 1`)
pub fn is_success(envelope: &Value) -> bool {
    match envelope.get("result") {
        Some(Value::Number(n)) => n.as_f64() == Some(1.0),
        Some(Value::String(s)) => s.trim() == "1",
        _ => false,
    }
}

/// String form of a scalar; numbers are stringified, everything else is empty
pub fn text(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    }
}

/// Numeric form of a scalar; strings are read like `parseFloat`
pub fn number(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().filter(|n| n.is_finite()).unwrap_or(0.0),
        Value::String(s) => parse_leading_number(s).unwrap_or(0.0),
        _ => 0.0,
    }
}

/// Monetary form of a scalar; strings go through [`parse_amount`]
pub fn amount(value: &Value) -> f64 {
    match value {
        Value::Number(_) => number(value),
        Value::String(s) => parse_amount(s),
        _ => 0.0,
    }
}

/// Non-negative integer form of a scalar
pub fn count(value: &Value) -> u64 {
    let n = number(value);
    if n > 0.0 {
        n.trunc() as u64
    } else {
        0
    }
}

/// Look up the first key whose value is present
pub fn first_present<'a>(object: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| object.get(*key))
        .find(|value| is_present(value))
}

pub fn field_text(object: &Value, key: &str) -> String {
    object.get(key).map(text).unwrap_or_default()
}

pub fn field_number(object: &Value, key: &str) -> f64 {
    object.get(key).map(number).unwrap_or(0.0)
}

pub fn field_amount(object: &Value, key: &str) -> f64 {
    object.get(key).map(amount).unwrap_or(0.0)
}

pub fn field_count(object: &Value, key: &str) -> u64 {
    object.get(key).map(count).unwrap_or(0)
}

/// Text of the first present synonym
pub fn first_text(object: &Value, keys: &[&str]) -> String {
    first_present(object, keys).map(text).unwrap_or_default()
}

/// Number of the first present synonym
pub fn first_number(object: &Value, keys: &[&str]) -> f64 {
    first_present(object, keys).map(number).unwrap_or(0.0)
}

/// Amount of the first present synonym
pub fn first_amount(object: &Value, keys: &[&str]) -> f64 {
    first_present(object, keys).map(amount).unwrap_or(0.0)
}

/// Array under `key`, or an empty slice when it is missing or not an array
pub fn field_array<'a>(object: &'a Value, key: &str) -> &'a [Value] {
    object
        .get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}
