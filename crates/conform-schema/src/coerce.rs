//! # Lossless Type Coercion
//!
//! Under `CheckMode::COERCE_TYPES` a value that fails `type` is converted in
//! place when a lossless conversion to one of the expected kinds exists.
//!
//! | From | To |
//! |---|---|
//! | numeric string | number, integer (if integral) |
//! | integral float | integer |
//! | `"true"` / `"false"`, `1` / `0` | boolean |
//! | number, boolean | string |
//! | single-element array | the element, if it converts |
//! | scalar | one-element array |
//!
//! `null` is never produced and never converted.

use conform_core::Kind;
use serde_json::{Number, Value};

/// Convert `value` to `target`, or `None` if no lossless conversion exists.
///
/// A value already of kind `target` is not converted.
pub fn coerce_to(value: &Value, target: Kind) -> Option<Value> {
    if Kind::of(value).satisfies(target) && !(target == Kind::Integer && value.is_f64()) {
        return None;
    }
    match (value, target) {
        (Value::Array(items), Kind::Boolean | Kind::Integer | Kind::Number | Kind::String)
            if items.len() == 1 =>
        {
            let item = &items[0];
            if Kind::of(item).satisfies(target) {
                normalize_integer(item, target).or_else(|| Some(item.clone()))
            } else {
                coerce_scalar(item, target)
            }
        }
        (Value::Bool(_) | Value::Number(_) | Value::String(_), Kind::Array) => {
            Some(Value::Array(vec![value.clone()]))
        }
        _ => coerce_scalar(value, target),
    }
}

fn coerce_scalar(value: &Value, target: Kind) -> Option<Value> {
    match (value, target) {
        (Value::String(s), Kind::Number) => parse_number(s).map(Value::Number),
        (Value::String(s), Kind::Integer) => parse_number(s)
            .filter(|n| conform_core::value::is_integral(n))
            .and_then(|n| integer_number(&n))
            .map(Value::Number),
        (Value::Number(n), Kind::Integer) => integer_number(n).map(Value::Number),
        (Value::String(s), Kind::Boolean) => match s.as_str() {
            "true" => Some(Value::Bool(true)),
            "false" => Some(Value::Bool(false)),
            _ => None,
        },
        (Value::Number(n), Kind::Boolean) => match n.as_f64() {
            Some(f) if f == 1.0 => Some(Value::Bool(true)),
            Some(f) if f == 0.0 => Some(Value::Bool(false)),
            _ => None,
        },
        (Value::Number(n), Kind::String) => Some(Value::String(n.to_string())),
        (Value::Bool(b), Kind::String) => Some(Value::String(b.to_string())),
        _ => None,
    }
}

/// An integral float re-encoded as an integer number.
fn normalize_integer(value: &Value, target: Kind) -> Option<Value> {
    match (value, target) {
        (Value::Number(n), Kind::Integer) if n.is_f64() => integer_number(n).map(Value::Number),
        _ => None,
    }
}

fn integer_number(n: &Number) -> Option<Number> {
    if n.is_i64() || n.is_u64() {
        return Some(n.clone());
    }
    let f = n.as_f64()?;
    if !f.is_finite() || f.fract() != 0.0 {
        return None;
    }
    if f >= i64::MIN as f64 && f < i64::MAX as f64 {
        Some(Number::from(f as i64))
    } else if f >= 0.0 && f < u64::MAX as f64 {
        Some(Number::from(f as u64))
    } else {
        None
    }
}

/// Parse a JSON-style numeric string. Surrounding whitespace is rejected.
fn parse_number(s: &str) -> Option<Number> {
    if s.is_empty() || s.trim() != s {
        return None;
    }
    if let Ok(i) = s.parse::<i64>() {
        return Some(Number::from(i));
    }
    if let Ok(u) = s.parse::<u64>() {
        return Some(Number::from(u));
    }
    let f = s.parse::<f64>().ok().filter(|f| f.is_finite())?;
    // Reject forms like "inf" or "1e5x" that Rust accepts but JSON does not.
    if !s.bytes().all(|b| b.is_ascii_digit() || matches!(b, b'-' | b'+' | b'.' | b'e' | b'E')) {
        return None;
    }
    Number::from_f64(f)
}
