//! # Value Kinds and Structural Equality
//!
//! JSON Schema reasons about the *kind* of a value (`"string"`, `"integer"`,
//! …) and about equality of arbitrary JSON trees (`enum`, `const`,
//! `uniqueItems`). Both are defined here once, for every crate.
//!
//! ## Equality Rules
//!
//! - Numbers compare mathematically: `1`, `1.0` and `1e0` are equal.
//!   Integer pairs compare exactly (no float round-trip).
//! - Object key order is irrelevant; key sets must match.
//! - Array order is significant.
//! - Values of different kinds are never equal (`1` ≠ `"1"`, `0` ≠ `false`).

use std::fmt;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

/// Runtime kind of a JSON value, using JSON Schema type names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    /// `null`.
    Null,
    /// `true` or `false`.
    Boolean,
    /// A number whose fractional part is zero.
    Integer,
    /// Any other number.
    Number,
    /// A string.
    String,
    /// An array.
    Array,
    /// An object.
    Object,
}

impl Kind {
    /// Kind of `value`. Numbers with a zero fractional part are `Integer`.
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => Kind::Null,
            Value::Bool(_) => Kind::Boolean,
            Value::Number(n) if is_integral(n) => Kind::Integer,
            Value::Number(_) => Kind::Number,
            Value::String(_) => Kind::String,
            Value::Array(_) => Kind::Array,
            Value::Object(_) => Kind::Object,
        }
    }

    /// Parse a JSON Schema type name. `"any"` is not a kind and yields `None`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "null" => Some(Kind::Null),
            "boolean" => Some(Kind::Boolean),
            "integer" => Some(Kind::Integer),
            "number" => Some(Kind::Number),
            "string" => Some(Kind::String),
            "array" => Some(Kind::Array),
            "object" => Some(Kind::Object),
            _ => None,
        }
    }

    /// JSON Schema type name.
    pub fn name(self) -> &'static str {
        match self {
            Kind::Null => "null",
            Kind::Boolean => "boolean",
            Kind::Integer => "integer",
            Kind::Number => "number",
            Kind::String => "string",
            Kind::Array => "array",
            Kind::Object => "object",
        }
    }

    /// Name with an indefinite article, as used in messages ("an integer").
    pub fn with_article(self) -> &'static str {
        match self {
            Kind::Null => "a null",
            Kind::Boolean => "a boolean",
            Kind::Integer => "an integer",
            Kind::Number => "a number",
            Kind::String => "a string",
            Kind::Array => "an array",
            Kind::Object => "an object",
        }
    }

    /// Whether a value of kind `self` satisfies the type name `expected`.
    /// Every integer is also a number.
    pub fn satisfies(self, expected: Kind) -> bool {
        self == expected || (self == Kind::Integer && expected == Kind::Number)
    }

    /// The single-bit set containing this kind.
    pub fn as_set(self) -> KindSet {
        match self {
            Kind::Null => KindSet::NULL,
            Kind::Boolean => KindSet::BOOLEAN,
            Kind::Integer => KindSet::INTEGER,
            Kind::Number => KindSet::NUMBER,
            Kind::String => KindSet::STRING,
            Kind::Array => KindSet::ARRAY,
            Kind::Object => KindSet::OBJECT,
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

bitflags! {
    /// A set of kinds, used to gate keywords by the runtime kind of a value.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct KindSet: u8 {
        /// `null`.
        const NULL = 1 << 0;
        /// Booleans.
        const BOOLEAN = 1 << 1;
        /// Integral numbers.
        const INTEGER = 1 << 2;
        /// Non-integral numbers.
        const NUMBER = 1 << 3;
        /// Strings.
        const STRING = 1 << 4;
        /// Arrays.
        const ARRAY = 1 << 5;
        /// Objects.
        const OBJECT = 1 << 6;

        /// Integers and non-integral numbers.
        const NUMERIC = Self::INTEGER.bits() | Self::NUMBER.bits();
        /// Every kind.
        const ANY = Self::NULL.bits()
            | Self::BOOLEAN.bits()
            | Self::NUMERIC.bits()
            | Self::STRING.bits()
            | Self::ARRAY.bits()
            | Self::OBJECT.bits();
    }
}

impl KindSet {
    /// Whether `kind` is a member of this set.
    pub fn admits(self, kind: Kind) -> bool {
        self.contains(kind.as_set())
    }
}

/// Whether a JSON number has a zero fractional part.
pub fn is_integral(n: &Number) -> bool {
    if n.is_i64() || n.is_u64() {
        return true;
    }
    n.as_f64().is_some_and(|f| f.is_finite() && f.fract() == 0.0)
}

/// Mathematical equality of two JSON numbers.
pub fn numbers_equal(a: &Number, b: &Number) -> bool {
    match (as_i128(a), as_i128(b)) {
        (Some(x), Some(y)) => x == y,
        _ => match (a.as_f64(), b.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => false,
        },
    }
}

fn as_i128(n: &Number) -> Option<i128> {
    n.as_i64()
        .map(i128::from)
        .or_else(|| n.as_u64().map(i128::from))
}

/// Deep structural equality following JSON Schema rules.
///
/// ```
/// use conform_core::value::json_equal;
/// use serde_json::json;
///
/// assert!(json_equal(&json!(1), &json!(1.0)));
/// assert!(json_equal(&json!({"a": 1, "b": 2}), &json!({"b": 2, "a": 1})));
/// assert!(!json_equal(&json!([1, 2]), &json!([2, 1])));
/// assert!(!json_equal(&json!(1), &json!("1")));
/// ```
pub fn json_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Number(x), Value::Number(y)) => numbers_equal(x, y),
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(l, r)| json_equal(l, r))
        }
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x
                    .iter()
                    .all(|(k, v)| y.get(k).is_some_and(|other| json_equal(v, other)))
        }
        _ => false,
    }
}
