//! # Typed Schema View
//!
//! Schemas are stored as plain `serde_json::Value` trees; keywords read them
//! through [`SchemaNode`] and [`KeywordMap`] instead of probing the tree ad
//! hoc. A node is either a boolean schema or a keyword map.
//!
//! ## Absence Is Not an Error
//!
//! Every typed accessor distinguishes three outcomes:
//!
//! - `Ok(None)`: the keyword is absent,
//! - `Ok(Some(v))`: present with the expected shape,
//! - `Err(MalformedKeyword)`: present with the wrong shape.
//!
//! A keyword present as `null` is visible through [`KeywordMap::get`] and is
//! malformed for every typed accessor.
//!
//! Accessor errors carry an empty pointer; the evaluator fills in the
//! instance location when the error leaves the keyword.

use serde_json::{Map, Number, Value};

use crate::error::ConfigurationError;

/// A schema node: boolean schema or keyword map.
#[derive(Debug, Clone, Copy)]
pub enum SchemaNode<'a> {
    /// `true` accepts everything, `false` nothing.
    Bool(bool),
    /// An object of keywords.
    Keywords(KeywordMap<'a>),
}

impl<'a> SchemaNode<'a> {
    /// View `value` as a schema node.
    ///
    /// # Errors
    ///
    /// `ConfigurationError::MalformedSchema` if `value` is neither a boolean
    /// nor an object.
    pub fn from_value(value: &'a Value) -> Result<Self, ConfigurationError> {
        match value {
            Value::Bool(b) => Ok(SchemaNode::Bool(*b)),
            Value::Object(map) => Ok(SchemaNode::Keywords(KeywordMap::new(map))),
            other => Err(ConfigurationError::MalformedSchema {
                pointer: String::new(),
                reason: format!("expected a boolean or an object, found {}", kind_name(other)),
            }),
        }
    }
}

/// Typed, read-only access to the keywords of one schema object.
#[derive(Debug, Clone, Copy)]
pub struct KeywordMap<'a> {
    map: &'a Map<String, Value>,
}

impl<'a> KeywordMap<'a> {
    /// View over `map`.
    pub fn new(map: &'a Map<String, Value>) -> Self {
        Self { map }
    }

    /// The underlying object.
    pub fn as_map(&self) -> &'a Map<String, Value> {
        self.map
    }

    /// Raw keyword value. A present `null` is `Some(&Value::Null)`.
    pub fn get(&self, keyword: &str) -> Option<&'a Value> {
        self.map.get(keyword)
    }

    /// Whether `keyword` is present.
    pub fn contains(&self, keyword: &str) -> bool {
        self.map.contains_key(keyword)
    }

    /// `keyword` as a boolean.
    pub fn bool(&self, keyword: &str) -> Result<Option<bool>, ConfigurationError> {
        self.typed(keyword, "a boolean", Value::as_bool)
    }

    /// `keyword` as a string.
    pub fn str(&self, keyword: &str) -> Result<Option<&'a str>, ConfigurationError> {
        self.typed(keyword, "a string", Value::as_str)
    }

    /// `keyword` as a number.
    pub fn number(&self, keyword: &str) -> Result<Option<&'a Number>, ConfigurationError> {
        self.typed(keyword, "a number", |v| match v {
            Value::Number(n) => Some(n),
            _ => None,
        })
    }

    /// A non-negative integer. Integral floats such as `2.0` are accepted.
    pub fn count(&self, keyword: &str) -> Result<Option<u64>, ConfigurationError> {
        self.typed(keyword, "a non-negative integer", |v| {
            v.as_u64().or_else(|| {
                v.as_f64()
                    .filter(|f| *f >= 0.0 && f.fract() == 0.0 && *f <= u64::MAX as f64)
                    .map(|f| f as u64)
            })
        })
    }

    /// `keyword` as an object.
    pub fn object(&self, keyword: &str) -> Result<Option<&'a Map<String, Value>>, ConfigurationError> {
        self.typed(keyword, "an object", Value::as_object)
    }

    /// `keyword` as an array.
    pub fn array(&self, keyword: &str) -> Result<Option<&'a [Value]>, ConfigurationError> {
        self.typed(keyword, "an array", |v| v.as_array().map(Vec::as_slice))
    }

    /// A sub-schema: boolean or object.
    pub fn schema(&self, keyword: &str) -> Result<Option<&'a Value>, ConfigurationError> {
        self.typed(keyword, "a schema", |v| {
            matches!(v, Value::Bool(_) | Value::Object(_)).then_some(v)
        })
    }

    /// A non-empty list of sub-schemas.
    pub fn schema_list(&self, keyword: &str) -> Result<Option<&'a [Value]>, ConfigurationError> {
        let Some(list) = self.array(keyword)? else {
            return Ok(None);
        };
        if list.is_empty() {
            return Err(malformed(keyword, "expected a non-empty array of schemas"));
        }
        if list.iter().any(|v| !matches!(v, Value::Bool(_) | Value::Object(_))) {
            return Err(malformed(keyword, "every element must be a schema"));
        }
        Ok(Some(list))
    }

    /// A list of strings.
    pub fn string_list(&self, keyword: &str) -> Result<Option<Vec<&'a str>>, ConfigurationError> {
        let Some(list) = self.array(keyword)? else {
            return Ok(None);
        };
        list.iter()
            .map(|v| {
                v.as_str()
                    .ok_or_else(|| malformed(keyword, "every element must be a string"))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Some)
    }

    fn typed<T>(
        &self,
        keyword: &str,
        expected: &str,
        extract: impl FnOnce(&'a Value) -> Option<T>,
    ) -> Result<Option<T>, ConfigurationError> {
        match self.map.get(keyword) {
            None => Ok(None),
            Some(value) => extract(value).map(Some).ok_or_else(|| {
                malformed(
                    keyword,
                    format!("expected {expected}, found {}", kind_name(value)),
                )
            }),
        }
    }
}

/// Build a `MalformedKeyword` error with the pointer left for the caller.
pub fn malformed(keyword: &str, reason: impl Into<String>) -> ConfigurationError {
    ConfigurationError::MalformedKeyword {
        keyword: keyword.to_string(),
        pointer: String::new(),
        reason: reason.into(),
    }
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
