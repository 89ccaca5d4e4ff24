//! # Error Types — Validation Reports and Failures
//!
//! Two very different things go wrong during validation:
//!
//! - The **document** violates a keyword. That is a normal outcome, recorded
//!   as an [`ErrorRecord`] and collected into an [`ErrorList`]. Sibling
//!   keywords keep running so one pass reports as much as possible.
//! - The **schema** or configuration is broken (dangling `$ref`, malformed
//!   keyword, ref cycle). That is a [`ValidateError`] and aborts the call.
//!
//! Under `CheckMode::EXCEPTIONS` the first committed record is also raised,
//! as `ValidateError::Validation` (or `SchemaInvalid` for records produced by
//! schema self-validation).

use std::fmt;

use conform_core::{JsonPointer, ResolutionError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// What was being validated when a record was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorContext {
    /// The caller's document failed the schema.
    Document,
    /// The schema failed its own meta-schema.
    Schema,
}

/// The keyword that failed and its parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constraint {
    /// Keyword name, e.g. `minItems`.
    pub name: String,
    /// Keyword-specific parameters, e.g. `{"min": 2}`.
    pub params: Map<String, Value>,
}

/// A single keyword violation with its exact location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorRecord {
    /// JSON Pointer to the violating value, e.g. `/prop4/0/prop4-child`.
    pub pointer: String,
    /// Dotted property path, e.g. `prop4[0].prop4-child`.
    pub property_path: String,
    /// Human-readable description.
    pub message: String,
    /// Failed keyword and its parameters.
    pub constraint: Constraint,
    /// Document or schema validation.
    pub context: ErrorContext,
}

impl ErrorRecord {
    /// Build a record located at `path`.
    pub fn new(
        path: &JsonPointer,
        name: impl Into<String>,
        message: impl Into<String>,
        params: Map<String, Value>,
        context: ErrorContext,
    ) -> Self {
        Self {
            pointer: path.to_fragment(),
            property_path: path.property_path(),
            message: message.into(),
            constraint: Constraint {
                name: name.into(),
                params,
            },
            context,
        }
    }

    /// Name of the failed keyword.
    pub fn constraint_name(&self) -> &str {
        &self.constraint.name
    }
}

impl fmt::Display for ErrorRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.pointer.is_empty() {
            write!(f, "  (root): {}", self.message)
        } else {
            write!(f, "  {}: {}", self.pointer, self.message)
        }
    }
}

/// Ordered collection of error records from one validation call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ErrorList {
    records: Vec<ErrorRecord>,
}

impl ErrorList {
    /// Wrap an ordered list of records.
    pub fn new(records: Vec<ErrorRecord>) -> Self {
        Self { records }
    }

    /// Returns the number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if there are no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns a slice of all records.
    pub fn records(&self) -> &[ErrorRecord] {
        &self.records
    }

    /// Number of records produced in `context`.
    pub fn count(&self, context: ErrorContext) -> usize {
        self.records.iter().filter(|r| r.context == context).count()
    }

    /// Iterate over the records.
    pub fn iter(&self) -> std::slice::Iter<'_, ErrorRecord> {
        self.records.iter()
    }

    /// Consumes self and returns the inner Vec.
    pub fn into_inner(self) -> Vec<ErrorRecord> {
        self.records
    }
}

impl<'a> IntoIterator for &'a ErrorList {
    type Item = &'a ErrorRecord;
    type IntoIter = std::slice::Iter<'a, ErrorRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

impl fmt::Display for ErrorList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, record) in self.records.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{record}")?;
        }
        Ok(())
    }
}

/// The schema, a keyword, or the validator configuration is unusable.
#[derive(Error, Debug)]
pub enum ConfigurationError {
    /// Keyword names must be non-empty and free of whitespace.
    #[error("invalid keyword name '{0}' (empty or whitespace-containing names are not allowed)")]
    InvalidKeywordName(String),

    /// A capability is already registered under this keyword.
    #[error("keyword '{0}' is already registered")]
    DuplicateKeyword(String),

    /// No capability is registered under this keyword.
    #[error("keyword '{0}' is not registered")]
    UnknownKeyword(String),

    /// A keyword value has the wrong shape, e.g. `"minItems": "two"`.
    #[error("malformed keyword '{keyword}' at '{pointer}': {reason}")]
    MalformedKeyword {
        /// Keyword name.
        keyword: String,
        /// Pointer of the instance being validated when the keyword was read.
        pointer: String,
        /// What was wrong with the value.
        reason: String,
    },

    /// A schema node is neither a boolean nor an object.
    #[error("malformed schema at '{pointer}': {reason}")]
    MalformedSchema {
        /// Pointer of the instance being validated.
        pointer: String,
        /// What was wrong with the node.
        reason: String,
    },

    /// A `pattern` or `patternProperties` key is not a valid regex.
    #[error("invalid regex pattern '{pattern}': {reason}")]
    InvalidPattern {
        /// The pattern source.
        pattern: String,
        /// Compiler error.
        reason: String,
    },

    /// A validator configuration document could not be parsed.
    #[error("invalid validator configuration: {0}")]
    Config(String),
}

/// A validation call could not complete.
#[derive(Error, Debug)]
pub enum ValidateError {
    /// First document error under `CheckMode::EXCEPTIONS`.
    #[error("validation failed at '{}': {}", .0.pointer, .0.message)]
    Validation(Box<ErrorRecord>),

    /// First meta-schema error under `EXCEPTIONS | VALIDATE_SCHEMA`.
    #[error("schema does not match its meta-schema at '{}': {}", .0.pointer, .0.message)]
    SchemaInvalid(Box<ErrorRecord>),

    /// A `$ref` or schema document could not be resolved.
    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    /// Malformed schema keyword, registry misuse, or bad configuration.
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// `$ref` hops exceeded the limit without the document position advancing.
    #[error("$ref chain through '{reference}' exceeded {limit} hops without advancing the document")]
    RefCycle {
        /// The reference being followed when the limit was hit.
        reference: String,
        /// The configured limit.
        limit: usize,
    },

    /// The document is nested deeper than the configured limit.
    #[error("document nesting at '{pointer}' exceeds the limit of {limit} levels")]
    DepthExceeded {
        /// Position of the first value past the limit.
        pointer: String,
        /// The configured limit.
        limit: usize,
    },
}

impl ValidateError {
    /// The raised record, for `Validation` and `SchemaInvalid`.
    pub fn record(&self) -> Option<&ErrorRecord> {
        match self {
            ValidateError::Validation(record) | ValidateError::SchemaInvalid(record) => {
                Some(record)
            }
            _ => None,
        }
    }
}
