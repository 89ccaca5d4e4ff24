//! # Format Checking and Pattern Compilation
//!
//! String formats (`email`, `date-time`, …) are delegated to a caller-supplied
//! [`FormatChecker`]; the default [`AnyFormat`] accepts every string. Regular
//! expressions from `pattern` and `patternProperties` are compiled once per
//! validator through [`RegexCache`].
//!
//! Schema patterns are ECMA-262 regexes. Most compile with the linear-time
//! `regex` engine; patterns it rejects (look-around, backreferences) are
//! compiled with `fancy-regex`, which backtracks.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::error::ConfigurationError;

/// Predicate for the `format` keyword.
pub trait FormatChecker: Send + Sync {
    /// Whether `value` conforms to `format`. Unknown formats should pass.
    fn check(&self, value: &str, format: &str) -> bool;
}

impl<F> FormatChecker for F
where
    F: Fn(&str, &str) -> bool + Send + Sync,
{
    fn check(&self, value: &str, format: &str) -> bool {
        self(value, format)
    }
}

/// Accepts every string for every format.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnyFormat;

impl FormatChecker for AnyFormat {
    fn check(&self, _value: &str, _format: &str) -> bool {
        true
    }
}

/// A compiled schema pattern.
#[derive(Debug, Clone)]
pub enum CompiledPattern {
    /// Compiled by the `regex` crate.
    Linear(regex::Regex),
    /// Needs look-around or backreferences; compiled by `fancy-regex`.
    Backtracking(fancy_regex::Regex),
}

impl CompiledPattern {
    /// Compile `pattern`, trying the linear engine first.
    ///
    /// # Errors
    ///
    /// `ConfigurationError::InvalidPattern` if neither engine accepts it.
    pub fn new(pattern: &str) -> Result<Self, ConfigurationError> {
        match regex::Regex::new(pattern) {
            Ok(regex) => Ok(Self::Linear(regex)),
            Err(_) => fancy_regex::Regex::new(pattern)
                .map(Self::Backtracking)
                .map_err(|e| ConfigurationError::InvalidPattern {
                    pattern: pattern.to_string(),
                    reason: e.to_string(),
                }),
        }
    }

    /// The pattern source.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Linear(regex) => regex.as_str(),
            Self::Backtracking(regex) => regex.as_str(),
        }
    }

    /// Unanchored search for the pattern in `text`.
    ///
    /// # Errors
    ///
    /// `ConfigurationError::InvalidPattern` when a backtracking match gives
    /// up, for example on hitting its backtrack limit.
    pub fn is_match(&self, text: &str) -> Result<bool, ConfigurationError> {
        match self {
            Self::Linear(regex) => Ok(regex.is_match(text)),
            Self::Backtracking(regex) => {
                regex
                    .is_match(text)
                    .map_err(|e| ConfigurationError::InvalidPattern {
                        pattern: regex.as_str().to_string(),
                        reason: e.to_string(),
                    })
            }
        }
    }
}

/// Compiled patterns keyed by pattern source.
#[derive(Debug, Default)]
pub struct RegexCache {
    compiled: RwLock<HashMap<String, CompiledPattern>>,
}

impl RegexCache {
    /// An empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Compiled form of `pattern`, compiling it on first use.
    ///
    /// # Errors
    ///
    /// `ConfigurationError::InvalidPattern` if `pattern` does not compile.
    pub fn get(&self, pattern: &str) -> Result<CompiledPattern, ConfigurationError> {
        if let Some(regex) = self.compiled.read().get(pattern) {
            return Ok(regex.clone());
        }
        let regex = CompiledPattern::new(pattern)?;
        self.compiled
            .write()
            .insert(pattern.to_string(), regex.clone());
        Ok(regex)
    }

    /// Number of compiled patterns.
    pub fn len(&self) -> usize {
        self.compiled.read().len()
    }

    /// Whether nothing has been compiled yet.
    pub fn is_empty(&self) -> bool {
        self.compiled.read().is_empty()
    }
}
