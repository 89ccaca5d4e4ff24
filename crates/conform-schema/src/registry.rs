//! # Constraint Registry
//!
//! Maps keyword names to [`Keyword`] capabilities. The evaluator knows no
//! keyword by name: it walks the registry in registration order and runs
//! every capability whose keyword is present in the schema node, whose draft
//! matches, and whose [`KindSet`] admits the value's current kind.
//!
//! Custom keywords register alongside the built-ins without touching the
//! engine:
//!
//! ```ignore
//! validator.register_keyword("even", Even)?;
//! ```
//!
//! ## Ordering
//!
//! Order is semantic: `type` runs first so that a coerced value is seen by
//! every later keyword in its new kind.

use std::fmt;

use conform_core::{JsonPointer, KindSet};
use serde_json::Value;

use crate::draft::Draft;
use crate::error::{ConfigurationError, ValidateError};
use crate::evaluator::Evaluator;
use crate::keywords;
use crate::schema::KeywordMap;

/// A keyword capability.
pub trait Keyword: Send + Sync {
    /// Kinds of value this keyword applies to.
    fn kinds(&self) -> KindSet {
        KindSet::ANY
    }

    /// Whether the keyword exists in `draft`.
    fn supports(&self, _draft: Draft) -> bool {
        true
    }

    /// Check `value` against the keyword's value in `schema`.
    ///
    /// Violations are reported through [`Evaluator::error`]; the returned
    /// error is reserved for failures that abort the whole call.
    fn check(
        &self,
        eval: &mut Evaluator<'_>,
        value: &mut Value,
        schema: &KeywordMap<'_>,
        path: &JsonPointer,
    ) -> Result<(), ValidateError>;
}

/// Ordered keyword-name → capability table.
pub struct ConstraintRegistry {
    entries: Vec<(String, Box<dyn Keyword>)>,
}

impl fmt::Debug for ConstraintRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

impl Default for ConstraintRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl ConstraintRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// A registry holding every built-in keyword in evaluation order.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for (name, keyword) in keywords::builtins() {
            registry.entries.push((name.to_string(), keyword));
        }
        registry
    }

    /// Append a capability under `name`.
    ///
    /// # Errors
    ///
    /// `InvalidKeywordName` for empty or whitespace-containing names;
    /// `DuplicateKeyword` if `name` is taken.
    pub fn register(&mut self, name: &str, keyword: Box<dyn Keyword>) -> Result<(), ConfigurationError> {
        if name.is_empty() || name.chars().any(char::is_whitespace) {
            return Err(ConfigurationError::InvalidKeywordName(name.to_string()));
        }
        if self.contains(name) {
            return Err(ConfigurationError::DuplicateKeyword(name.to_string()));
        }
        self.entries.push((name.to_string(), keyword));
        Ok(())
    }

    /// Swap the capability registered under `name`, keeping its position.
    ///
    /// # Errors
    ///
    /// `UnknownKeyword` if nothing is registered under `name`.
    pub fn replace(&mut self, name: &str, keyword: Box<dyn Keyword>) -> Result<Box<dyn Keyword>, ConfigurationError> {
        let slot = self
            .entries
            .iter_mut()
            .find(|(n, _)| n == name)
            .ok_or_else(|| ConfigurationError::UnknownKeyword(name.to_string()))?;
        Ok(std::mem::replace(&mut slot.1, keyword))
    }

    /// Remove and return the capability registered under `name`.
    pub fn remove(&mut self, name: &str) -> Option<Box<dyn Keyword>> {
        let index = self.entries.iter().position(|(n, _)| n == name)?;
        Some(self.entries.remove(index).1)
    }

    /// Capability registered under `name`.
    pub fn get(&self, name: &str) -> Option<&dyn Keyword> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, k)| k.as_ref())
    }

    /// Whether `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    /// Registered names in evaluation order.
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|(n, _)| n.as_str()).collect()
    }

    /// Number of registered keywords.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in evaluation order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &dyn Keyword)> {
        self.entries.iter().map(|(n, k)| (n.as_str(), k.as_ref()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Noop;

    impl Keyword for Noop {
        fn check(
            &self,
            _eval: &mut Evaluator<'_>,
            _value: &mut Value,
            _schema: &KeywordMap<'_>,
            _path: &JsonPointer,
        ) -> Result<(), ValidateError> {
            Ok(())
        }
    }

    #[test]
    fn builtins_start_with_type() {
        let registry = ConstraintRegistry::with_builtins();
        assert_eq!(registry.names().first(), Some(&"type"));
        assert!(registry.contains("oneOf"));
        assert!(registry.contains("divisibleBy"));
        assert!(!registry.contains("then"));
    }

    #[test]
    fn register_rejects_bad_names_and_duplicates() {
        let mut registry = ConstraintRegistry::with_builtins();
        assert!(matches!(
            registry.register("", Box::new(Noop)),
            Err(ConfigurationError::InvalidKeywordName(_))
        ));
        assert!(matches!(
            registry.register("my keyword", Box::new(Noop)),
            Err(ConfigurationError::InvalidKeywordName(_))
        ));
        assert!(matches!(
            registry.register("minItems", Box::new(Noop)),
            Err(ConfigurationError::DuplicateKeyword(_))
        ));
        registry.register("x-even", Box::new(Noop)).unwrap();
        assert_eq!(registry.names().last(), Some(&"x-even"));
    }

    #[test]
    fn replace_keeps_position_and_requires_existing_name() {
        let mut registry = ConstraintRegistry::with_builtins();
        let before = registry.names().iter().position(|n| *n == "pattern");
        registry.replace("pattern", Box::new(Noop)).unwrap();
        assert_eq!(registry.names().iter().position(|n| *n == "pattern"), before);
        assert!(matches!(
            registry.replace("nope", Box::new(Noop)),
            Err(ConfigurationError::UnknownKeyword(_))
        ));
    }

    #[test]
    fn remove_drops_entry() {
        let mut registry = ConstraintRegistry::with_builtins();
        let len = registry.len();
        assert!(registry.remove("format").is_some());
        assert!(registry.remove("format").is_none());
        assert_eq!(registry.len(), len - 1);
        assert!(registry.get("format").is_none());
    }
}
