//! # Validator — Public Entry Point
//!
//! A [`Validator`] owns a [`SchemaStore`], a [`ConstraintRegistry`], a
//! [`FormatChecker`] and a regex cache. Each call to
//! [`Validator::validate`] registers the schema, optionally checks it
//! against its draft's meta-schema, and evaluates the document. The records
//! of the most recent call stay available through [`Validator::errors`].
//!
//! ## Schema Identity
//!
//! A schema is stored under its `$id` (drafts 6 and 7) or `id` (drafts 3
//! and 4). A schema without one is stored under
//! `internal://provided-schema/`, and relative `$ref` values inside it
//! resolve against that base.
//!
//! ## Example
//!
//! ```
//! use conform_schema::{CheckMode, Validator};
//! use serde_json::json;
//!
//! let mut validator = Validator::default();
//! let mut doc = json!({"value": []});
//! let schema = json!({"properties": {"value": {"type": "array", "minItems": 1}}});
//! let errors = validator.validate(&mut doc, &schema, CheckMode::NORMAL).unwrap();
//! assert_eq!(errors.records()[0].pointer, "/value");
//! ```

use std::fmt;
use std::sync::Arc;

use conform_core::{JsonPointer, UriResolver};
use serde_json::{json, Value};
use tracing::debug;

use crate::config::ValidatorConfig;
use crate::draft::Draft;
use crate::error::{ConfigurationError, ErrorContext, ErrorList, ValidateError};
use crate::evaluator::{Environment, Evaluator};
use crate::format::{AnyFormat, FormatChecker, RegexCache};
use crate::mode::CheckMode;
use crate::registry::{ConstraintRegistry, Keyword};
use crate::retriever::{NoRetriever, SchemaRetriever};
use crate::store::SchemaStore;

/// Store id for schemas that carry no `$id`/`id`.
pub const PROVIDED_SCHEMA_ID: &str = "internal://provided-schema/";

/// Validates JSON documents against JSON Schema drafts 3, 4, 6 and 7.
pub struct Validator {
    config: ValidatorConfig,
    store: SchemaStore,
    registry: ConstraintRegistry,
    formats: Box<dyn FormatChecker>,
    regexes: RegexCache,
    last: ErrorList,
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Validator")
            .field("config", &self.config)
            .field("store", &self.store)
            .field("registry", &self.registry)
            .field("errors", &self.last.len())
            .finish()
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(ValidatorConfig::default())
    }
}

impl Validator {
    /// A validator with the built-in keywords, no retriever and a format
    /// checker that accepts everything.
    pub fn new(config: ValidatorConfig) -> Self {
        let store = SchemaStore::new(Arc::new(NoRetriever)).with_max_ref_chain(config.max_ref_chain);
        Self {
            config,
            store,
            registry: ConstraintRegistry::with_builtins(),
            formats: Box::new(AnyFormat),
            regexes: RegexCache::new(),
            last: ErrorList::default(),
        }
    }

    /// Replace the store with an empty one that fetches through `retriever`.
    pub fn with_retriever(mut self, retriever: Arc<dyn SchemaRetriever>) -> Self {
        self.store = SchemaStore::new(retriever).with_max_ref_chain(self.config.max_ref_chain);
        self
    }

    /// Use `checker` for the `format` keyword.
    pub fn with_format_checker(mut self, checker: impl FormatChecker + 'static) -> Self {
        self.formats = Box::new(checker);
        self
    }

    /// Register a custom keyword, evaluated after the built-ins.
    pub fn register_keyword(
        &mut self,
        name: &str,
        keyword: impl Keyword + 'static,
    ) -> Result<(), ConfigurationError> {
        self.registry.register(name, Box::new(keyword))
    }

    /// The schema store, shared by every call.
    pub fn store(&self) -> &SchemaStore {
        &self.store
    }

    /// The keyword registry.
    pub fn registry(&self) -> &ConstraintRegistry {
        &self.registry
    }

    /// Mutable registry, for replacing or removing keywords.
    pub fn registry_mut(&mut self) -> &mut ConstraintRegistry {
        &mut self.registry
    }

    /// Settings this validator was built with.
    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    /// Validate `document` against `schema` under `mode`.
    ///
    /// Outside `EXCEPTIONS` mode an invalid document is not an error: the
    /// returned list holds every violation, in evaluation order.
    ///
    /// # Errors
    ///
    /// - [`ValidateError::Validation`] / [`ValidateError::SchemaInvalid`]:
    ///   the first violation under `EXCEPTIONS`.
    /// - [`ValidateError::Resolution`]: a `$ref` or document could not be
    ///   resolved.
    /// - [`ValidateError::Configuration`]: a malformed keyword or regex.
    /// - [`ValidateError::RefCycle`]: `$ref` hops without progress.
    /// - [`ValidateError::DepthExceeded`]: the document is nested deeper
    ///   than `max_depth`.
    pub fn validate(
        &mut self,
        document: &mut Value,
        schema: &Value,
        mode: CheckMode,
    ) -> Result<ErrorList, ValidateError> {
        let draft = Draft::detect(schema).unwrap_or(self.config.default_draft);
        let id = schema_id(schema, draft);
        let stored = self.store.add_schema(&id, Some(schema.clone()))?;
        self.run(document, &stored, &stored, draft, mode)
    }

    /// Validate `document` against the schema stored (or retrievable) at
    /// `uri`. A fragment selects a subschema.
    ///
    /// # Errors
    ///
    /// As for [`Validator::validate`].
    pub fn validate_uri(
        &mut self,
        document: &mut Value,
        uri: &str,
        mode: CheckMode,
    ) -> Result<ErrorList, ValidateError> {
        let absolute = UriResolver::resolve(uri, "")?;
        let stored = self.store.get_schema(&absolute)?;
        let draft = Draft::detect(&stored).unwrap_or(self.config.default_draft);
        let entry = json!({ "$ref": absolute });
        self.run(document, &entry, &stored, draft, mode)
    }

    /// Validate under the configured `default_mode` without touching
    /// `document`.
    ///
    /// # Errors
    ///
    /// As for [`Validator::validate`], plus [`ConfigurationError::Config`]
    /// for an unknown mode name.
    pub fn check(&mut self, document: &Value, schema: &Value) -> Result<ErrorList, ValidateError> {
        let mode = self.config.mode()?;
        let mut copy = document.clone();
        self.validate(&mut copy, schema, mode)
    }

    /// Validate with `TYPE_CAST | COERCE_TYPES`, converting `document` in
    /// place where possible.
    ///
    /// # Errors
    ///
    /// As for [`Validator::validate`].
    pub fn coerce(&mut self, document: &mut Value, schema: &Value) -> Result<ErrorList, ValidateError> {
        self.validate(document, schema, CheckMode::TYPE_CAST | CheckMode::COERCE_TYPES)
    }

    /// Whether the most recent call found no errors.
    pub fn is_valid(&self) -> bool {
        self.last.is_empty()
    }

    /// Errors of the most recent call in `context`.
    pub fn num_errors(&self, context: ErrorContext) -> usize {
        self.last.count(context)
    }

    /// Errors of the most recent call, both contexts.
    pub fn error_count(&self) -> usize {
        self.last.len()
    }

    /// Records of the most recent call.
    pub fn errors(&self) -> &ErrorList {
        &self.last
    }

    fn run(
        &mut self,
        document: &mut Value,
        entry: &Value,
        schema_document: &Value,
        draft: Draft,
        mode: CheckMode,
    ) -> Result<ErrorList, ValidateError> {
        self.last = ErrorList::default();
        let policy = self.config.ref_siblings.unwrap_or_else(|| draft.ref_policy());
        debug!(draft = ?draft, mode = ?mode, policy = ?policy, "validation started");

        let env = Environment {
            store: &self.store,
            registry: &self.registry,
            formats: self.formats.as_ref(),
            regexes: &self.regexes,
        };

        let mut records = Vec::new();
        if mode.contains(CheckMode::VALIDATE_SCHEMA) {
            records.extend(
                self_validate(env, schema_document, draft, mode, self.config.max_depth)?.into_inner(),
            );
        }

        let mut eval = Evaluator::new(env, mode, draft)
            .with_ref_policy(policy)
            .with_max_depth(self.config.max_depth);
        eval.check(document, entry, &JsonPointer::root())?;
        records.extend(eval.finish().into_inner());

        let errors = ErrorList::new(records);
        debug!(
            errors = errors.len(),
            schema_errors = errors.count(ErrorContext::Schema),
            "validation finished"
        );
        self.last = errors.clone();
        Ok(errors)
    }
}

/// Check `schema` against the meta-schema of `draft`.
fn self_validate(
    env: Environment<'_>,
    schema: &Value,
    draft: Draft,
    mode: CheckMode,
    max_depth: usize,
) -> Result<ErrorList, ValidateError> {
    let meta = env.store.get_schema(draft.uri())?;
    let mut instance = schema.clone();
    let mut eval = Evaluator::new(env, mode.for_self_validation(), draft)
        .with_ref_policy(draft.ref_policy())
        .with_context(ErrorContext::Schema)
        .with_max_depth(max_depth);
    eval.check(&mut instance, &meta, &JsonPointer::root())?;
    let errors = eval.finish();
    debug!(draft = ?draft, errors = errors.len(), "schema checked against meta-schema");
    Ok(errors)
}

/// The id a schema declares for itself, or [`PROVIDED_SCHEMA_ID`].
fn schema_id(schema: &Value, draft: Draft) -> String {
    [draft.id_keyword(), "$id", "id"]
        .into_iter()
        .find_map(|keyword| schema.get(keyword).and_then(Value::as_str))
        .filter(|id| !id.trim_start_matches('#').is_empty())
        .unwrap_or(PROVIDED_SCHEMA_ID)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retriever::InMemoryRetriever;

    #[test]
    fn schema_id_prefers_draft_keyword() {
        let schema = json!({"id": "http://a/old.json", "$id": "http://a/new.json"});
        assert_eq!(schema_id(&schema, Draft::Draft4), "http://a/old.json");
        assert_eq!(schema_id(&schema, Draft::Draft7), "http://a/new.json");
        assert_eq!(schema_id(&json!({}), Draft::Draft7), PROVIDED_SCHEMA_ID);
        assert_eq!(schema_id(&json!({"$id": "#"}), Draft::Draft7), PROVIDED_SCHEMA_ID);
    }

    #[test]
    fn last_call_state_is_exposed() {
        let mut v = Validator::default();
        v.validate(&mut json!("x"), &json!({"type": "integer"}), CheckMode::NORMAL)
            .unwrap();
        assert!(!v.is_valid());
        assert_eq!(v.error_count(), 1);
        assert_eq!(v.num_errors(ErrorContext::Document), 1);
        assert_eq!(v.num_errors(ErrorContext::Schema), 0);

        v.validate(&mut json!(1), &json!({"type": "integer"}), CheckMode::NORMAL)
            .unwrap();
        assert!(v.is_valid());
        assert!(v.errors().is_empty());
    }

    #[test]
    fn check_does_not_mutate_the_document() {
        let config = ValidatorConfig {
            default_mode: vec!["coerce_types".to_string()],
            ..ValidatorConfig::default()
        };
        let mut v = Validator::new(config);
        let doc = json!({"n": "5"});
        let errors = v
            .check(&doc, &json!({"properties": {"n": {"type": "integer"}}}))
            .unwrap();
        assert!(errors.is_empty());
        assert_eq!(doc, json!({"n": "5"}));
    }

    #[test]
    fn coerce_applies_type_cast_and_conversion() {
        let mut v = Validator::default();
        let mut doc = json!({"list": {}, "n": "2.5"});
        let schema = json!({"properties": {"list": {"type": "array"}, "n": {"type": "number"}}});
        assert!(v.coerce(&mut doc, &schema).unwrap().is_empty());
        assert_eq!(doc, json!({"list": [], "n": 2.5}));
    }

    #[test]
    fn validate_uri_uses_the_store() {
        let retriever = InMemoryRetriever::new().with(
            "http://example.com/root.json",
            json!({"definitions": {"positive": {"minimum": 1}}, "type": "object"}),
        );
        let mut v = Validator::default().with_retriever(Arc::new(retriever));
        let errors = v
            .validate_uri(&mut json!(0), "http://example.com/root.json#/definitions/positive", CheckMode::NORMAL)
            .unwrap();
        assert_eq!(errors.records()[0].constraint_name(), "minimum");
        let errors = v
            .validate_uri(&mut json!([]), "http://example.com/root.json", CheckMode::NORMAL)
            .unwrap();
        assert_eq!(errors.records()[0].constraint_name(), "type");
    }

    #[test]
    fn schema_errors_come_first_and_carry_schema_context() {
        let mut v = Validator::default();
        let schema = json!({"type": "object", "title": 5});
        let errors = v
            .validate(&mut json!([]), &schema, CheckMode::VALIDATE_SCHEMA)
            .unwrap();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors.records()[0].context, ErrorContext::Schema);
        assert_eq!(errors.records()[0].pointer, "/title");
        assert_eq!(errors.records()[1].context, ErrorContext::Document);
        assert_eq!(v.num_errors(ErrorContext::Schema), 1);
    }
}
