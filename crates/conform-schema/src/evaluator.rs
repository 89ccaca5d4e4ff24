//! # Evaluator — Recursive Constraint Evaluation
//!
//! One `Evaluator` runs one top-level validation. It owns the [`ErrorBag`]
//! for the call and borrows everything else (store, registry, format checker,
//! regex cache) from the validator.
//!
//! ## Evaluation Order for One Schema Node
//!
//! 1. Boolean schemas: `true` passes, `false` records one error.
//! 2. `$ref`: the target is resolved through the store, composed with the
//!    node's siblings per the active [`RefSiblings`] policy, and the value is
//!    checked against the composed node only.
//! 3. Under `APPLY_DEFAULTS`, defaults are spliced into the value.
//! 4. Every registered keyword present in the node runs, in registry order,
//!    if the draft supports it and its kind set admits the value's kind. The
//!    kind is re-read before each keyword since `type` may coerce.
//!
//! ## Speculation
//!
//! Combinators try branches through [`Evaluator::speculate`]. When the mode
//! may mutate the document, a branch runs against a copy of the value; the
//! caller decides whether the copy replaces the original.
//!
//! ## Ref Cycle Guard
//!
//! Each `$ref` followed is pushed on a trail together with the document
//! position it was followed at. Following the same reference again at the
//! same position, or following more than `max_ref_chain` references at one
//! position, raises [`ValidateError::RefCycle`]. A recursive schema applied
//! to a deeper part of the document never trips the guard.
//!
//! ## Depth Limit
//!
//! Evaluation recurses once per document level. A value nested deeper than
//! `max_depth` levels raises [`ValidateError::DepthExceeded`] instead of
//! exhausting the stack.

use std::ops::Deref;
use std::sync::Arc;

use conform_core::{JsonPointer, Kind};
use serde_json::{Map, Value};

use crate::bag::{Checkpoint, ErrorBag};
use crate::defaults::splice_defaults;
use crate::draft::{Draft, RefSiblings};
use crate::error::{ConfigurationError, ErrorContext, ErrorList, ErrorRecord, ValidateError};
use crate::format::{CompiledPattern, FormatChecker, RegexCache};
use crate::mode::CheckMode;
use crate::registry::ConstraintRegistry;
use crate::schema::SchemaNode;
use crate::store::{compose, SchemaStore};

/// Default bound on document nesting during evaluation.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Shared collaborators of an evaluation.
#[derive(Clone, Copy)]
pub struct Environment<'a> {
    /// Documents and `$ref` resolution.
    pub store: &'a SchemaStore,
    /// Keywords, in evaluation order.
    pub registry: &'a ConstraintRegistry,
    /// Predicate for `format`.
    pub formats: &'a dyn FormatChecker,
    /// Compiled `pattern` and `patternProperties` regexes.
    pub regexes: &'a RegexCache,
}

/// A schema node that may be borrowed from the caller or shared from the
/// store's resolution cache.
#[derive(Debug)]
pub enum Resolved<'s> {
    /// Borrowed from the schema being walked.
    Borrowed(&'s Value),
    /// A cached resolution from the store.
    Shared(Arc<Value>),
    /// Composed for this use only.
    Owned(Value),
}

impl Deref for Resolved<'_> {
    type Target = Value;

    fn deref(&self) -> &Value {
        match self {
            Resolved::Borrowed(v) => v,
            Resolved::Shared(v) => v,
            Resolved::Owned(v) => v,
        }
    }
}

/// Result of a speculative branch. Close it with
/// [`Evaluator::commit_branch`] or [`Evaluator::discard_branch`].
#[derive(Debug)]
#[must_use = "a branch must be committed or discarded"]
pub struct Branch {
    checkpoint: Checkpoint,
    errors: usize,
    scratch: Option<Value>,
}

impl Branch {
    /// Whether the branch added no errors.
    pub fn is_valid(&self) -> bool {
        self.errors == 0
    }

    /// Number of errors the branch added.
    pub fn errors(&self) -> usize {
        self.errors
    }
}

/// Per-call evaluation state.
pub struct Evaluator<'a> {
    env: Environment<'a>,
    mode: CheckMode,
    draft: Draft,
    policy: RefSiblings,
    context: ErrorContext,
    bag: ErrorBag,
    ref_trail: Vec<(String, String)>,
    max_depth: usize,
}

impl<'a> Evaluator<'a> {
    /// A fresh evaluator. The ref-siblings policy defaults to the draft's.
    pub fn new(env: Environment<'a>, mode: CheckMode, draft: Draft) -> Self {
        let bag = if mode.contains(CheckMode::EXCEPTIONS) {
            ErrorBag::raising()
        } else {
            ErrorBag::new()
        };
        Self {
            env,
            mode,
            draft,
            policy: draft.ref_policy(),
            context: ErrorContext::Document,
            bag,
            ref_trail: Vec::new(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Override the ref-siblings policy.
    pub fn with_ref_policy(mut self, policy: RefSiblings) -> Self {
        self.policy = policy;
        self
    }

    /// Bound document nesting at `limit` levels.
    pub fn with_max_depth(mut self, limit: usize) -> Self {
        self.max_depth = limit;
        self
    }

    /// Set the context stamped on every record.
    pub fn with_context(mut self, context: ErrorContext) -> Self {
        self.context = context;
        self
    }

    /// Flags of this call.
    pub fn mode(&self) -> CheckMode {
        self.mode
    }

    /// Draft the schema is read as.
    pub fn draft(&self) -> Draft {
        self.draft
    }

    /// Treatment of keywords next to `$ref`.
    pub fn ref_policy(&self) -> RefSiblings {
        self.policy
    }

    /// Context stamped on records.
    pub fn context(&self) -> ErrorContext {
        self.context
    }

    /// The schema store.
    pub fn store(&self) -> &'a SchemaStore {
        self.env.store
    }

    /// The format checker.
    pub fn formats(&self) -> &'a dyn FormatChecker {
        self.env.formats
    }

    /// Compiled regex for `pattern`.
    pub fn regex(&self, pattern: &str) -> Result<CompiledPattern, ValidateError> {
        Ok(self.env.regexes.get(pattern)?)
    }

    /// Direct access to the error bag, for keyword-level checkpoints.
    pub fn bag(&mut self) -> &mut ErrorBag {
        &mut self.bag
    }

    /// Record a violation of `keyword` at `path`.
    ///
    /// # Errors
    ///
    /// Returns the record as an error under `EXCEPTIONS` outside speculation.
    pub fn error(
        &mut self,
        path: &JsonPointer,
        keyword: &str,
        message: impl Into<String>,
        params: Map<String, Value>,
    ) -> Result<(), ValidateError> {
        let record = ErrorRecord::new(path, keyword, message, params, self.context);
        self.bag.push(record)
    }

    /// Consume the evaluator, returning its records.
    pub fn finish(self) -> ErrorList {
        self.bag.into_list()
    }

    /// Check `value` against `schema`.
    ///
    /// # Errors
    ///
    /// Resolution, configuration, ref-cycle and depth failures; the first
    /// committed record under `EXCEPTIONS`.
    pub fn check(&mut self, value: &mut Value, schema: &Value, path: &JsonPointer) -> Result<(), ValidateError> {
        if path.tokens().len() > self.max_depth {
            return Err(ValidateError::DepthExceeded {
                pointer: path.to_fragment(),
                limit: self.max_depth,
            });
        }
        let keywords = match SchemaNode::from_value(schema).map_err(|e| locate(e, path))? {
            SchemaNode::Bool(true) => return Ok(()),
            SchemaNode::Bool(false) => {
                return self.error(path, "false", "Boolean schema false", Map::new());
            }
            SchemaNode::Keywords(keywords) => keywords,
        };

        if let Some(reference) = keywords.get("$ref").and_then(Value::as_str) {
            return self.check_ref(value, reference, keywords.as_map(), path);
        }

        if self.mode.contains(CheckMode::APPLY_DEFAULTS) {
            splice_defaults(self, value, &keywords).map_err(|e| e.located(path))?;
        }

        let registry = self.env.registry;
        for (name, keyword) in registry.iter() {
            if !keywords.contains(name) || !keyword.supports(self.draft) {
                continue;
            }
            if !keyword.kinds().admits(Kind::of(value)) {
                continue;
            }
            keyword
                .check(self, value, &keywords, path)
                .map_err(|e| e.located(path))?;
        }
        Ok(())
    }

    fn check_ref(
        &mut self,
        value: &mut Value,
        reference: &str,
        node: &Map<String, Value>,
        path: &JsonPointer,
    ) -> Result<(), ValidateError> {
        let position = path.to_fragment();
        let limit = self.env.store.max_ref_chain();
        let mut at_position = 0usize;
        for (followed, at) in &self.ref_trail {
            if *at == position {
                at_position += 1;
                if followed == reference {
                    return Err(ValidateError::RefCycle {
                        reference: reference.to_string(),
                        limit,
                    });
                }
            }
        }
        if at_position >= limit {
            return Err(ValidateError::RefCycle {
                reference: reference.to_string(),
                limit,
            });
        }

        let target = self.env.store.resolve_ref(reference, self.policy)?;
        let resolved = self.compose_siblings(target, node);

        self.ref_trail.push((reference.to_string(), position));
        let outcome = self.check(value, &resolved, path);
        self.ref_trail.pop();
        outcome
    }

    fn compose_siblings<'s>(&self, target: Arc<Value>, node: &Map<String, Value>) -> Resolved<'s> {
        if self.policy == RefSiblings::Ignore || node.len() <= 1 {
            return Resolved::Shared(target);
        }
        let mut siblings = node.clone();
        siblings.remove("$ref");
        Resolved::Owned(compose((*target).clone(), siblings, self.policy))
    }

    /// `schema` with any top-level `$ref` resolved and composed.
    pub fn effective<'s>(&self, schema: &'s Value) -> Result<Resolved<'s>, ValidateError> {
        let mut current = Resolved::Borrowed(schema);
        for _ in 0..self.env.store.max_ref_chain() {
            let Some((reference, node)) = current
                .as_object()
                .and_then(|m| m.get("$ref").and_then(Value::as_str).map(|r| (r.to_string(), m.clone())))
            else {
                return Ok(current);
            };
            let target = self.env.store.resolve_ref(&reference, self.policy)?;
            current = self.compose_siblings(target, &node);
        }
        Err(ValidateError::RefCycle {
            reference: schema
                .get("$ref")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            limit: self.env.store.max_ref_chain(),
        })
    }

    /// Evaluate `schema` against `value` inside a speculative checkpoint.
    ///
    /// If the mode may mutate the document, the branch runs against a copy
    /// of `value`, returned by the close methods.
    pub fn speculate(&mut self, value: &mut Value, schema: &Value, path: &JsonPointer) -> Result<Branch, ValidateError> {
        let checkpoint = self.bag.speculate();
        let scratch = if self.mode.mutates_document() {
            let mut copy = value.clone();
            self.check(&mut copy, schema, path)?;
            Some(copy)
        } else {
            self.check(value, schema, path)?;
            None
        };
        let errors = self.bag.errors_since(&checkpoint);
        Ok(Branch {
            checkpoint,
            errors,
            scratch,
        })
    }

    /// Close `branch`, keeping its errors. Returns the branch's copy of the
    /// value, if one was made.
    pub fn commit_branch(&mut self, branch: Branch) -> Option<Value> {
        self.bag.commit(branch.checkpoint);
        branch.scratch
    }

    /// Close `branch`, dropping its errors. Returns the branch's copy of the
    /// value, if one was made.
    pub fn discard_branch(&mut self, branch: Branch) -> Option<Value> {
        self.bag.discard(branch.checkpoint);
        branch.scratch
    }
}

fn locate(err: ConfigurationError, path: &JsonPointer) -> ValidateError {
    ValidateError::Configuration(err).located(path)
}

impl ValidateError {
    /// Fill in the instance pointer of a configuration error that lacks one.
    pub(crate) fn located(self, path: &JsonPointer) -> Self {
        match self {
            ValidateError::Configuration(ConfigurationError::MalformedKeyword {
                keyword,
                pointer,
                reason,
            }) if pointer.is_empty() && !path.is_root() => {
                ValidateError::Configuration(ConfigurationError::MalformedKeyword {
                    keyword,
                    pointer: path.to_fragment(),
                    reason,
                })
            }
            ValidateError::Configuration(ConfigurationError::MalformedSchema { pointer, reason })
                if pointer.is_empty() && !path.is_root() =>
            {
                ValidateError::Configuration(ConfigurationError::MalformedSchema {
                    pointer: path.to_fragment(),
                    reason,
                })
            }
            other => other,
        }
    }
}

/// Shorthand for building a `params` map.
pub(crate) fn params<const N: usize>(entries: [(&str, Value); N]) -> Map<String, Value> {
    entries
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}
