//! Schema combinators.
//!
//! `anyOf`, `oneOf` and `not` try their branches speculatively. A failing
//! `anyOf` or `oneOf` keeps the branch errors followed by a summary record;
//! a passing one leaves no trace. Under a mutating mode the value of the
//! branch that decided the outcome replaces the original.

use conform_core::JsonPointer;
use serde_json::Value;

use crate::draft::Draft;
use crate::error::ValidateError;
use crate::evaluator::{params, Evaluator};
use crate::registry::Keyword;
use crate::schema::{malformed, KeywordMap};

/// `allOf`: every branch must pass.
pub struct AllOf;

impl Keyword for AllOf {
    fn check(
        &self,
        eval: &mut Evaluator<'_>,
        value: &mut Value,
        schema: &KeywordMap<'_>,
        path: &JsonPointer,
    ) -> Result<(), ValidateError> {
        let Some(branches) = schema.schema_list("allOf")? else {
            return Ok(());
        };
        let checkpoint = eval.bag().checkpoint();
        for branch in branches {
            eval.check(value, branch, path)?;
        }
        let failed = eval.bag().errors_since(&checkpoint) > 0;
        eval.bag().commit(checkpoint);
        if failed {
            eval.error(path, "allOf", "Failed to match all schemas", params([]))?;
        }
        Ok(())
    }
}

/// `anyOf`: the first passing branch wins.
pub struct AnyOf;

impl Keyword for AnyOf {
    fn check(
        &self,
        eval: &mut Evaluator<'_>,
        value: &mut Value,
        schema: &KeywordMap<'_>,
        path: &JsonPointer,
    ) -> Result<(), ValidateError> {
        let Some(branches) = schema.schema_list("anyOf")? else {
            return Ok(());
        };
        let outer = eval.bag().speculate();
        for branch in branches {
            let attempt = eval.speculate(value, branch, path)?;
            if attempt.is_valid() {
                if let Some(copy) = eval.discard_branch(attempt) {
                    *value = copy;
                }
                eval.bag().discard(outer);
                return Ok(());
            }
            let _ = eval.commit_branch(attempt);
        }
        eval.bag().commit(outer);
        eval.error(path, "anyOf", "Failed to match at least one schema", params([]))
    }
}

/// `oneOf`: exactly one branch may pass.
pub struct OneOf;

impl Keyword for OneOf {
    fn check(
        &self,
        eval: &mut Evaluator<'_>,
        value: &mut Value,
        schema: &KeywordMap<'_>,
        path: &JsonPointer,
    ) -> Result<(), ValidateError> {
        let Some(branches) = schema.schema_list("oneOf")? else {
            return Ok(());
        };
        let outer = eval.bag().speculate();
        let mut matched = 0usize;
        let mut adopted = None;
        for branch in branches {
            let attempt = eval.speculate(value, branch, path)?;
            let valid = attempt.is_valid();
            let scratch = eval.commit_branch(attempt);
            if valid {
                matched += 1;
                if matched == 1 {
                    adopted = scratch;
                }
            }
        }
        if matched == 1 {
            eval.bag().discard(outer);
            if let Some(copy) = adopted {
                *value = copy;
            }
            return Ok(());
        }
        eval.bag().commit(outer);
        eval.error(
            path,
            "oneOf",
            "Failed to match exactly one schema",
            params([("matched", Value::from(matched))]),
        )
    }
}

/// `not`.
pub struct Not;

impl Keyword for Not {
    fn check(
        &self,
        eval: &mut Evaluator<'_>,
        value: &mut Value,
        schema: &KeywordMap<'_>,
        path: &JsonPointer,
    ) -> Result<(), ValidateError> {
        let Some(negated) = schema.schema("not")? else {
            return Ok(());
        };
        let attempt = eval.speculate(value, negated, path)?;
        let valid = attempt.is_valid();
        let _ = eval.discard_branch(attempt);
        if valid {
            eval.error(path, "not", "Matched a schema which it should not", params([]))?;
        }
        Ok(())
    }
}

/// `extends` (draft 3): the value must also satisfy the parent schema(s).
pub struct Extends;

impl Keyword for Extends {
    fn supports(&self, draft: Draft) -> bool {
        draft == Draft::Draft3
    }

    fn check(
        &self,
        eval: &mut Evaluator<'_>,
        value: &mut Value,
        schema: &KeywordMap<'_>,
        path: &JsonPointer,
    ) -> Result<(), ValidateError> {
        match schema.get("extends") {
            None => Ok(()),
            Some(Value::Array(parents)) => {
                for parent in parents {
                    eval.check(value, parent, path)?;
                }
                Ok(())
            }
            Some(parent @ Value::Object(_)) => eval.check(value, parent, path),
            Some(_) => Err(malformed("extends", "expected a schema or an array of schemas").into()),
        }
    }
}
