//! Numeric keywords.
//!
//! Bounds compare integers exactly when both sides are integers and fall
//! back to `f64` otherwise. Before draft 6, `exclusiveMinimum` and
//! `exclusiveMaximum` are boolean modifiers of `minimum` and `maximum`;
//! from draft 6 on they are bounds in their own right.

use std::cmp::Ordering;

use conform_core::{JsonPointer, KindSet};
use serde_json::{Number, Value};

use crate::draft::Draft;
use crate::error::ValidateError;
use crate::evaluator::{params, Evaluator};
use crate::registry::Keyword;
use crate::schema::{malformed, KeywordMap};

/// Tolerance for non-integer `multipleOf` checks.
const MULTIPLE_EPSILON: f64 = 1e-10;

fn compare(a: &Number, b: &Number) -> Option<Ordering> {
    if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
        return Some(x.cmp(&y));
    }
    if let (Some(x), Some(y)) = (a.as_u64(), b.as_u64()) {
        return Some(x.cmp(&y));
    }
    a.as_f64()?.partial_cmp(&b.as_f64()?)
}

fn is_multiple(value: &Number, divisor: &Number) -> bool {
    if let (Some(x), Some(d)) = (value.as_i64(), divisor.as_i64()) {
        return x % d == 0;
    }
    if let (Some(x), Some(d)) = (value.as_u64(), divisor.as_u64()) {
        return x % d == 0;
    }
    match (value.as_f64(), divisor.as_f64()) {
        (Some(x), Some(d)) => (x - (x / d).round() * d).abs() < MULTIPLE_EPSILON,
        _ => false,
    }
}

fn number_of(value: &Value) -> Option<&Number> {
    match value {
        Value::Number(n) => Some(n),
        _ => None,
    }
}

fn positive_divisor<'s>(schema: &KeywordMap<'s>, keyword: &str) -> Result<Option<&'s Number>, ValidateError> {
    let Some(divisor) = schema.number(keyword)? else {
        return Ok(None);
    };
    if divisor.as_f64().map_or(true, |d| d <= 0.0) {
        return Err(malformed(keyword, "divisor must be greater than zero").into());
    }
    Ok(Some(divisor))
}

fn legacy_exclusive(eval: &Evaluator<'_>, schema: &KeywordMap<'_>, keyword: &str) -> Result<bool, ValidateError> {
    if eval.draft() > Draft::Draft4 {
        return Ok(false);
    }
    Ok(schema.bool(keyword)?.unwrap_or(false))
}

/// `minimum`, with the boolean `exclusiveMinimum` of drafts 3 and 4.
pub struct Minimum;

impl Keyword for Minimum {
    fn kinds(&self) -> KindSet {
        KindSet::NUMERIC
    }

    fn check(
        &self,
        eval: &mut Evaluator<'_>,
        value: &mut Value,
        schema: &KeywordMap<'_>,
        path: &JsonPointer,
    ) -> Result<(), ValidateError> {
        let (Some(min), Some(n)) = (schema.number("minimum")?, number_of(value)) else {
            return Ok(());
        };
        let exclusive = legacy_exclusive(eval, schema, "exclusiveMinimum")?;
        let ok = match compare(n, min) {
            Some(Ordering::Greater) => true,
            Some(Ordering::Equal) => !exclusive,
            _ => false,
        };
        if !ok {
            let message = if exclusive {
                format!("Must have a minimum value greater than {min}")
            } else {
                format!("Must have a minimum value of {min}")
            };
            eval.error(
                path,
                "minimum",
                message,
                params([("minimum", Value::Number(min.clone())), ("exclusive", Value::Bool(exclusive))]),
            )?;
        }
        Ok(())
    }
}

/// `maximum`, with the boolean `exclusiveMaximum` of drafts 3 and 4.
pub struct Maximum;

impl Keyword for Maximum {
    fn kinds(&self) -> KindSet {
        KindSet::NUMERIC
    }

    fn check(
        &self,
        eval: &mut Evaluator<'_>,
        value: &mut Value,
        schema: &KeywordMap<'_>,
        path: &JsonPointer,
    ) -> Result<(), ValidateError> {
        let (Some(max), Some(n)) = (schema.number("maximum")?, number_of(value)) else {
            return Ok(());
        };
        let exclusive = legacy_exclusive(eval, schema, "exclusiveMaximum")?;
        let ok = match compare(n, max) {
            Some(Ordering::Less) => true,
            Some(Ordering::Equal) => !exclusive,
            _ => false,
        };
        if !ok {
            let message = if exclusive {
                format!("Must have a maximum value less than {max}")
            } else {
                format!("Must have a maximum value of {max}")
            };
            eval.error(
                path,
                "maximum",
                message,
                params([("maximum", Value::Number(max.clone())), ("exclusive", Value::Bool(exclusive))]),
            )?;
        }
        Ok(())
    }
}

/// Numeric `exclusiveMinimum` (draft 6+).
pub struct ExclusiveMinimum;

impl Keyword for ExclusiveMinimum {
    fn kinds(&self) -> KindSet {
        KindSet::NUMERIC
    }

    fn supports(&self, draft: Draft) -> bool {
        draft >= Draft::Draft6
    }

    fn check(
        &self,
        eval: &mut Evaluator<'_>,
        value: &mut Value,
        schema: &KeywordMap<'_>,
        path: &JsonPointer,
    ) -> Result<(), ValidateError> {
        let (Some(min), Some(n)) = (schema.number("exclusiveMinimum")?, number_of(value)) else {
            return Ok(());
        };
        if compare(n, min) != Some(Ordering::Greater) {
            eval.error(
                path,
                "exclusiveMinimum",
                format!("Must have a minimum value greater than {min}"),
                params([("minimum", Value::Number(min.clone()))]),
            )?;
        }
        Ok(())
    }
}

/// Numeric `exclusiveMaximum` (draft 6+).
pub struct ExclusiveMaximum;

impl Keyword for ExclusiveMaximum {
    fn kinds(&self) -> KindSet {
        KindSet::NUMERIC
    }

    fn supports(&self, draft: Draft) -> bool {
        draft >= Draft::Draft6
    }

    fn check(
        &self,
        eval: &mut Evaluator<'_>,
        value: &mut Value,
        schema: &KeywordMap<'_>,
        path: &JsonPointer,
    ) -> Result<(), ValidateError> {
        let (Some(max), Some(n)) = (schema.number("exclusiveMaximum")?, number_of(value)) else {
            return Ok(());
        };
        if compare(n, max) != Some(Ordering::Less) {
            eval.error(
                path,
                "exclusiveMaximum",
                format!("Must have a maximum value less than {max}"),
                params([("maximum", Value::Number(max.clone()))]),
            )?;
        }
        Ok(())
    }
}

/// `multipleOf` (draft 4+).
pub struct MultipleOf;

impl Keyword for MultipleOf {
    fn kinds(&self) -> KindSet {
        KindSet::NUMERIC
    }

    fn supports(&self, draft: Draft) -> bool {
        draft >= Draft::Draft4
    }

    fn check(
        &self,
        eval: &mut Evaluator<'_>,
        value: &mut Value,
        schema: &KeywordMap<'_>,
        path: &JsonPointer,
    ) -> Result<(), ValidateError> {
        let (Some(divisor), Some(n)) = (positive_divisor(schema, "multipleOf")?, number_of(value)) else {
            return Ok(());
        };
        if !is_multiple(n, divisor) {
            eval.error(
                path,
                "multipleOf",
                format!("Must be a multiple of {divisor}"),
                params([("divisor", Value::Number(divisor.clone()))]),
            )?;
        }
        Ok(())
    }
}

/// `divisibleBy` (draft 3).
pub struct DivisibleBy;

impl Keyword for DivisibleBy {
    fn kinds(&self) -> KindSet {
        KindSet::NUMERIC
    }

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
        let (Some(divisor), Some(n)) = (positive_divisor(schema, "divisibleBy")?, number_of(value)) else {
            return Ok(());
        };
        if !is_multiple(n, divisor) {
            eval.error(
                path,
                "divisibleBy",
                format!("Is not divisible by {divisor}"),
                params([("divisor", Value::Number(divisor.clone()))]),
            )?;
        }
        Ok(())
    }
}
