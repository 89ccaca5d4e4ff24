//! String keywords. Lengths count Unicode scalar values.

use conform_core::{JsonPointer, KindSet};
use serde_json::Value;

use crate::error::ValidateError;
use crate::evaluator::{params, Evaluator};
use crate::mode::CheckMode;
use crate::registry::Keyword;
use crate::schema::KeywordMap;

fn char_count(value: &Value) -> u64 {
    value.as_str().map_or(0, |s| s.chars().count() as u64)
}

/// `minLength`.
pub struct MinLength;

impl Keyword for MinLength {
    fn kinds(&self) -> KindSet {
        KindSet::STRING
    }

    fn check(
        &self,
        eval: &mut Evaluator<'_>,
        value: &mut Value,
        schema: &KeywordMap<'_>,
        path: &JsonPointer,
    ) -> Result<(), ValidateError> {
        let Some(min) = schema.count("minLength")? else {
            return Ok(());
        };
        if char_count(value) < min {
            eval.error(
                path,
                "minLength",
                format!("Must be at least {min} characters long"),
                params([("min", Value::from(min))]),
            )?;
        }
        Ok(())
    }
}

/// `maxLength`.
pub struct MaxLength;

impl Keyword for MaxLength {
    fn kinds(&self) -> KindSet {
        KindSet::STRING
    }

    fn check(
        &self,
        eval: &mut Evaluator<'_>,
        value: &mut Value,
        schema: &KeywordMap<'_>,
        path: &JsonPointer,
    ) -> Result<(), ValidateError> {
        let Some(max) = schema.count("maxLength")? else {
            return Ok(());
        };
        if char_count(value) > max {
            eval.error(
                path,
                "maxLength",
                format!("Must be at most {max} characters long"),
                params([("max", Value::from(max))]),
            )?;
        }
        Ok(())
    }
}

/// `pattern`: unanchored regex search.
pub struct Pattern;

impl Keyword for Pattern {
    fn kinds(&self) -> KindSet {
        KindSet::STRING
    }

    fn check(
        &self,
        eval: &mut Evaluator<'_>,
        value: &mut Value,
        schema: &KeywordMap<'_>,
        path: &JsonPointer,
    ) -> Result<(), ValidateError> {
        let Some(pattern) = schema.str("pattern")? else {
            return Ok(());
        };
        let regex = eval.regex(pattern)?;
        let text = value.as_str().unwrap_or_default();
        if !regex.is_match(text)? {
            eval.error(
                path,
                "pattern",
                format!("Does not match the regex pattern {pattern}"),
                params([("pattern", Value::from(pattern))]),
            )?;
        }
        Ok(())
    }
}

/// `format`, delegated to the validator's [`FormatChecker`](crate::FormatChecker).
pub struct Format;

impl Keyword for Format {
    fn kinds(&self) -> KindSet {
        KindSet::STRING
    }

    fn check(
        &self,
        eval: &mut Evaluator<'_>,
        value: &mut Value,
        schema: &KeywordMap<'_>,
        path: &JsonPointer,
    ) -> Result<(), ValidateError> {
        if eval.mode().contains(CheckMode::DISABLE_FORMAT) {
            return Ok(());
        }
        let Some(format) = schema.str("format")? else {
            return Ok(());
        };
        let text = value.as_str().unwrap_or_default();
        if !eval.formats().check(text, format) {
            eval.error(
                path,
                "format",
                format!("Invalid {format}"),
                params([("format", Value::from(format))]),
            )?;
        }
        Ok(())
    }
}
