//! `enum` and `const`, compared with [`json_equal`].

use conform_core::{json_equal, JsonPointer};
use serde_json::Value;

use crate::draft::Draft;
use crate::error::ValidateError;
use crate::evaluator::{params, Evaluator};
use crate::registry::Keyword;
use crate::schema::KeywordMap;

/// `enum`.
pub struct Enum;

impl Keyword for Enum {
    fn check(
        &self,
        eval: &mut Evaluator<'_>,
        value: &mut Value,
        schema: &KeywordMap<'_>,
        path: &JsonPointer,
    ) -> Result<(), ValidateError> {
        let Some(allowed) = schema.array("enum")? else {
            return Ok(());
        };
        if allowed.iter().any(|candidate| json_equal(candidate, value)) {
            return Ok(());
        }
        let listed = Value::Array(allowed.to_vec());
        eval.error(
            path,
            "enum",
            format!("Does not have a value in the enumeration {listed}"),
            params([("enum", listed)]),
        )
    }
}

/// `const` (draft 6+).
pub struct Const;

impl Keyword for Const {
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
        // `const: null` is a real constraint, so presence is what counts.
        let Some(expected) = schema.get("const") else {
            return Ok(());
        };
        if json_equal(expected, value) {
            return Ok(());
        }
        eval.error(
            path,
            "const",
            format!("Does not have a value equal to {expected}"),
            params([("const", expected.clone())]),
        )
    }
}
