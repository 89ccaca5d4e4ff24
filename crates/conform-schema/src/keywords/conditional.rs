//! `if` / `then` / `else` (draft 7).

use conform_core::JsonPointer;
use serde_json::Value;

use crate::draft::Draft;
use crate::error::ValidateError;
use crate::evaluator::Evaluator;
use crate::registry::Keyword;
use crate::schema::KeywordMap;

/// `if`. The condition itself never reports errors.
pub struct If;

impl Keyword for If {
    fn supports(&self, draft: Draft) -> bool {
        draft >= Draft::Draft7
    }

    fn check(
        &self,
        eval: &mut Evaluator<'_>,
        value: &mut Value,
        schema: &KeywordMap<'_>,
        path: &JsonPointer,
    ) -> Result<(), ValidateError> {
        let Some(condition) = schema.schema("if")? else {
            return Ok(());
        };
        let attempt = eval.speculate(value, condition, path)?;
        let holds = attempt.is_valid();
        let _ = eval.discard_branch(attempt);

        let consequence = if holds { schema.schema("then")? } else { schema.schema("else")? };
        match consequence {
            Some(branch) => eval.check(value, branch, path),
            None => Ok(()),
        }
    }
}
