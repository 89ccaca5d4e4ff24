//! Default splicing for `CheckMode::APPLY_DEFAULTS`.
//!
//! Runs before the keywords of a node, so `required` and `properties` see
//! the completed value. Every spliced value is a deep copy; the stored schema
//! is never aliased by the document.

use serde_json::Value;

use crate::error::ValidateError;
use crate::evaluator::Evaluator;
use crate::mode::CheckMode;
use crate::schema::KeywordMap;

pub(crate) fn splice_defaults(
    eval: &Evaluator<'_>,
    value: &mut Value,
    schema: &KeywordMap<'_>,
) -> Result<(), ValidateError> {
    let only_required = eval.mode().contains(CheckMode::ONLY_REQUIRED_DEFAULTS);
    let required = match schema.get("required") {
        Some(Value::Array(_)) => schema.string_list("required")?.unwrap_or_default(),
        _ => Vec::new(),
    };

    match value {
        Value::Object(object) => {
            if let Some(Value::Object(defaults)) = schema.get("default") {
                for (name, default) in defaults {
                    if object.contains_key(name) || (only_required && !required.contains(&name.as_str())) {
                        continue;
                    }
                    object.insert(name.clone(), default.clone());
                }
            }

            let Some(properties) = schema.object("properties")? else {
                return Ok(());
            };
            for (name, subschema) in properties {
                if object.contains_key(name) {
                    continue;
                }
                let subschema = eval.effective(subschema)?;
                let Some(default) = subschema.get("default") else {
                    continue;
                };
                let flagged_required = subschema.get("required").and_then(Value::as_bool) == Some(true);
                if only_required && !(flagged_required || required.contains(&name.as_str())) {
                    continue;
                }
                object.insert(name.clone(), default.clone());
            }
        }
        Value::Array(items) if !only_required => {
            let Some(positional) = schema.get("items").and_then(Value::as_array) else {
                return Ok(());
            };
            for subschema in positional.iter().skip(items.len()) {
                let subschema = eval.effective(subschema)?;
                match subschema.get("default") {
                    Some(default) => items.push(default.clone()),
                    None => break,
                }
            }
        }
        _ => {}
    }
    Ok(())
}
