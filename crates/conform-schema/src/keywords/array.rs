//! Array keywords.

use conform_core::{json_equal, JsonPointer, KindSet};
use serde_json::Value;

use crate::draft::Draft;
use crate::error::ValidateError;
use crate::evaluator::{params, Evaluator};
use crate::registry::Keyword;
use crate::schema::{malformed, KeywordMap};

fn item_count(value: &Value) -> usize {
    value.as_array().map_or(0, Vec::len)
}

/// `items`: one schema for every element, or a positional list.
pub struct Items;

impl Keyword for Items {
    fn kinds(&self) -> KindSet {
        KindSet::ARRAY
    }

    fn check(
        &self,
        eval: &mut Evaluator<'_>,
        value: &mut Value,
        schema: &KeywordMap<'_>,
        path: &JsonPointer,
    ) -> Result<(), ValidateError> {
        let Some(items_schema) = schema.get("items") else {
            return Ok(());
        };
        let Some(items) = value.as_array_mut() else {
            return Ok(());
        };
        match items_schema {
            Value::Array(positional) => {
                for (index, (item, subschema)) in items.iter_mut().zip(positional).enumerate() {
                    eval.check(item, subschema, &path.append_index(index))?;
                }
            }
            Value::Object(_) | Value::Bool(_) => {
                for (index, item) in items.iter_mut().enumerate() {
                    eval.check(item, items_schema, &path.append_index(index))?;
                }
            }
            _ => return Err(malformed("items", "expected a schema or an array of schemas").into()),
        }
        Ok(())
    }
}

/// `additionalItems`: elements past a positional `items` list.
pub struct AdditionalItems;

impl Keyword for AdditionalItems {
    fn kinds(&self) -> KindSet {
        KindSet::ARRAY
    }

    fn check(
        &self,
        eval: &mut Evaluator<'_>,
        value: &mut Value,
        schema: &KeywordMap<'_>,
        path: &JsonPointer,
    ) -> Result<(), ValidateError> {
        let Some(additional) = schema.schema("additionalItems")? else {
            return Ok(());
        };
        let Some(Value::Array(positional)) = schema.get("items") else {
            return Ok(());
        };
        let declared = positional.len();
        if additional == &Value::Bool(false) {
            let container = match path.property_path() {
                p if p.is_empty() => "$".to_string(),
                p => p,
            };
            for index in declared..item_count(value) {
                eval.error(
                    path,
                    "additionalItems",
                    format!(
                        "The item {container}[{index}] is not defined and the definition does not allow additional items"
                    ),
                    params([("index", Value::from(index))]),
                )?;
            }
            return Ok(());
        }
        if let Some(items) = value.as_array_mut() {
            for (index, item) in items.iter_mut().enumerate().skip(declared) {
                eval.check(item, additional, &path.append_index(index))?;
            }
        }
        Ok(())
    }
}

/// `minItems`.
pub struct MinItems;

impl Keyword for MinItems {
    fn kinds(&self) -> KindSet {
        KindSet::ARRAY
    }

    fn check(
        &self,
        eval: &mut Evaluator<'_>,
        value: &mut Value,
        schema: &KeywordMap<'_>,
        path: &JsonPointer,
    ) -> Result<(), ValidateError> {
        let Some(min) = schema.count("minItems")? else {
            return Ok(());
        };
        if (item_count(value) as u64) < min {
            eval.error(
                path,
                "minItems",
                format!("There must be a minimum of {min} items in the array"),
                params([("min", Value::from(min))]),
            )?;
        }
        Ok(())
    }
}

/// `maxItems`.
pub struct MaxItems;

impl Keyword for MaxItems {
    fn kinds(&self) -> KindSet {
        KindSet::ARRAY
    }

    fn check(
        &self,
        eval: &mut Evaluator<'_>,
        value: &mut Value,
        schema: &KeywordMap<'_>,
        path: &JsonPointer,
    ) -> Result<(), ValidateError> {
        let Some(max) = schema.count("maxItems")? else {
            return Ok(());
        };
        if (item_count(value) as u64) > max {
            eval.error(
                path,
                "maxItems",
                format!("There must be a maximum of {max} items in the array"),
                params([("max", Value::from(max))]),
            )?;
        }
        Ok(())
    }
}

/// `uniqueItems`, using structural equality.
pub struct UniqueItems;

impl Keyword for UniqueItems {
    fn kinds(&self) -> KindSet {
        KindSet::ARRAY
    }

    fn check(
        &self,
        eval: &mut Evaluator<'_>,
        value: &mut Value,
        schema: &KeywordMap<'_>,
        path: &JsonPointer,
    ) -> Result<(), ValidateError> {
        if schema.bool("uniqueItems")? != Some(true) {
            return Ok(());
        }
        let items = value.as_array().map(Vec::as_slice).unwrap_or_default();
        let duplicated = items
            .iter()
            .enumerate()
            .any(|(i, a)| items[i + 1..].iter().any(|b| json_equal(a, b)));
        if duplicated {
            eval.error(
                path,
                "uniqueItems",
                "There are no duplicates allowed in the array",
                params([]),
            )?;
        }
        Ok(())
    }
}

/// `contains` (draft 6+): at least one element matches.
pub struct Contains;

impl Keyword for Contains {
    fn kinds(&self) -> KindSet {
        KindSet::ARRAY
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
        let Some(subschema) = schema.schema("contains")? else {
            return Ok(());
        };
        let Some(items) = value.as_array_mut() else {
            return Ok(());
        };
        for (index, item) in items.iter_mut().enumerate() {
            let branch = eval.speculate(item, subschema, &path.append_index(index))?;
            let valid = branch.is_valid();
            let _ = eval.discard_branch(branch);
            if valid {
                return Ok(());
            }
        }
        eval.error(
            path,
            "contains",
            "Does not contain an element that matches the schema",
            params([]),
        )
    }
}
