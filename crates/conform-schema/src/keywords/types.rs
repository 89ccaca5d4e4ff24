//! `type` and draft-3 `disallow`.
//!
//! A type list succeeds if any candidate matches. Draft 3 additionally
//! allows `"any"` and inline schemas as candidates.
//!
//! `type` is where the coercing modes act: `COERCE_TYPES` converts a
//! mismatching scalar in place, and `TYPE_CAST` lets an empty array stand
//! for an object and an empty object for an array.

use conform_core::{JsonPointer, Kind};
use serde_json::{Map, Value};

use crate::coerce::coerce_to;
use crate::draft::Draft;
use crate::error::{ConfigurationError, ValidateError};
use crate::evaluator::{params, Evaluator};
use crate::keywords::join_or;
use crate::mode::CheckMode;
use crate::registry::Keyword;
use crate::schema::{malformed, KeywordMap};

enum Candidate<'s> {
    Any,
    Kind(Kind),
    Schema(&'s Value),
}

fn candidates<'s>(keyword: &str, spec: &'s Value, draft: Draft) -> Result<Vec<Candidate<'s>>, ConfigurationError> {
    let one = |entry: &'s Value| match entry {
        Value::String(name) if name == "any" => Ok(Candidate::Any),
        Value::String(name) => Kind::from_name(name)
            .map(Candidate::Kind)
            .ok_or_else(|| malformed(keyword, format!("unknown type name '{name}'"))),
        Value::Object(_) if draft == Draft::Draft3 => Ok(Candidate::Schema(entry)),
        _ => Err(malformed(keyword, "expected a type name or a list of type names")),
    };
    match spec {
        Value::Array(entries) => entries.iter().map(one).collect(),
        single => one(single).map(|c| vec![c]),
    }
}

/// Strict kind match, widened by `TYPE_CAST` for empty containers.
fn matches_kind(value: &Value, kind: Kind, mode: CheckMode) -> bool {
    if Kind::of(value).satisfies(kind) {
        return true;
    }
    mode.contains(CheckMode::TYPE_CAST)
        && match (kind, value) {
            (Kind::Object, Value::Array(items)) => items.is_empty(),
            (Kind::Array, Value::Object(map)) => map.is_empty(),
            _ => false,
        }
}

/// Replace an empty container with the other container kind.
fn cast_container(value: &mut Value, kind: Kind) {
    match (kind, &*value) {
        (Kind::Object, Value::Array(_)) => *value = Value::Object(Map::new()),
        (Kind::Array, Value::Object(_)) => *value = Value::Array(Vec::new()),
        _ => {}
    }
}

/// Evaluate a draft-3 schema candidate. A matching branch's copy of the
/// value is adopted when `adopt` is set.
fn schema_matches(
    eval: &mut Evaluator<'_>,
    value: &mut Value,
    schema: &Value,
    path: &JsonPointer,
    adopt: bool,
) -> Result<bool, ValidateError> {
    let branch = eval.speculate(value, schema, path)?;
    let valid = branch.is_valid();
    let scratch = eval.discard_branch(branch);
    if let (true, true, Some(copy)) = (valid, adopt, scratch) {
        *value = copy;
    }
    Ok(valid)
}

fn capitalized(kind: Kind) -> String {
    let name = kind.name();
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// `type`.
pub struct Type;

impl Keyword for Type {
    fn check(
        &self,
        eval: &mut Evaluator<'_>,
        value: &mut Value,
        schema: &KeywordMap<'_>,
        path: &JsonPointer,
    ) -> Result<(), ValidateError> {
        let Some(spec) = schema.get("type") else {
            return Ok(());
        };
        let candidates = candidates("type", spec, eval.draft())?;
        let mode = eval.mode();
        let coerce = mode.contains(CheckMode::COERCE_TYPES);
        let early = coerce && mode.contains(CheckMode::EARLY_COERCE);

        for candidate in &candidates {
            match candidate {
                Candidate::Any => return Ok(()),
                Candidate::Kind(kind) => {
                    if matches_kind(value, *kind, mode) {
                        if coerce {
                            cast_container(value, *kind);
                        }
                        return Ok(());
                    }
                    if early {
                        if let Some(converted) = coerce_to(value, *kind) {
                            *value = converted;
                            return Ok(());
                        }
                    }
                }
                Candidate::Schema(subschema) => {
                    if schema_matches(eval, value, subschema, path, true)? {
                        return Ok(());
                    }
                }
            }
        }

        if coerce && !early {
            for candidate in &candidates {
                if let Candidate::Kind(kind) = candidate {
                    if let Some(converted) = coerce_to(value, *kind) {
                        *value = converted;
                        return Ok(());
                    }
                }
            }
        }

        let wording: Vec<&str> = candidates
            .iter()
            .map(|c| match c {
                Candidate::Kind(kind) => kind.with_article(),
                Candidate::Any => "any value",
                Candidate::Schema(_) => "a matching schema",
            })
            .collect();
        let found = Kind::of(value);
        let expected = join_or(&wording);
        eval.error(
            path,
            "type",
            format!("{} value found, but {expected} is required", capitalized(found)),
            params([
                ("found", Value::from(found.name())),
                ("expected", Value::from(expected.clone())),
            ]),
        )
    }
}

/// `disallow` (draft 3): the value must match none of the listed types.
pub struct Disallow;

impl Keyword for Disallow {
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
        let Some(spec) = schema.get("disallow") else {
            return Ok(());
        };
        let mode = eval.mode();
        let mut matched = false;
        for candidate in candidates("disallow", spec, eval.draft())? {
            matched = match candidate {
                Candidate::Any => true,
                Candidate::Kind(kind) => matches_kind(value, kind, mode),
                Candidate::Schema(subschema) => schema_matches(eval, value, subschema, path, false)?,
            };
            if matched {
                break;
            }
        }
        if matched {
            eval.error(
                path,
                "disallow",
                "Disallowed value was matched",
                params([("disallowed", spec.clone())]),
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::{CheckMode, Validator};
    use serde_json::json;

    #[test]
    fn type_list_message_names_all_candidates() {
        let mut v = Validator::default();
        let errors = v
            .validate(&mut json!("x"), &json!({"type": ["number", "boolean"]}), CheckMode::NORMAL)
            .unwrap();
        assert_eq!(errors.len(), 1);
        let record = &errors.records()[0];
        assert_eq!(record.message, "String value found, but a number or a boolean is required");
        assert_eq!(record.constraint.params["expected"], "a number or a boolean");
    }

    #[test]
    fn integer_accepts_integral_float() {
        let mut v = Validator::default();
        assert!(v
            .validate(&mut json!(1.0), &json!({"type": "integer"}), CheckMode::NORMAL)
            .unwrap()
            .is_empty());
        assert_eq!(
            v.validate(&mut json!(1.5), &json!({"type": "integer"}), CheckMode::NORMAL)
                .unwrap()
                .len(),
            1
        );
    }

    #[test]
    fn coercion_converts_in_place() {
        let mut v = Validator::default();
        let mut doc = json!({"n": "10", "b": "true", "s": 5});
        let schema = json!({"properties": {
            "n": {"type": "integer"},
            "b": {"type": "boolean"},
            "s": {"type": "string"}
        }});
        let errors = v.validate(&mut doc, &schema, CheckMode::COERCE_TYPES).unwrap();
        assert!(errors.is_empty(), "{errors}");
        assert_eq!(doc, json!({"n": 10, "b": true, "s": "5"}));
    }

    #[test]
    fn early_coerce_prefers_first_convertible_type() {
        let schema = json!({"type": ["integer", "string"]});
        let mut v = Validator::default();

        let mut late = json!("7");
        v.validate(&mut late, &schema, CheckMode::COERCE_TYPES).unwrap();
        assert_eq!(late, json!("7"));

        let mut early = json!("7");
        v.validate(&mut early, &schema, CheckMode::COERCE_TYPES | CheckMode::EARLY_COERCE)
            .unwrap();
        assert_eq!(early, json!(7));
    }

    #[test]
    fn type_cast_accepts_empty_containers() {
        let mut v = Validator::default();
        let schema = json!({"type": "object"});
        assert_eq!(
            v.validate(&mut json!([]), &schema, CheckMode::NORMAL).unwrap().len(),
            1
        );
        assert!(v
            .validate(&mut json!([]), &schema, CheckMode::TYPE_CAST)
            .unwrap()
            .is_empty());
        assert_eq!(
            v.validate(&mut json!([1]), &schema, CheckMode::TYPE_CAST)
                .unwrap()
                .len(),
            1
        );

        let mut doc = json!([]);
        v.validate(&mut doc, &schema, CheckMode::TYPE_CAST | CheckMode::COERCE_TYPES)
            .unwrap();
        assert_eq!(doc, json!({}));
    }

    #[test]
    fn draft3_type_any_and_schema_candidates() {
        let mut v = Validator::default();
        let schema = json!({
            "$schema": "http://json-schema.org/draft-03/schema#",
            "type": ["null", {"type": "string", "maxLength": 2}]
        });
        assert!(v.validate(&mut json!(null), &schema, CheckMode::NORMAL).unwrap().is_empty());
        assert!(v.validate(&mut json!("ab"), &schema, CheckMode::NORMAL).unwrap().is_empty());
        let errors = v.validate(&mut json!("abc"), &schema, CheckMode::NORMAL).unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.records()[0].constraint_name(), "type");

        let any = json!({"$schema": "http://json-schema.org/draft-03/schema#", "type": "any"});
        assert!(v.validate(&mut json!({"x": 1}), &any, CheckMode::NORMAL).unwrap().is_empty());
    }

    #[test]
    fn draft3_disallow() {
        let mut v = Validator::default();
        let schema = json!({
            "$schema": "http://json-schema.org/draft-03/schema#",
            "disallow": ["string", "null"]
        });
        assert!(v.validate(&mut json!(3), &schema, CheckMode::NORMAL).unwrap().is_empty());
        let errors = v.validate(&mut json!("x"), &schema, CheckMode::NORMAL).unwrap();
        assert_eq!(errors.records()[0].message, "Disallowed value was matched");
    }

    #[test]
    fn unknown_type_name_is_malformed() {
        let mut v = Validator::default();
        let err = v
            .validate(&mut json!(1), &json!({"type": "float"}), CheckMode::NORMAL)
            .unwrap_err();
        assert!(err.to_string().contains("unknown type name 'float'"));
    }
}
