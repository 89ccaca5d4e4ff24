//! Object keywords.
//!
//! A missing property is absence, never `null`: `required` and
//! `dependencies` test key presence only.

use conform_core::{JsonPointer, KindSet};
use serde_json::{Map, Value};

use crate::draft::Draft;
use crate::error::ValidateError;
use crate::evaluator::{params, Evaluator};
use crate::registry::Keyword;
use crate::schema::{malformed, KeywordMap};

fn has_property(value: &Value, name: &str) -> bool {
    value.as_object().is_some_and(|object| object.contains_key(name))
}

fn property_names(value: &Value) -> Vec<String> {
    value
        .as_object()
        .map(|object| object.keys().cloned().collect())
        .unwrap_or_default()
}

fn property_count(value: &Value) -> u64 {
    value.as_object().map_or(0, Map::len) as u64
}

fn missing_property(eval: &mut Evaluator<'_>, path: &JsonPointer, name: &str) -> Result<(), ValidateError> {
    eval.error(
        &path.append(name),
        "required",
        format!("The property {name} is required"),
        params([("property", Value::from(name))]),
    )
}

/// `required`: list of property names. The boolean form from draft 3 is
/// handled by `properties`, in every draft.
pub struct Required;

impl Keyword for Required {
    fn kinds(&self) -> KindSet {
        KindSet::OBJECT
    }

    fn check(
        &self,
        eval: &mut Evaluator<'_>,
        value: &mut Value,
        schema: &KeywordMap<'_>,
        path: &JsonPointer,
    ) -> Result<(), ValidateError> {
        if let Some(Value::Bool(_)) = schema.get("required") {
            return Ok(());
        }
        let Some(names) = schema.string_list("required")? else {
            return Ok(());
        };
        for name in names {
            if !has_property(value, name) {
                missing_property(eval, path, name)?;
            }
        }
        Ok(())
    }
}

/// `dependencies`: property → required names (array, or a single string in
/// draft 3) or a schema the whole object must satisfy.
pub struct Dependencies;

impl Keyword for Dependencies {
    fn kinds(&self) -> KindSet {
        KindSet::OBJECT
    }

    fn check(
        &self,
        eval: &mut Evaluator<'_>,
        value: &mut Value,
        schema: &KeywordMap<'_>,
        path: &JsonPointer,
    ) -> Result<(), ValidateError> {
        let Some(dependencies) = schema.object("dependencies")? else {
            return Ok(());
        };
        for (property, dependency) in dependencies {
            if !has_property(value, property) {
                continue;
            }
            match dependency {
                Value::String(needed) if eval.draft() == Draft::Draft3 => {
                    check_dependency(eval, value, path, property, std::slice::from_ref(dependency), needed)?;
                }
                Value::Array(needed) => {
                    for entry in needed {
                        let name = entry
                            .as_str()
                            .ok_or_else(|| malformed("dependencies", "dependency lists must contain strings"))?;
                        check_dependency(eval, value, path, property, needed, name)?;
                    }
                }
                Value::Object(_) | Value::Bool(_) => eval.check(value, dependency, path)?,
                _ => return Err(malformed("dependencies", "expected a schema or a list of names").into()),
            }
        }
        Ok(())
    }
}

fn check_dependency(
    eval: &mut Evaluator<'_>,
    value: &Value,
    path: &JsonPointer,
    property: &str,
    all: &[Value],
    needed: &str,
) -> Result<(), ValidateError> {
    if has_property(value, needed) {
        return Ok(());
    }
    eval.error(
        path,
        "dependencies",
        format!("{property} depends on {needed}"),
        params([
            ("property", Value::from(property)),
            ("dependency", Value::from(needed)),
            ("dependencies", Value::Array(all.to_vec())),
        ]),
    )
}

/// `properties`. A property subschema may carry the draft-3 form
/// `"required": true`, which is honoured in every draft.
pub struct Properties;

impl Keyword for Properties {
    fn kinds(&self) -> KindSet {
        KindSet::OBJECT
    }

    fn check(
        &self,
        eval: &mut Evaluator<'_>,
        value: &mut Value,
        schema: &KeywordMap<'_>,
        path: &JsonPointer,
    ) -> Result<(), ValidateError> {
        let Some(properties) = schema.object("properties")? else {
            return Ok(());
        };
        for (name, subschema) in properties {
            match value.get_mut(name.as_str()) {
                Some(child) => eval.check(child, subschema, &path.append(name.as_str()))?,
                None => {
                    let effective = eval.effective(subschema)?;
                    if effective.get("required").and_then(Value::as_bool) == Some(true) {
                        missing_property(eval, path, name)?;
                    }
                }
            }
        }
        Ok(())
    }
}

/// `patternProperties`: every property whose name matches a pattern is
/// checked against that pattern's schema.
pub struct PatternProperties;

impl Keyword for PatternProperties {
    fn kinds(&self) -> KindSet {
        KindSet::OBJECT
    }

    fn check(
        &self,
        eval: &mut Evaluator<'_>,
        value: &mut Value,
        schema: &KeywordMap<'_>,
        path: &JsonPointer,
    ) -> Result<(), ValidateError> {
        let Some(patterns) = schema.object("patternProperties")? else {
            return Ok(());
        };
        for (pattern, subschema) in patterns {
            let regex = eval.regex(pattern)?;
            let mut matching = Vec::new();
            for name in property_names(value) {
                if regex.is_match(&name)? {
                    matching.push(name);
                }
            }
            for name in matching {
                if let Some(child) = value.get_mut(name.as_str()) {
                    eval.check(child, subschema, &path.append(name.as_str()))?;
                }
            }
        }
        Ok(())
    }
}

/// `additionalProperties`: properties matched by neither `properties` nor
/// `patternProperties`.
pub struct AdditionalProperties;

impl Keyword for AdditionalProperties {
    fn kinds(&self) -> KindSet {
        KindSet::OBJECT
    }

    fn check(
        &self,
        eval: &mut Evaluator<'_>,
        value: &mut Value,
        schema: &KeywordMap<'_>,
        path: &JsonPointer,
    ) -> Result<(), ValidateError> {
        let Some(additional) = schema.schema("additionalProperties")? else {
            return Ok(());
        };
        if additional == &Value::Bool(true) {
            return Ok(());
        }
        let declared = schema.object("properties")?;
        let mut patterns = Vec::new();
        if let Some(pattern_map) = schema.object("patternProperties")? {
            for pattern in pattern_map.keys() {
                patterns.push(eval.regex(pattern)?);
            }
        }
        let mut extras = Vec::new();
        for name in property_names(value) {
            if declared.is_some_and(|d| d.contains_key(&name)) {
                continue;
            }
            let mut matched = false;
            for re in &patterns {
                if re.is_match(&name)? {
                    matched = true;
                    break;
                }
            }
            if !matched {
                extras.push(name);
            }
        }

        for name in extras {
            if additional == &Value::Bool(false) {
                eval.error(
                    path,
                    "additionalProperties",
                    format!(
                        "The property {name} is not defined and the definition does not allow additional properties"
                    ),
                    params([("property", Value::from(name.as_str()))]),
                )?;
            } else if let Some(child) = value.get_mut(name.as_str()) {
                eval.check(child, additional, &path.append(name.as_str()))?;
            }
        }
        Ok(())
    }
}

/// `minProperties`.
pub struct MinProperties;

impl Keyword for MinProperties {
    fn kinds(&self) -> KindSet {
        KindSet::OBJECT
    }

    fn check(
        &self,
        eval: &mut Evaluator<'_>,
        value: &mut Value,
        schema: &KeywordMap<'_>,
        path: &JsonPointer,
    ) -> Result<(), ValidateError> {
        let Some(min) = schema.count("minProperties")? else {
            return Ok(());
        };
        if property_count(value) < min {
            eval.error(
                path,
                "minProperties",
                format!("Must contain a minimum of {min} properties"),
                params([("min", Value::from(min))]),
            )?;
        }
        Ok(())
    }
}

/// `maxProperties`.
pub struct MaxProperties;

impl Keyword for MaxProperties {
    fn kinds(&self) -> KindSet {
        KindSet::OBJECT
    }

    fn check(
        &self,
        eval: &mut Evaluator<'_>,
        value: &mut Value,
        schema: &KeywordMap<'_>,
        path: &JsonPointer,
    ) -> Result<(), ValidateError> {
        let Some(max) = schema.count("maxProperties")? else {
            return Ok(());
        };
        if property_count(value) > max {
            eval.error(
                path,
                "maxProperties",
                format!("Must contain no more than {max} properties"),
                params([("max", Value::from(max))]),
            )?;
        }
        Ok(())
    }
}

/// `propertyNames` (draft 6+): every property name, as a string value, must
/// satisfy the schema.
pub struct PropertyNames;

impl Keyword for PropertyNames {
    fn kinds(&self) -> KindSet {
        KindSet::OBJECT
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
        let Some(names_schema) = schema.schema("propertyNames")? else {
            return Ok(());
        };
        for name in property_names(value) {
            let at = path.append(name.as_str());
            let mut name_value = Value::String(name);
            eval.check(&mut name_value, names_schema, &at)?;
        }
        Ok(())
    }
}
