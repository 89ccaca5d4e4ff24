//! # Check Modes, Custom Keywords and Configuration
//!
//! Fail-fast behaviour, meta-schema validation, registry management and
//! loading a validator from a configuration file.

use conform_core::{JsonPointer, KindSet};
use conform_schema::{
    CheckMode, ConfigurationError, ConstraintRegistry, ErrorContext, Evaluator, Keyword, KeywordMap,
    ValidateError, Validator, ValidatorConfig,
};
use serde_json::{json, Map, Value};

/// Integers must be even when the schema says `"even": true`.
struct Even;

impl Keyword for Even {
    fn kinds(&self) -> KindSet {
        KindSet::INTEGER
    }

    fn check(
        &self,
        eval: &mut Evaluator<'_>,
        value: &mut Value,
        schema: &KeywordMap<'_>,
        path: &JsonPointer,
    ) -> Result<(), ValidateError> {
        if schema.bool("even")? != Some(true) {
            return Ok(());
        }
        if value.as_i64().is_some_and(|n| n % 2 != 0) {
            eval.error(path, "even", "Must be even", Map::new())?;
        }
        Ok(())
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[test]
fn exceptions_mode_raises_the_first_error() {
    init_tracing();
    let mut validator = Validator::default();
    let schema = json!({"properties": {"a": {"type": "string"}, "b": {"type": "string"}}});
    let err = validator
        .validate(&mut json!({"a": 1, "b": 2}), &schema, CheckMode::EXCEPTIONS)
        .unwrap_err();
    let record = err.record().expect("validation error carries its record");
    assert_eq!(record.pointer, "/a");
    assert!(matches!(err, ValidateError::Validation(_)));
}

#[test]
fn exceptions_mode_does_not_raise_inside_passing_branches() {
    let mut validator = Validator::default();
    let schema = json!({"anyOf": [{"type": "string"}, {"type": "integer"}]});
    assert!(validator
        .validate(&mut json!(3), &schema, CheckMode::EXCEPTIONS)
        .unwrap()
        .is_empty());
}

#[test]
fn invalid_schema_raises_schema_invalid_under_exceptions() {
    let mut validator = Validator::default();
    let schema = json!({"type": "object", "required": "name"});
    let err = validator
        .validate(&mut json!({}), &schema, CheckMode::VALIDATE_SCHEMA | CheckMode::EXCEPTIONS)
        .unwrap_err();
    match err {
        ValidateError::SchemaInvalid(record) => {
            assert_eq!(record.context, ErrorContext::Schema);
            assert_eq!(record.pointer, "/required");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn meta_schema_validation_uses_the_declared_draft() {
    let mut validator = Validator::default();
    let schema = json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "type": "integer",
        "exclusiveMinimum": true
    });
    let errors = validator
        .validate(&mut json!(5), &schema, CheckMode::VALIDATE_SCHEMA | CheckMode::DISABLE_FORMAT)
        .unwrap_err();
    // Draft 7 needs a number here; evaluation of the document cannot proceed.
    assert!(matches!(errors, ValidateError::Configuration(_)));

    let schema = json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "type": "integer",
        "minLength": "3"
    });
    let errors = validator
        .validate(&mut json!(5), &schema, CheckMode::VALIDATE_SCHEMA)
        .unwrap();
    assert!(!errors.is_empty());
    assert!(errors
        .iter()
        .all(|r| r.context == ErrorContext::Schema && r.pointer == "/minLength"));
    assert_eq!(errors.records()[0].constraint_name(), "type");
}

#[test]
fn valid_schemas_pass_their_meta_schema_in_every_draft() {
    let mut validator = Validator::default();
    for uri in [
        "http://json-schema.org/draft-03/schema#",
        "http://json-schema.org/draft-04/schema#",
        "http://json-schema.org/draft-06/schema#",
        "http://json-schema.org/draft-07/schema#",
    ] {
        let schema = json!({
            "$schema": uri,
            "type": "object",
            "properties": {"name": {"type": "string", "maxLength": 10}},
            "additionalProperties": false
        });
        let errors = validator
            .validate(&mut json!({"name": "x"}), &schema, CheckMode::VALIDATE_SCHEMA)
            .unwrap();
        assert!(errors.is_empty(), "{uri}: {errors}");
    }
}

#[test]
fn self_validation_never_mutates_the_schema() {
    let mut validator = Validator::default();
    let schema = json!({"type": "object", "properties": {"n": {"type": "integer"}}});
    let mut doc = json!({"n": "4"});
    let errors = validator
        .validate(
            &mut doc,
            &schema,
            CheckMode::VALIDATE_SCHEMA | CheckMode::APPLY_DEFAULTS | CheckMode::COERCE_TYPES,
        )
        .unwrap();
    assert!(errors.is_empty());
    assert_eq!(doc, json!({"n": 4}));
    let stored = validator.store().get_schema("internal://provided-schema/").unwrap();
    assert_eq!(*stored, schema);
}

#[test]
fn custom_keyword_runs_after_builtins() {
    let mut validator = Validator::default();
    validator.register_keyword("even", Even).unwrap();
    assert_eq!(validator.registry().names().last(), Some(&"even"));

    let schema = json!({"type": "integer", "even": true, "maximum": 10});
    let errors = validator
        .validate(&mut json!(11), &schema, CheckMode::NORMAL)
        .unwrap();
    let names: Vec<&str> = errors.iter().map(|r| r.constraint_name()).collect();
    assert_eq!(names, vec!["maximum", "even"]);

    assert!(validator
        .validate(&mut json!("odd"), &schema, CheckMode::NORMAL)
        .unwrap()
        .iter()
        .all(|r| r.constraint_name() == "type"));
}

#[test]
fn registry_rejects_bad_names_and_duplicates() {
    let mut validator = Validator::default();
    assert!(matches!(
        validator.register_keyword("", Even),
        Err(ConfigurationError::InvalidKeywordName(_))
    ));
    assert!(matches!(
        validator.register_keyword("has space", Even),
        Err(ConfigurationError::InvalidKeywordName(_))
    ));
    assert!(matches!(
        validator.register_keyword("minimum", Even),
        Err(ConfigurationError::DuplicateKeyword(_))
    ));

    let mut registry = ConstraintRegistry::new();
    assert!(matches!(
        registry.replace("even", Box::new(Even)),
        Err(ConfigurationError::UnknownKeyword(_))
    ));
}

#[test]
fn removing_a_builtin_disables_it() {
    let mut validator = Validator::default();
    assert!(validator.registry_mut().remove("maxLength").is_some());
    assert!(validator
        .validate(&mut json!("long text"), &json!({"maxLength": 2}), CheckMode::NORMAL)
        .unwrap()
        .is_empty());
}

#[test]
fn replacing_a_builtin_swaps_its_behaviour() {
    let mut validator = Validator::default();
    validator
        .registry_mut()
        .replace("multipleOf", Box::new(Even))
        .unwrap();
    // `Even` reads its own keyword, so `multipleOf` now never fails.
    assert!(validator
        .validate(&mut json!(7), &json!({"multipleOf": 2}), CheckMode::NORMAL)
        .unwrap()
        .is_empty());
}

#[test]
fn configuration_file_drives_check() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("validator.yaml");
    std::fs::write(
        &path,
        "default_draft: draft6\nmax_ref_chain: 50\ndefault_mode:\n  - coerce_types\n",
    )?;
    let config = ValidatorConfig::from_yaml_str(&std::fs::read_to_string(&path)?)?;
    let mut validator = Validator::new(config);
    assert_eq!(validator.store().max_ref_chain(), 50);

    let doc = json!({"n": "12"});
    let schema = json!({"properties": {"n": {"type": "integer", "const": 12}}});
    assert!(validator.check(&doc, &schema)?.is_empty());
    assert_eq!(doc, json!({"n": "12"}));
    Ok(())
}
