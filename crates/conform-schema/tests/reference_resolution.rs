//! # `$ref` Resolution Across Documents
//!
//! Retrieval through the store, caching, sibling policies per draft, the
//! ref-cycle guard, and file-backed schemas.

use std::sync::Arc;

use conform_core::ResolutionError;
use conform_schema::{
    CheckMode, FileRetriever, InMemoryRetriever, RefSiblings, SchemaStore, ValidateError, Validator,
    ValidatorConfig,
};
use serde_json::json;

fn mutual_retriever() -> Arc<InMemoryRetriever> {
    Arc::new(
        InMemoryRetriever::new()
            .with(
                "http://example.com/a.json",
                json!({
                    "type": "object",
                    "properties": {"b": {"$ref": "b.json"}, "n": {"type": "integer"}}
                }),
            )
            .with(
                "http://example.com/b.json",
                json!({
                    "type": "object",
                    "properties": {"a": {"$ref": "a.json#"}}
                }),
            ),
    )
}

#[test]
fn mutually_referencing_documents_are_fetched_once() -> anyhow::Result<()> {
    let retriever = mutual_retriever();
    let mut validator = Validator::default().with_retriever(retriever.clone());

    let mut doc = json!({"b": {"a": {"b": {"a": {"n": "x"}}}}});
    let errors = validator.validate_uri(&mut doc, "http://example.com/a.json", CheckMode::NORMAL)?;
    assert_eq!(errors.len(), 1);
    assert_eq!(errors.records()[0].pointer, "/b/a/b/a/n");

    let mut doc = json!({"b": {"a": {}}});
    assert!(validator
        .validate_uri(&mut doc, "http://example.com/a.json", CheckMode::NORMAL)?
        .is_empty());

    assert_eq!(retriever.retrieval_count("http://example.com/a.json"), 1);
    assert_eq!(retriever.retrieval_count("http://example.com/b.json"), 1);
    Ok(())
}

#[test]
fn schema_with_id_resolves_relative_refs_against_it() -> anyhow::Result<()> {
    let retriever = Arc::new(InMemoryRetriever::new().with(
        "http://example.com/defs/positive.json",
        json!({"type": "number", "exclusiveMinimum": 0}),
    ));
    let mut validator = Validator::default().with_retriever(retriever);
    let schema = json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "$id": "http://example.com/defs/root.json",
        "properties": {"count": {"$ref": "positive.json"}}
    });
    let errors = validator.validate(&mut json!({"count": 0}), &schema, CheckMode::NORMAL)?;
    assert_eq!(errors.len(), 1);
    assert_eq!(errors.records()[0].constraint_name(), "exclusiveMinimum");
    assert!(validator.store().contains("http://example.com/defs/root.json"));
    Ok(())
}

#[test]
fn missing_document_is_a_resolution_error() {
    let mut validator = Validator::default();
    let err = validator
        .validate(
            &mut json!(1),
            &json!({"$ref": "http://example.com/missing.json"}),
            CheckMode::NORMAL,
        )
        .unwrap_err();
    assert!(matches!(
        err,
        ValidateError::Resolution(ResolutionError::Retrieval { .. })
    ));
}

#[test]
fn dangling_fragment_names_the_document() {
    let mut validator = Validator::default();
    let err = validator
        .validate(&mut json!(1), &json!({"$ref": "#/definitions/absent"}), CheckMode::NORMAL)
        .unwrap_err();
    match err {
        ValidateError::Resolution(ResolutionError::UnresolvableJsonPointer { filename, fragment }) => {
            assert_eq!(filename, "internal://provided-schema/");
            assert_eq!(fragment, "/definitions/absent");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn ref_siblings_merge_in_draft4_and_are_ignored_in_draft7() -> anyhow::Result<()> {
    let mut validator = Validator::default();
    let definitions = json!({"base": {"type": "integer"}});

    let draft4 = json!({
        "$schema": "http://json-schema.org/draft-04/schema#",
        "definitions": definitions,
        "properties": {"x": {"$ref": "#/definitions/base", "maximum": 5}}
    });
    let errors = validator.validate(&mut json!({"x": 9}), &draft4, CheckMode::NORMAL)?;
    assert_eq!(errors.len(), 1);
    assert_eq!(errors.records()[0].constraint_name(), "maximum");

    let draft7 = json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "definitions": definitions,
        "properties": {"x": {"$ref": "#/definitions/base", "maximum": 5}}
    });
    assert!(validator
        .validate(&mut json!({"x": 9}), &draft7, CheckMode::NORMAL)?
        .is_empty());
    Ok(())
}

#[test]
fn ref_sibling_policy_can_be_overridden() -> anyhow::Result<()> {
    let config = ValidatorConfig {
        ref_siblings: Some(RefSiblings::Merge),
        ..ValidatorConfig::default()
    };
    let mut validator = Validator::new(config);
    let schema = json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "definitions": {"base": {"type": "integer"}},
        "properties": {"x": {"$ref": "#/definitions/base", "maximum": 5}}
    });
    let errors = validator.validate(&mut json!({"x": 9}), &schema, CheckMode::NORMAL)?;
    assert_eq!(errors.len(), 1);
    Ok(())
}

#[test]
fn self_referencing_schema_trips_the_cycle_guard() {
    let mut validator = Validator::default();
    let schema = json!({
        "definitions": {
            "a": {"$ref": "#/definitions/b"},
            "b": {"$ref": "#/definitions/a"}
        },
        "$ref": "#/definitions/a"
    });
    let err = validator
        .validate(&mut json!(1), &schema, CheckMode::NORMAL)
        .unwrap_err();
    assert!(matches!(err, ValidateError::RefCycle { .. }), "{err}");
}

#[test]
fn refs_that_never_advance_are_bounded_by_the_configured_limit() {
    let config = ValidatorConfig::from_yaml_str("max_ref_chain: 3").unwrap();
    let mut validator = Validator::new(config);
    let schema = json!({
        "definitions": {
            "a": {"allOf": [{"$ref": "#/definitions/b"}]},
            "b": {"allOf": [{"$ref": "#/definitions/c"}]},
            "c": {"allOf": [{"$ref": "#/definitions/d"}]},
            "d": {"type": "integer"}
        },
        "allOf": [{"$ref": "#/definitions/a"}]
    });
    match validator.validate(&mut json!(1), &schema, CheckMode::NORMAL) {
        Err(ValidateError::RefCycle { limit, .. }) => assert_eq!(limit, 3),
        other => panic!("expected a ref cycle, got {other:?}"),
    }

    let mut relaxed = Validator::default();
    assert!(relaxed
        .validate(&mut json!(1), &schema, CheckMode::NORMAL)
        .unwrap()
        .is_empty());
}

#[test]
fn store_caches_and_lists_documents() -> anyhow::Result<()> {
    let retriever = mutual_retriever();
    let store = SchemaStore::new(retriever.clone());
    let resolved = store.resolve_ref("http://example.com/a.json#/properties/n", RefSiblings::Ignore)?;
    assert_eq!(*resolved, json!({"type": "integer"}));
    store.resolve_ref("http://example.com/a.json#/properties/n", RefSiblings::Ignore)?;
    assert_eq!(retriever.retrieval_count("http://example.com/a.json"), 1);
    assert_eq!(store.ids(), vec!["http://example.com/a.json".to_string()]);
    Ok(())
}

#[test]
fn file_retriever_loads_json_and_yaml_documents() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    std::fs::write(
        dir.path().join("item.yaml"),
        "type: object\nrequired: [id]\nproperties:\n  id:\n    type: integer\n",
    )?;
    std::fs::write(
        dir.path().join("list.json"),
        r#"{"type": "array", "items": {"$ref": "item.yaml"}}"#,
    )?;
    let uri = url::Url::from_file_path(dir.path().join("list.json"))
        .map_err(|()| anyhow::anyhow!("temp path is not absolute"))?;

    let mut validator = Validator::default().with_retriever(Arc::new(FileRetriever));
    let errors = validator.validate_uri(&mut json!([{"id": 1}, {}, {"id": "x"}]), uri.as_str(), CheckMode::NORMAL)?;
    let pointers: Vec<&str> = errors.iter().map(|r| r.pointer.as_str()).collect();
    assert_eq!(pointers, vec!["/1/id", "/2/id"]);
    Ok(())
}

#[test]
fn consecutive_schemas_do_not_share_embedded_documents() -> anyhow::Result<()> {
    let mut validator = Validator::default();
    let schema = |kind: &str| {
        json!({
            "definitions": {"x": {"id": "http://example.com/inner.json", "type": kind}},
            "$ref": "http://example.com/inner.json"
        })
    };
    let errors = validator.validate(&mut json!(5), &schema("string"), CheckMode::NORMAL)?;
    assert_eq!(errors.len(), 1);
    let errors = validator.validate(&mut json!(5), &schema("integer"), CheckMode::NORMAL)?;
    assert!(errors.is_empty(), "{errors}");
    Ok(())
}
