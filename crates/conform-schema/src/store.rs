//! # Schema Store — Documents by Absolute URI
//!
//! Caches schema documents under their normalized absolute URI and resolves
//! `$ref` strings against them.
//!
//! ## Insertion
//!
//! [`SchemaStore::add_schema`] walks a document once before it becomes
//! visible:
//!
//! - every nested `$ref` string is rewritten to an absolute URI, resolved
//!   against the document id and any enclosing `id`/`$id` base change;
//! - subschemas whose `id`/`$id` names a *different* document are also
//!   registered under that document's key;
//! - literal data positions (`enum`, `const`, `default`, `examples`) are not
//!   entered.
//!
//! After insertion every `$ref` in a stored tree is absolute, so resolution
//! never needs to know where a node came from.
//!
//! ## Resolution
//!
//! [`SchemaStore::resolve_ref`] follows alias chains (a target that is
//! itself a `$ref`) iteratively, then composes the siblings collected along
//! the chain with the final target according to a [`RefSiblings`] policy.
//! Stored trees are never mutated; composed results are cached.
//!
//! ## Concurrency
//!
//! Documents and the resolution cache sit behind `parking_lot::RwLock`, so
//! a store can be shared between threads and filled lazily during
//! validation.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use conform_core::{PointerResolver, ResolutionError, RetrieveError, UriResolver};
use parking_lot::RwLock;
use serde_json::{Map, Value};
use tracing::{debug, trace};

use crate::draft::{embedded_meta_schema, RefSiblings};
use crate::error::ValidateError;
use crate::retriever::{NoRetriever, SchemaRetriever};

/// Default bound on `$ref` hops without the document position advancing.
pub const DEFAULT_MAX_REF_CHAIN: usize = 1000;

/// Keywords whose values are data, never schemas.
const LITERAL_KEYWORDS: &[&str] = &["enum", "const", "default", "examples"];

/// Keywords whose values map names to schemas.
const SCHEMA_MAP_KEYWORDS: &[&str] = &["properties", "patternProperties", "definitions", "dependencies"];

/// Cache of schema documents keyed by normalized absolute URI.
pub struct SchemaStore {
    retriever: Arc<dyn SchemaRetriever>,
    schemas: RwLock<HashMap<String, Arc<Value>>>,
    /// Embedded document key to the key of the document it was found in.
    owners: RwLock<HashMap<String, String>>,
    resolved: RwLock<HashMap<(String, RefSiblings), Arc<Value>>>,
    max_ref_chain: usize,
}

impl fmt::Debug for SchemaStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaStore")
            .field("schemas", &self.schemas.read().len())
            .field("resolved", &self.resolved.read().len())
            .field("max_ref_chain", &self.max_ref_chain)
            .finish()
    }
}

impl Default for SchemaStore {
    fn default() -> Self {
        Self::new(Arc::new(NoRetriever))
    }
}

impl SchemaStore {
    /// An empty store that fetches unknown documents from `retriever`.
    pub fn new(retriever: Arc<dyn SchemaRetriever>) -> Self {
        Self {
            retriever,
            schemas: RwLock::new(HashMap::new()),
            owners: RwLock::new(HashMap::new()),
            resolved: RwLock::new(HashMap::new()),
            max_ref_chain: DEFAULT_MAX_REF_CHAIN,
        }
    }

    /// Set the bound on alias-chain length.
    pub fn with_max_ref_chain(mut self, limit: usize) -> Self {
        self.max_ref_chain = limit.max(1);
        self
    }

    /// The configured alias-chain bound.
    pub fn max_ref_chain(&self) -> usize {
        self.max_ref_chain
    }

    /// Store key for `id`: absolute, normalized, without fragment.
    ///
    /// # Errors
    ///
    /// `ResolutionError::InvalidUri` if `id` cannot be made absolute.
    pub fn key_for(id: &str) -> Result<String, ResolutionError> {
        let absolute = UriResolver::resolve(id, "")?;
        let (document, _) = UriResolver::split_fragment(&absolute);
        Ok(document.to_string())
    }

    /// Register `schema` under `id`, or retrieve it when `schema` is `None`.
    ///
    /// Re-adding an id replaces the stored document, together with the
    /// embedded documents it registered, and clears every cached resolution.
    /// An embedded id never overrides a document registered on its own or
    /// one embedded by another document.
    ///
    /// # Errors
    ///
    /// `ResolutionError::Retrieval` when the document must be fetched and the
    /// retriever fails; `InvalidUri` for ids or `$ref` values that cannot be
    /// resolved.
    pub fn add_schema(&self, id: &str, schema: Option<Value>) -> Result<Arc<Value>, ResolutionError> {
        let key = Self::key_for(id)?;
        let mut document = match schema {
            Some(schema) => schema,
            None => self.fetch(&key)?,
        };

        let mut embedded = Vec::new();
        rewrite_refs(&mut document, &key, &key, &mut embedded)?;

        let document = Arc::new(document);
        {
            let mut schemas = self.schemas.write();
            let mut owners = self.owners.write();
            // Drop what the previous version of this document embedded.
            owners.retain(|embedded_key, owner| {
                if *owner == key {
                    schemas.remove(embedded_key);
                    false
                } else {
                    true
                }
            });
            for (embedded_key, subschema) in embedded.drain(..) {
                let standalone = schemas.contains_key(&embedded_key) && !owners.contains_key(&embedded_key);
                let foreign = owners.get(&embedded_key).is_some_and(|owner| *owner != key);
                if standalone || foreign {
                    continue;
                }
                schemas.insert(embedded_key.clone(), Arc::new(subschema));
                owners.insert(embedded_key, key.clone());
            }
            owners.remove(&key);
            schemas.insert(key.clone(), Arc::clone(&document));
        }
        self.resolved.write().clear();
        debug!(id = %key, "registered schema document");
        Ok(document)
    }

    /// Stored document for `id`, retrieving and registering it on a miss.
    ///
    /// # Errors
    ///
    /// As for [`SchemaStore::add_schema`].
    pub fn get_schema(&self, id: &str) -> Result<Arc<Value>, ResolutionError> {
        let key = Self::key_for(id)?;
        if let Some(found) = self.schemas.read().get(&key) {
            return Ok(Arc::clone(found));
        }
        self.add_schema(&key, None)
    }

    /// Whether a document is stored under `id`.
    pub fn contains(&self, id: &str) -> bool {
        Self::key_for(id).is_ok_and(|key| self.schemas.read().contains_key(&key))
    }

    /// Number of stored documents.
    pub fn len(&self) -> usize {
        self.schemas.read().len()
    }

    /// Whether no document is stored.
    pub fn is_empty(&self) -> bool {
        self.schemas.read().is_empty()
    }

    /// Keys of all stored documents, sorted.
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.schemas.read().keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Resolve an absolute `uri#/pointer` reference to a schema node.
    ///
    /// A target that is itself a `$ref` is followed; the sibling keywords met
    /// along the way are composed with the final target according to
    /// `policy`. Results are cached per `(reference, policy)`.
    ///
    /// # Errors
    ///
    /// - `ResolutionError::UnresolvableJsonPointer` when a fragment does not
    ///   address a node of its document.
    /// - `ResolutionError::Retrieval` when a document cannot be fetched.
    /// - `ValidateError::RefCycle` when an alias chain exceeds the bound.
    pub fn resolve_ref(&self, reference: &str, policy: RefSiblings) -> Result<Arc<Value>, ValidateError> {
        let cache_key = (reference.to_string(), policy);
        if let Some(hit) = self.resolved.read().get(&cache_key) {
            return Ok(Arc::clone(hit));
        }

        let mut current = reference.to_string();
        let mut siblings: Vec<Map<String, Value>> = Vec::new();
        let mut hops = 0usize;
        let target = loop {
            hops += 1;
            if hops > self.max_ref_chain {
                return Err(ValidateError::RefCycle {
                    reference: reference.to_string(),
                    limit: self.max_ref_chain,
                });
            }
            let node = self.lookup(&current)?;
            let next = match &node {
                Value::Object(map) => map.get("$ref").and_then(Value::as_str).map(str::to_string),
                _ => None,
            };
            match (next, node) {
                (Some(next), Value::Object(mut map)) => {
                    trace!(from = %current, to = %next, "following $ref alias");
                    map.remove("$ref");
                    siblings.push(map);
                    current = next;
                }
                (_, node) => break node,
            }
        };

        let composed = siblings
            .into_iter()
            .rev()
            .fold(target, |acc, local| compose(acc, local, policy));
        let composed = Arc::new(composed);
        self.resolved
            .write()
            .insert(cache_key, Arc::clone(&composed));
        trace!(reference, hops, "resolved $ref");
        Ok(composed)
    }

    /// Clone of the node addressed by an absolute reference.
    fn lookup(&self, reference: &str) -> Result<Value, ResolutionError> {
        let (document_uri, fragment) = UriResolver::split_fragment(reference);
        let document = self.get_schema(document_uri)?;
        let filename = Self::key_for(document_uri)?;
        PointerResolver::get_fragment(&document, fragment, Some(&filename))
            .cloned()
            .map_err(|_| ResolutionError::UnresolvableJsonPointer {
                filename,
                fragment: fragment.to_string(),
            })
    }

    fn fetch(&self, key: &str) -> Result<Value, ResolutionError> {
        if let Some(source) = embedded_meta_schema(key) {
            return serde_json::from_str(source).map_err(|e| {
                ResolutionError::retrieval(
                    key,
                    RetrieveError::Parse {
                        uri: key.to_string(),
                        reason: e.to_string(),
                    },
                )
            });
        }
        debug!(uri = %key, "retrieving schema document");
        self.retriever
            .retrieve(key)
            .map_err(|source| ResolutionError::retrieval(key, source))
    }
}

/// Compose a resolved target with the sibling keywords of the `$ref` that
/// pointed at it. Local keywords win.
pub fn compose(target: Value, siblings: Map<String, Value>, policy: RefSiblings) -> Value {
    if policy == RefSiblings::Ignore || siblings.is_empty() {
        return target;
    }
    match target {
        Value::Bool(false) => Value::Bool(false),
        Value::Object(mut map) => {
            map.extend(siblings);
            Value::Object(map)
        }
        _ => Value::Object(siblings),
    }
}

/// Rewrite every `$ref` below `node` to absolute form and collect embedded
/// documents. `base` is the current resolution base, `document` the key of
/// the document currently being walked.
fn rewrite_refs(
    node: &mut Value,
    base: &str,
    document: &str,
    embedded: &mut Vec<(String, Value)>,
) -> Result<(), ResolutionError> {
    match node {
        Value::Object(map) => {
            if let Some(Value::String(reference)) = map.get_mut("$ref") {
                *reference = UriResolver::resolve(reference, base)?;
            }
            let declared = ["$id", "id"]
                .iter()
                .find_map(|k| map.get(*k).and_then(Value::as_str))
                .map(str::to_string);
            let own_base = match &declared {
                Some(id) => UriResolver::resolve(id, base)?,
                None => base.to_string(),
            };
            let own_document = match &declared {
                Some(_) => UriResolver::split_fragment(&own_base).0.to_string(),
                None => document.to_string(),
            };

            for (keyword, child) in map.iter_mut() {
                if keyword == "$ref" || LITERAL_KEYWORDS.contains(&keyword.as_str()) {
                    continue;
                }
                if SCHEMA_MAP_KEYWORDS.contains(&keyword.as_str()) {
                    if let Value::Object(members) = child {
                        for member in members.values_mut() {
                            rewrite_refs(member, &own_base, &own_document, embedded)?;
                        }
                        continue;
                    }
                }
                rewrite_refs(child, &own_base, &own_document, embedded)?;
            }

            if own_document != document {
                embedded.push((own_document, Value::Object(map.clone())));
            }
        }
        Value::Array(items) => {
            for item in items {
                rewrite_refs(item, base, document, embedded)?;
            }
        }
        _ => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retriever::InMemoryRetriever;
    use serde_json::json;

    fn store_with(docs: &[(&str, Value)]) -> (SchemaStore, Arc<InMemoryRetriever>) {
        let mut retriever = InMemoryRetriever::new();
        for (uri, doc) in docs {
            retriever.insert(*uri, doc.clone());
        }
        let retriever = Arc::new(retriever);
        (SchemaStore::new(retriever.clone()), retriever)
    }

    #[test]
    fn refs_are_rewritten_to_absolute_form() {
        let store = SchemaStore::default();
        let doc = store
            .add_schema(
                "http://example.com/root.json",
                Some(json!({
                    "properties": {
                        "a": {"$ref": "#/definitions/a"},
                        "b": {"$ref": "other.json#/x"}
                    },
                    "definitions": {"a": {"type": "string"}}
                })),
            )
            .unwrap();
        assert_eq!(
            doc["properties"]["a"]["$ref"],
            "http://example.com/root.json#/definitions/a"
        );
        assert_eq!(
            doc["properties"]["b"]["$ref"],
            "http://example.com/other.json#/x"
        );
    }

    #[test]
    fn literal_positions_are_not_rewritten() {
        let store = SchemaStore::default();
        let doc = store
            .add_schema(
                "http://example.com/root.json",
                Some(json!({
                    "enum": [{"$ref": "#/x"}],
                    "default": {"$ref": "#/y"},
                    "properties": {"default": {"$ref": "#/z"}}
                })),
            )
            .unwrap();
        assert_eq!(doc["enum"][0]["$ref"], "#/x");
        assert_eq!(doc["default"]["$ref"], "#/y");
        assert_eq!(
            doc["properties"]["default"]["$ref"],
            "http://example.com/root.json#/z"
        );
    }

    #[test]
    fn nested_id_changes_base_and_registers_embedded_document() {
        let store = SchemaStore::default();
        store
            .add_schema(
                "http://example.com/root.json",
                Some(json!({
                    "definitions": {
                        "inner": {
                            "id": "http://example.com/nested/inner.json",
                            "properties": {"x": {"$ref": "leaf.json"}}
                        }
                    }
                })),
            )
            .unwrap();
        assert!(store.contains("http://example.com/nested/inner.json"));
        let inner = store.get_schema("http://example.com/nested/inner.json").unwrap();
        assert_eq!(
            inner["properties"]["x"]["$ref"],
            "http://example.com/nested/leaf.json"
        );
    }

    #[test]
    fn documents_are_retrieved_once() {
        let (store, retriever) = store_with(&[("http://example.com/a.json", json!({"type": "string"}))]);
        store.get_schema("http://example.com/a.json").unwrap();
        store.get_schema("http://example.com/a.json#").unwrap();
        assert_eq!(retriever.retrieval_count("http://example.com/a.json"), 1);
    }

    #[test]
    fn meta_schemas_do_not_touch_the_retriever() {
        let (store, retriever) = store_with(&[]);
        let meta = store
            .get_schema("http://json-schema.org/draft-04/schema#")
            .unwrap();
        assert_eq!(meta["description"], "Core schema meta-schema");
        assert_eq!(
            retriever.retrieval_count("http://json-schema.org/draft-04/schema"),
            0
        );
    }

    #[test]
    fn missing_fragment_is_unresolvable_pointer() {
        let store = SchemaStore::default();
        store
            .add_schema("http://example.com/root.json", Some(json!({"definitions": {}})))
            .unwrap();
        let err = store
            .resolve_ref("http://example.com/root.json#/definitions/nope", RefSiblings::Merge)
            .unwrap_err();
        match err {
            ValidateError::Resolution(ResolutionError::UnresolvableJsonPointer { filename, fragment }) => {
                assert_eq!(filename, "http://example.com/root.json");
                assert_eq!(fragment, "/definitions/nope");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unknown_document_is_retrieval_error() {
        let store = SchemaStore::default();
        let err = store
            .resolve_ref("http://example.com/missing.json#", RefSiblings::Merge)
            .unwrap_err();
        assert!(matches!(
            err,
            ValidateError::Resolution(ResolutionError::Retrieval { .. })
        ));
    }

    #[test]
    fn alias_chain_merges_siblings_local_first() {
        let store = SchemaStore::default();
        store
            .add_schema(
                "http://example.com/root.json",
                Some(json!({
                    "definitions": {
                        "outer": {"$ref": "#/definitions/inner", "minimum": 5},
                        "inner": {"$ref": "#/definitions/base", "minimum": 1, "maximum": 10},
                        "base": {"type": "integer", "maximum": 100}
                    }
                })),
            )
            .unwrap();
        let merged = store
            .resolve_ref("http://example.com/root.json#/definitions/outer", RefSiblings::Merge)
            .unwrap();
        assert_eq!(*merged, json!({"type": "integer", "maximum": 10, "minimum": 5}));

        let ignored = store
            .resolve_ref("http://example.com/root.json#/definitions/outer", RefSiblings::Ignore)
            .unwrap();
        assert_eq!(*ignored, json!({"type": "integer", "maximum": 100}));
    }

    #[test]
    fn boolean_targets_compose() {
        let siblings = json!({"minimum": 1}).as_object().cloned().unwrap();
        assert_eq!(compose(json!(false), siblings.clone(), RefSiblings::Merge), json!(false));
        assert_eq!(compose(json!(true), siblings.clone(), RefSiblings::Merge), json!({"minimum": 1}));
        assert_eq!(compose(json!(true), siblings, RefSiblings::Ignore), json!(true));
    }

    #[test]
    fn self_alias_is_a_ref_cycle() {
        let store = SchemaStore::default().with_max_ref_chain(16);
        store
            .add_schema(
                "http://example.com/root.json",
                Some(json!({"definitions": {"a": {"$ref": "#/definitions/b"}, "b": {"$ref": "#/definitions/a"}}})),
            )
            .unwrap();
        let err = store
            .resolve_ref("http://example.com/root.json#/definitions/a", RefSiblings::Ignore)
            .unwrap_err();
        assert!(matches!(err, ValidateError::RefCycle { limit: 16, .. }));
    }

    #[test]
    fn resolution_is_cached_and_idempotent() {
        let store = SchemaStore::default();
        store
            .add_schema("http://example.com/r.json", Some(json!({"definitions": {"a": {"type": "null"}}})))
            .unwrap();
        let first = store
            .resolve_ref("http://example.com/r.json#/definitions/a", RefSiblings::Merge)
            .unwrap();
        let second = store
            .resolve_ref("http://example.com/r.json#/definitions/a", RefSiblings::Merge)
            .unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn re_adding_a_document_replaces_its_embedded_documents() {
        let store = SchemaStore::default();
        let with_type = |t: &str| {
            json!({
                "definitions": {"x": {"id": "http://example.com/inner.json", "type": t}},
                "$ref": "http://example.com/inner.json"
            })
        };
        store
            .add_schema("http://example.com/root.json", Some(with_type("string")))
            .unwrap();
        assert_eq!(
            store.get_schema("http://example.com/inner.json").unwrap()["type"],
            "string"
        );
        store
            .add_schema("http://example.com/root.json", Some(with_type("integer")))
            .unwrap();
        assert_eq!(
            store.get_schema("http://example.com/inner.json").unwrap()["type"],
            "integer"
        );

        store
            .add_schema("http://example.com/root.json", Some(json!({"type": "null"})))
            .unwrap();
        assert!(!store.contains("http://example.com/inner.json"));
    }

    #[test]
    fn embedded_ids_do_not_override_standalone_documents() {
        let store = SchemaStore::default();
        store
            .add_schema("http://example.com/inner.json", Some(json!({"type": "boolean"})))
            .unwrap();
        store
            .add_schema(
                "http://example.com/root.json",
                Some(json!({"definitions": {"x": {"id": "http://example.com/inner.json", "type": "string"}}})),
            )
            .unwrap();
        assert_eq!(
            store.get_schema("http://example.com/inner.json").unwrap()["type"],
            "boolean"
        );
    }
}
