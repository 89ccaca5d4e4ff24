//! # Schema Retrieval
//!
//! The schema store asks a [`SchemaRetriever`] for every document it does
//! not hold yet. Retrieval is synchronous and may block; the store calls it
//! at most once per document.
//!
//! Network access is not provided here. Callers that need remote schemas
//! implement the trait over their own HTTP client.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use conform_core::RetrieveError;
use parking_lot::Mutex;
use serde_json::Value;
use url::Url;

/// Source of schema documents by absolute URI.
pub trait SchemaRetriever: Send + Sync {
    /// Fetch and parse the document at `uri` (no fragment).
    ///
    /// # Errors
    ///
    /// `RetrieveError::NotFound` when nothing exists at `uri`; `Network`,
    /// `Parse` or `Io` for transport and decoding failures.
    fn retrieve(&self, uri: &str) -> Result<Value, RetrieveError>;
}

/// Retriever that knows no documents. Every lookup is `NotFound`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRetriever;

impl SchemaRetriever for NoRetriever {
    fn retrieve(&self, uri: &str) -> Result<Value, RetrieveError> {
        Err(RetrieveError::NotFound {
            uri: uri.to_string(),
        })
    }
}

/// Retriever over a fixed map of documents, with a per-URI retrieval count.
#[derive(Debug, Default)]
pub struct InMemoryRetriever {
    documents: HashMap<String, Value>,
    hits: Mutex<HashMap<String, usize>>,
}

impl InMemoryRetriever {
    /// An empty fixture set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `document` under `uri`. A trailing `#` is ignored.
    pub fn insert(&mut self, uri: impl Into<String>, document: Value) {
        let uri = uri.into();
        let key = uri.strip_suffix('#').map(str::to_string).unwrap_or(uri);
        self.documents.insert(key, document);
    }

    /// Builder form of [`InMemoryRetriever::insert`].
    pub fn with(mut self, uri: impl Into<String>, document: Value) -> Self {
        self.insert(uri, document);
        self
    }

    /// How many times `uri` has been retrieved.
    pub fn retrieval_count(&self, uri: &str) -> usize {
        self.hits.lock().get(uri).copied().unwrap_or(0)
    }
}

impl SchemaRetriever for InMemoryRetriever {
    fn retrieve(&self, uri: &str) -> Result<Value, RetrieveError> {
        *self.hits.lock().entry(uri.to_string()).or_insert(0) += 1;
        self.documents
            .get(uri)
            .cloned()
            .ok_or_else(|| RetrieveError::NotFound {
                uri: uri.to_string(),
            })
    }
}

/// Retriever for `file://` URIs. `.yaml`/`.yml` files are read as YAML,
/// everything else as JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileRetriever;

impl FileRetriever {
    fn path_of(uri: &str) -> Result<PathBuf, RetrieveError> {
        let not_found = || RetrieveError::NotFound {
            uri: uri.to_string(),
        };
        let url = Url::parse(uri).map_err(|_| not_found())?;
        if url.scheme() != "file" {
            return Err(not_found());
        }
        url.to_file_path().map_err(|()| not_found())
    }
}

impl SchemaRetriever for FileRetriever {
    fn retrieve(&self, uri: &str) -> Result<Value, RetrieveError> {
        let path = Self::path_of(uri)?;
        let content = std::fs::read_to_string(&path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => RetrieveError::NotFound {
                uri: uri.to_string(),
            },
            _ => RetrieveError::Io(e),
        })?;
        parse_document(uri, &path, &content)
    }
}

fn parse_document(uri: &str, path: &Path, content: &str) -> Result<Value, RetrieveError> {
    let parse_err = |reason: String| RetrieveError::Parse {
        uri: uri.to_string(),
        reason,
    };
    let is_yaml = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"));
    if is_yaml {
        let yaml: serde_yaml::Value =
            serde_yaml::from_str(content).map_err(|e| parse_err(e.to_string()))?;
        yaml_to_json_value(&yaml).map_err(parse_err)
    } else {
        serde_json::from_str(content).map_err(|e| parse_err(e.to_string()))
    }
}

/// Convert a `serde_yaml::Value` into the equivalent JSON tree.
///
/// Tags are dropped; non-string scalar keys are stringified.
pub(crate) fn yaml_to_json_value(yaml: &serde_yaml::Value) -> Result<Value, String> {
    match yaml {
        serde_yaml::Value::Null => Ok(Value::Null),
        serde_yaml::Value::Bool(b) => Ok(Value::Bool(*b)),
        serde_yaml::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Value::Number(i.into()))
            } else if let Some(u) = n.as_u64() {
                Ok(Value::Number(u.into()))
            } else if let Some(f) = n.as_f64() {
                serde_json::Number::from_f64(f)
                    .map(Value::Number)
                    .ok_or_else(|| format!("cannot represent float {f} in JSON"))
            } else {
                Err(format!("unsupported YAML number: {n:?}"))
            }
        }
        serde_yaml::Value::String(s) => Ok(Value::String(s.clone())),
        serde_yaml::Value::Sequence(seq) => seq
            .iter()
            .map(yaml_to_json_value)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        serde_yaml::Value::Mapping(map) => {
            let mut out = serde_json::Map::new();
            for (k, v) in map {
                let key = match k {
                    serde_yaml::Value::String(s) => s.clone(),
                    serde_yaml::Value::Number(n) => n.to_string(),
                    serde_yaml::Value::Bool(b) => b.to_string(),
                    other => return Err(format!("unsupported YAML map key: {other:?}")),
                };
                out.insert(key, yaml_to_json_value(v)?);
            }
            Ok(Value::Object(out))
        }
        serde_yaml::Value::Tagged(tagged) => yaml_to_json_value(&tagged.value),
    }
}
