//! # Drafts and Embedded Meta-Schemas
//!
//! Supported JSON Schema drafts, their canonical meta-schema URIs, and the
//! meta-schema documents themselves, compiled into the binary so that
//! `$schema` lookups and `VALIDATE_SCHEMA` work without a retriever.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// How keywords next to a `$ref` are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefSiblings {
    /// Siblings are merged over the resolved target; local keywords win.
    Merge,
    /// Siblings are dropped; only the target applies.
    Ignore,
}

/// A JSON Schema draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Draft {
    /// Draft 3 (`http://json-schema.org/draft-03/schema#`).
    #[serde(rename = "draft3")]
    Draft3,
    /// Draft 4, the default.
    #[serde(rename = "draft4")]
    Draft4,
    /// Draft 6.
    #[serde(rename = "draft6")]
    Draft6,
    /// Draft 7.
    #[serde(rename = "draft7")]
    Draft7,
}

const DRAFT3_META: &str = include_str!("../metaschemas/draft-03.json");
const DRAFT4_META: &str = include_str!("../metaschemas/draft-04.json");
const DRAFT6_META: &str = include_str!("../metaschemas/draft-06.json");
const DRAFT7_META: &str = include_str!("../metaschemas/draft-07.json");

impl Default for Draft {
    fn default() -> Self {
        Draft::Draft4
    }
}

impl Draft {
    /// Every supported draft, oldest first.
    pub const ALL: [Draft; 4] = [Draft::Draft3, Draft::Draft4, Draft::Draft6, Draft::Draft7];

    /// Canonical meta-schema URI, in store-key form (no fragment).
    pub fn uri(self) -> &'static str {
        match self {
            Draft::Draft3 => "http://json-schema.org/draft-03/schema",
            Draft::Draft4 => "http://json-schema.org/draft-04/schema",
            Draft::Draft6 => "http://json-schema.org/draft-06/schema",
            Draft::Draft7 => "http://json-schema.org/draft-07/schema",
        }
    }

    /// Detect the draft named by a `$schema` value.
    ///
    /// Accepts `http` and `https`, with or without the trailing `#`.
    pub fn from_uri(uri: &str) -> Option<Self> {
        let trimmed = uri.trim_end_matches('#');
        let rest = trimmed
            .strip_prefix("http://")
            .or_else(|| trimmed.strip_prefix("https://"))?;
        match rest {
            "json-schema.org/draft-03/schema" => Some(Draft::Draft3),
            "json-schema.org/draft-04/schema" => Some(Draft::Draft4),
            "json-schema.org/draft-06/schema" => Some(Draft::Draft6),
            "json-schema.org/draft-07/schema" => Some(Draft::Draft7),
            _ => None,
        }
    }

    /// Draft declared by a schema's `$schema` keyword, if recognised.
    pub fn detect(schema: &Value) -> Option<Self> {
        schema
            .get("$schema")
            .and_then(Value::as_str)
            .and_then(Self::from_uri)
    }

    /// Embedded meta-schema source text.
    pub fn meta_schema_source(self) -> &'static str {
        match self {
            Draft::Draft3 => DRAFT3_META,
            Draft::Draft4 => DRAFT4_META,
            Draft::Draft6 => DRAFT6_META,
            Draft::Draft7 => DRAFT7_META,
        }
    }

    /// Keyword that sets a new base URI inside a schema.
    pub fn id_keyword(self) -> &'static str {
        match self {
            Draft::Draft3 | Draft::Draft4 => "id",
            Draft::Draft6 | Draft::Draft7 => "$id",
        }
    }

    /// Default treatment of keywords next to `$ref`.
    pub fn ref_policy(self) -> RefSiblings {
        match self {
            Draft::Draft3 | Draft::Draft4 => RefSiblings::Merge,
            Draft::Draft6 | Draft::Draft7 => RefSiblings::Ignore,
        }
    }
}

/// The embedded meta-schema stored under `uri`, if any.
pub(crate) fn embedded_meta_schema(uri: &str) -> Option<&'static str> {
    Draft::ALL
        .into_iter()
        .find(|d| d.uri() == uri)
        .map(Draft::meta_schema_source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn detects_draft_from_schema_uri() {
        assert_eq!(
            Draft::from_uri("http://json-schema.org/draft-07/schema#"),
            Some(Draft::Draft7)
        );
        assert_eq!(
            Draft::from_uri("https://json-schema.org/draft-04/schema"),
            Some(Draft::Draft4)
        );
        assert_eq!(Draft::from_uri("http://example.com/schema"), None);
        assert_eq!(
            Draft::detect(&json!({"$schema": "http://json-schema.org/draft-03/schema#"})),
            Some(Draft::Draft3)
        );
    }

    #[test]
    fn embedded_meta_schemas_parse_and_self_identify() {
        for draft in Draft::ALL {
            let meta: Value = serde_json::from_str(draft.meta_schema_source()).unwrap();
            let id = meta
                .get(draft.id_keyword())
                .and_then(Value::as_str)
                .unwrap();
            assert_eq!(id.trim_end_matches('#'), draft.uri());
            assert_eq!(Draft::detect(&meta), Some(draft));
        }
    }

    #[test]
    fn ref_policy_by_draft() {
        assert_eq!(Draft::Draft4.ref_policy(), RefSiblings::Merge);
        assert_eq!(Draft::Draft7.ref_policy(), RefSiblings::Ignore);
        assert_eq!(Draft::default(), Draft::Draft4);
    }

    #[test]
    fn embedded_lookup_uses_store_key_form() {
        assert!(embedded_meta_schema("http://json-schema.org/draft-06/schema").is_some());
        assert!(embedded_meta_schema("http://json-schema.org/draft-06/schema#").is_none());
    }
}
