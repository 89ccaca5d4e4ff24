//! # Validator Configuration
//!
//! Settings that stay fixed for the lifetime of a [`Validator`](crate::Validator),
//! loadable from YAML or JSON:
//!
//! ```yaml
//! default_draft: draft7
//! max_ref_chain: 200
//! max_depth: 128
//! ref_siblings: merge
//! default_mode: [coerce_types, apply_defaults]
//! ```
//!
//! Every field is optional; unknown fields are rejected.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::draft::{Draft, RefSiblings};
use crate::error::ConfigurationError;
use crate::evaluator::DEFAULT_MAX_DEPTH;
use crate::mode::CheckMode;
use crate::store::DEFAULT_MAX_REF_CHAIN;

/// Validator-wide settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "snake_case")]
pub struct ValidatorConfig {
    /// Draft assumed when a schema has no recognisable `$schema`.
    pub default_draft: Draft,
    /// Bound on `$ref` hops that do not advance the document.
    pub max_ref_chain: usize,
    /// Deepest document nesting evaluated before the call fails.
    pub max_depth: usize,
    /// Overrides the per-draft treatment of keywords next to `$ref`.
    pub ref_siblings: Option<RefSiblings>,
    /// Mode flag names used by [`Validator::check`](crate::Validator::check).
    pub default_mode: Vec<String>,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            default_draft: Draft::default(),
            max_ref_chain: DEFAULT_MAX_REF_CHAIN,
            max_depth: DEFAULT_MAX_DEPTH,
            ref_siblings: None,
            default_mode: Vec::new(),
        }
    }
}

impl ValidatorConfig {
    /// Parse a YAML configuration document.
    pub fn from_yaml_str(source: &str) -> Result<Self, ConfigurationError> {
        let config: Self =
            serde_yaml::from_str(source).map_err(|e| ConfigurationError::Config(e.to_string()))?;
        config.validated()
    }

    /// Interpret an already-parsed JSON value as a configuration.
    pub fn from_json_value(value: Value) -> Result<Self, ConfigurationError> {
        let config: Self =
            serde_json::from_value(value).map_err(|e| ConfigurationError::Config(e.to_string()))?;
        config.validated()
    }

    /// The union of the `default_mode` flags; `NORMAL` when the list is empty.
    pub fn mode(&self) -> Result<CheckMode, ConfigurationError> {
        self.default_mode
            .iter()
            .try_fold(CheckMode::NORMAL, |mode, name| {
                CheckMode::from_config_name(name)
                    .map(|flag| mode | flag)
                    .ok_or_else(|| ConfigurationError::Config(format!("unknown check mode '{name}'")))
            })
    }

    fn validated(self) -> Result<Self, ConfigurationError> {
        if self.max_ref_chain == 0 {
            return Err(ConfigurationError::Config(
                "max_ref_chain must be at least 1".to_string(),
            ));
        }
        if self.max_depth == 0 {
            return Err(ConfigurationError::Config(
                "max_depth must be at least 1".to_string(),
            ));
        }
        self.mode()?;
        Ok(self)
    }
}
