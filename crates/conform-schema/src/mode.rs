//! # Check Modes
//!
//! A `CheckMode` is fixed once per top-level `validate()` call and threaded
//! read-only through the whole evaluation. Each flag changes one aspect of
//! evaluator behaviour; keywords consult the flags instead of existing in
//! several variants.
//!
//! | Flag | Effect |
//! |---|---|
//! | `NORMAL` | Plain validation. |
//! | `TYPE_CAST` | `[]` satisfies `"object"` and `{}` satisfies `"array"`. |
//! | `COERCE_TYPES` | Lossless scalar conversion in place before a `type` error. |
//! | `EARLY_COERCE` | Coerce to the first convertible type of a union. |
//! | `APPLY_DEFAULTS` | Splice deep copies of `default` values into missing slots. |
//! | `ONLY_REQUIRED_DEFAULTS` | Restrict `APPLY_DEFAULTS` to required properties. |
//! | `EXCEPTIONS` | The first committed error aborts the call. |
//! | `DISABLE_FORMAT` | Skip `format`. |
//! | `VALIDATE_SCHEMA` | Validate the schema against its meta-schema first. |

use bitflags::bitflags;

bitflags! {
    /// Evaluator behaviour flags for one validation call.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CheckMode: u32 {
        /// Plain validation.
        const NORMAL = 1 << 0;
        /// `[]` satisfies `"object"` and `{}` satisfies `"array"`.
        const TYPE_CAST = 1 << 1;
        /// Convert scalars in place before reporting a `type` error.
        const COERCE_TYPES = 1 << 2;
        /// Splice copies of `default` values into missing slots.
        const APPLY_DEFAULTS = 1 << 3;
        /// Fail the call on the first committed error.
        const EXCEPTIONS = 1 << 4;
        /// Skip `format`.
        const DISABLE_FORMAT = 1 << 5;
        /// Apply property defaults only to required properties.
        const ONLY_REQUIRED_DEFAULTS = 1 << 7;
        /// Check the schema against its meta-schema first.
        const VALIDATE_SCHEMA = 1 << 8;
        /// Coerce to the first convertible type of a union.
        const EARLY_COERCE = 1 << 9;
    }
}

impl Default for CheckMode {
    fn default() -> Self {
        CheckMode::NORMAL
    }
}

impl CheckMode {
    /// Whether the evaluator may write into the caller's document.
    pub fn mutates_document(self) -> bool {
        self.intersects(CheckMode::COERCE_TYPES | CheckMode::APPLY_DEFAULTS)
    }

    /// Flags safe to use when the *schema* is the instance being validated.
    /// Self-validation never rewrites the schema tree.
    pub fn for_self_validation(self) -> Self {
        (self & (CheckMode::EXCEPTIONS | CheckMode::DISABLE_FORMAT)) | CheckMode::NORMAL
    }

    /// Parse a flag by its snake_case name, as used in configuration files.
    pub fn from_config_name(name: &str) -> Option<Self> {
        let flag = match name {
            "normal" => CheckMode::NORMAL,
            "type_cast" => CheckMode::TYPE_CAST,
            "coerce_types" => CheckMode::COERCE_TYPES,
            "apply_defaults" => CheckMode::APPLY_DEFAULTS,
            "exceptions" => CheckMode::EXCEPTIONS,
            "disable_format" => CheckMode::DISABLE_FORMAT,
            "only_required_defaults" => CheckMode::ONLY_REQUIRED_DEFAULTS,
            "validate_schema" => CheckMode::VALIDATE_SCHEMA,
            "early_coerce" => CheckMode::EARLY_COERCE,
            _ => return None,
        };
        Some(flag)
    }
}
