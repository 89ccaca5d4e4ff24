#![deny(missing_docs)]

//! # conform-schema — JSON Schema Constraint Engine
//!
//! Validates JSON documents against JSON Schema drafts 3, 4, 6 and 7, and
//! optionally coerces or completes them in place.
//!
//! ## Validation (`validator`)
//!
//! [`Validator`] is the entry point. A call registers the schema in the
//! [`SchemaStore`], resolves `$ref` targets on demand through a
//! [`SchemaRetriever`], and walks the document with an [`Evaluator`].
//! Violations are collected as [`ErrorRecord`]s carrying an RFC 6901
//! pointer, a message and the failing constraint with its parameters.
//!
//! ## Keywords (`registry`, `keywords`)
//!
//! Every keyword is a [`Keyword`] capability in a [`ConstraintRegistry`].
//! The built-ins cover the four drafts; callers may add, replace or remove
//! keywords before validating.
//!
//! ## Modes (`mode`)
//!
//! [`CheckMode`] flags select coercion, default application, fail-fast
//! behaviour, meta-schema validation and format checking per call.
//!
//! ## Crate Policy
//!
//! - Depends only on `conform-core` internally.
//! - Stored schema trees are never mutated after registration.
//! - Document invalidity is data, not an `Err`, unless `EXCEPTIONS` is set.
//! - No `unsafe` code.

pub mod bag;
pub mod coerce;
pub mod config;
mod defaults;
pub mod draft;
pub mod error;
pub mod evaluator;
pub mod format;
pub mod keywords;
pub mod mode;
pub mod registry;
pub mod retriever;
pub mod schema;
pub mod store;
pub mod validator;

pub use bag::{Checkpoint, ErrorBag};
pub use config::ValidatorConfig;
pub use draft::{Draft, RefSiblings};
pub use error::{ConfigurationError, Constraint, ErrorContext, ErrorList, ErrorRecord, ValidateError};
pub use evaluator::{Branch, Environment, Evaluator};
pub use format::{AnyFormat, CompiledPattern, FormatChecker, RegexCache};
pub use mode::CheckMode;
pub use registry::{ConstraintRegistry, Keyword};
pub use retriever::{FileRetriever, InMemoryRetriever, NoRetriever, SchemaRetriever};
pub use schema::{KeywordMap, SchemaNode};
pub use store::SchemaStore;
pub use validator::Validator;
