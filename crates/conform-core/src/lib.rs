#![deny(missing_docs)]

//! # conform-core — Foundational Types for conform
//!
//! The leaf crate of the conform workspace. It defines the addressing and
//! comparison primitives every other crate builds on, and depends on nothing
//! internal.
//!
//! ## Key Design Principles
//!
//! 1. **Pointers are token lists, not strings.** `JsonPointer` stores decoded
//!    tokens and escapes them one at a time on render, so escaping can never
//!    be applied twice.
//!
//! 2. **One normal form for URIs.** `UriResolver::resolve` and
//!    `UriResolver::normalize` produce the exact strings used as schema store
//!    keys, so an absolute `$ref` and a store key compare as plain strings.
//!
//! 3. **One definition of equality.** `value::json_equal` implements JSON
//!    Schema equality (mathematical numbers, unordered objects, ordered
//!    arrays) for `enum`, `const` and `uniqueItems` alike.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `conform-*` crates (this is the leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod error;
pub mod pointer;
pub mod uri;
pub mod value;

// Re-export primary types for ergonomic imports.
pub use error::{ResolutionError, RetrieveError};
pub use pointer::{decode_token, encode_token, JsonPointer, PointerResolver};
pub use uri::{UriParts, UriResolver};
pub use value::{json_equal, Kind, KindSet};
