//! # Error Types — Reference Resolution
//!
//! Errors raised while locating schema documents and the nodes inside them.
//! All errors use `thiserror` for derive-based `Display` and `Error`
//! implementations.
//!
//! ## Design
//!
//! - A resolution error means the *schema* is broken (dangling `$ref`,
//!   unreachable document), never the document being validated. These errors
//!   are not recoverable and must not be folded into validation reports.
//! - Every variant carries the URI or pointer needed to find the broken
//!   reference without re-running the resolution.

use thiserror::Error;

/// Failure to resolve a schema document, a URI, or a pointer inside a document.
#[derive(Error, Debug)]
pub enum ResolutionError {
    /// A JSON Pointer did not address any node of the value tree.
    #[error("resource not found at pointer '{pointer}'{}", document_suffix(.document))]
    ResourceNotFound {
        /// The pointer that could not be followed, in `/a/b` form.
        pointer: String,
        /// Id of the document the pointer was resolved against, if known.
        document: Option<String>,
    },

    /// The fragment of a `$ref` did not resolve inside its target document.
    #[error("unresolvable JSON pointer '#{fragment}' in '{filename}'")]
    UnresolvableJsonPointer {
        /// Absolute URI of the document that was searched.
        filename: String,
        /// The fragment that failed to resolve.
        fragment: String,
    },

    /// The schema retriever could not provide a document.
    #[error("cannot retrieve schema '{uri}': {source}")]
    Retrieval {
        /// URI handed to the retriever.
        uri: String,
        /// Underlying retrieval failure.
        #[source]
        source: RetrieveError,
    },

    /// A URI could not be parsed or merged.
    #[error("invalid URI '{uri}': {reason}")]
    InvalidUri {
        /// The offending URI.
        uri: String,
        /// Reason the URI was rejected.
        reason: String,
    },
}

/// Failure reported by a schema retriever.
#[derive(Error, Debug)]
pub enum RetrieveError {
    /// No document exists at the URI.
    #[error("no schema document at '{uri}'")]
    NotFound {
        /// Requested URI.
        uri: String,
    },

    /// Transport-level failure while fetching.
    #[error("network error fetching '{uri}': {reason}")]
    Network {
        /// Requested URI.
        uri: String,
        /// Transport error description.
        reason: String,
    },

    /// The document was fetched but is not valid JSON (or YAML).
    #[error("cannot parse '{uri}': {reason}")]
    Parse {
        /// Requested URI.
        uri: String,
        /// Parser error description.
        reason: String,
    },

    /// IO error reading a local document.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ResolutionError {
    /// Wrap a retriever failure for `uri`.
    pub fn retrieval(uri: impl Into<String>, source: RetrieveError) -> Self {
        Self::Retrieval {
            uri: uri.into(),
            source,
        }
    }

    /// Build an `InvalidUri` error.
    pub fn invalid_uri(uri: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidUri {
            uri: uri.into(),
            reason: reason.into(),
        }
    }
}

fn document_suffix(document: &Option<String>) -> String {
    match document {
        Some(id) if !id.is_empty() => format!(" of document '{id}'"),
        _ => String::new(),
    }
}
