//! # JSON Pointer (RFC 6901)
//!
//! `JsonPointer` is an immutable sequence of *decoded* reference tokens plus
//! an optional id of the document it points into. `PointerResolver` follows a
//! pointer through a `serde_json::Value` tree.
//!
//! ## Escaping Invariant
//!
//! Tokens are stored decoded and escaped only when rendered, one token at a
//! time: `~` → `~0` first, then `/` → `~1`. Decoding reverses the order
//! (`~1` → `/`, then `~0` → `~`). Working token-wise means a literal `~1`
//! inside a property name can never be double-substituted, so
//! `decode_token(&encode_token(t)) == t` for every string `t`.
//!
//! ## Array Tokens
//!
//! An array is indexed by a strict decimal token (`0`, `12`; no sign, no
//! leading zeros) or by `-`, which addresses the last element.

use std::fmt;

use percent_encoding::percent_decode_str;
use serde_json::Value;

use crate::error::ResolutionError;

/// Escape one reference token for inclusion in a pointer string.
pub fn encode_token(token: &str) -> String {
    token.replace('~', "~0").replace('/', "~1")
}

/// Unescape one reference token taken from a pointer string.
pub fn decode_token(token: &str) -> String {
    token.replace("~1", "/").replace("~0", "~")
}

/// An immutable RFC 6901 JSON Pointer with an optional document id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct JsonPointer {
    document: Option<String>,
    tokens: Vec<String>,
}

impl JsonPointer {
    /// The pointer to the root of an anonymous document.
    pub fn root() -> Self {
        Self::default()
    }

    /// The pointer to the root of the document identified by `document`.
    pub fn with_document(document: impl Into<String>) -> Self {
        Self {
            document: Some(document.into()),
            tokens: Vec::new(),
        }
    }

    /// Build a pointer from already-decoded tokens.
    pub fn from_tokens<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            document: None,
            tokens: tokens.into_iter().map(Into::into).collect(),
        }
    }

    /// Parse `"[document]#/a/b"` or a bare `"/a/b"` fragment.
    ///
    /// Each token is percent-decoded and then unescaped.
    ///
    /// # Errors
    ///
    /// Returns `ResolutionError::InvalidUri` if the fragment is non-empty and
    /// does not start with `/`.
    pub fn parse(input: &str) -> Result<Self, ResolutionError> {
        let (document, fragment) = match input.split_once('#') {
            Some((doc, frag)) => ((!doc.is_empty()).then(|| doc.to_string()), frag),
            None if input.is_empty() || input.starts_with('/') => (None, input),
            None => (Some(input.to_string()), ""),
        };
        let tokens = parse_fragment(fragment).ok_or_else(|| {
            ResolutionError::invalid_uri(input, "JSON pointer fragment must start with '/'")
        })?;
        Ok(Self { document, tokens })
    }

    /// A new pointer with `token` appended. `self` is unchanged.
    pub fn append(&self, token: impl Into<String>) -> Self {
        let mut tokens = Vec::with_capacity(self.tokens.len() + 1);
        tokens.extend(self.tokens.iter().cloned());
        tokens.push(token.into());
        Self {
            document: self.document.clone(),
            tokens,
        }
    }

    /// A new pointer with an array index appended.
    pub fn append_index(&self, index: usize) -> Self {
        self.append(index.to_string())
    }

    /// Decoded reference tokens.
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Id of the document this pointer addresses, if any.
    pub fn document(&self) -> Option<&str> {
        self.document.as_deref()
    }

    /// Whether this pointer addresses the document root.
    pub fn is_root(&self) -> bool {
        self.tokens.is_empty()
    }

    /// The encoded fragment, e.g. `/prop4/0/prop4-child`; empty for the root.
    pub fn to_fragment(&self) -> String {
        let mut out = String::new();
        for token in &self.tokens {
            out.push('/');
            out.push_str(&encode_token(token));
        }
        out
    }

    /// Dotted property path, e.g. `prop4[0].prop4-child`; empty for the root.
    pub fn property_path(&self) -> String {
        let mut out = String::new();
        for token in &self.tokens {
            if is_array_index(token) {
                out.push('[');
                out.push_str(token);
                out.push(']');
            } else {
                if !out.is_empty() {
                    out.push('.');
                }
                out.push_str(token);
            }
        }
        out
    }
}

impl fmt::Display for JsonPointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.document {
            Some(doc) => write!(f, "{doc}#{}", self.to_fragment()),
            None => f.write_str(&self.to_fragment()),
        }
    }
}

/// Split an encoded fragment into decoded tokens. `None` if malformed.
fn parse_fragment(fragment: &str) -> Option<Vec<String>> {
    if fragment.is_empty() {
        return Some(Vec::new());
    }
    let rest = fragment.strip_prefix('/')?;
    Some(
        rest.split('/')
            .map(|raw| decode_token(&percent_decode_str(raw).decode_utf8_lossy()))
            .collect(),
    )
}

fn is_array_index(token: &str) -> bool {
    !token.is_empty()
        && token.bytes().all(|b| b.is_ascii_digit())
        && (token == "0" || !token.starts_with('0'))
}

fn array_position(token: &str, len: usize) -> Option<usize> {
    if token == "-" {
        return len.checked_sub(1);
    }
    if !is_array_index(token) {
        return None;
    }
    token.parse::<usize>().ok().filter(|i| *i < len)
}

/// Follows JSON Pointers through value trees.
#[derive(Debug, Clone, Copy, Default)]
pub struct PointerResolver;

impl PointerResolver {
    /// Resolve `pointer` against `root`.
    ///
    /// # Errors
    ///
    /// Returns `ResolutionError::ResourceNotFound` carrying the pointer and
    /// the pointer's document id when the target does not exist.
    pub fn get<'v>(root: &'v Value, pointer: &JsonPointer) -> Result<&'v Value, ResolutionError> {
        let mut current = root;
        for token in pointer.tokens() {
            let next = match current {
                Value::Object(map) => map.get(token.as_str()),
                Value::Array(items) => array_position(token, items.len()).map(|i| &items[i]),
                _ => None,
            };
            current = next.ok_or_else(|| not_found(pointer))?;
        }
        Ok(current)
    }

    /// Mutable variant of [`PointerResolver::get`].
    pub fn get_mut<'v>(
        root: &'v mut Value,
        pointer: &JsonPointer,
    ) -> Result<&'v mut Value, ResolutionError> {
        let mut current = root;
        for token in pointer.tokens() {
            let next = match current {
                Value::Object(map) => map.get_mut(token.as_str()),
                Value::Array(items) => {
                    let len = items.len();
                    array_position(token, len).map(move |i| &mut items[i])
                }
                _ => None,
            };
            current = next.ok_or_else(|| not_found(pointer))?;
        }
        Ok(current)
    }

    /// Resolve a raw encoded fragment (`""`, `"/a/b"`) against `root`.
    ///
    /// `document` is only used to enrich the error.
    pub fn get_fragment<'v>(
        root: &'v Value,
        fragment: &str,
        document: Option<&str>,
    ) -> Result<&'v Value, ResolutionError> {
        let tokens = parse_fragment(fragment).ok_or_else(|| ResolutionError::ResourceNotFound {
            pointer: fragment.to_string(),
            document: document.map(str::to_string),
        })?;
        let pointer = JsonPointer {
            document: document.map(str::to_string),
            tokens,
        };
        Self::get(root, &pointer)
    }
}

fn not_found(pointer: &JsonPointer) -> ResolutionError {
    ResolutionError::ResourceNotFound {
        pointer: pointer.to_fragment(),
        document: pointer.document.clone(),
    }
}
