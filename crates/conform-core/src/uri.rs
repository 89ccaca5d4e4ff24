//! # URI Resolution (RFC 3986)
//!
//! Computes absolute schema ids from `$ref` values and `id`/`$id` base
//! changes. Resolution follows RFC 3986 §5.2: a reference that carries a
//! scheme is already absolute; otherwise its components are merged with the
//! base, dot segments are removed, and the reference keeps its own query and
//! fragment.
//!
//! ## Schemeless Bases
//!
//! Schemas are frequently registered under plain relative file names. A base
//! without a scheme (or an empty base) is first made absolute against the
//! current working directory as a `file://` URI, so `"schemas/a.json"` and a
//! `$ref` of `"b.json"` inside it both land on real `file://` locations.
//!
//! ## Normal Form
//!
//! Every absolute URI produced here goes through [`UriResolver::normalize`],
//! which canonicalises scheme-bearing URIs with the `url` crate (lowercase
//! scheme and host, resolved dot segments, percent-encoding). Store keys and
//! rewritten `$ref` values use the same normal form, so they compare equal
//! as plain strings.

use url::Url;

use crate::error::ResolutionError;

/// Components of a URI reference (RFC 3986 appendix B).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UriParts {
    /// Scheme without the trailing `:`.
    pub scheme: Option<String>,
    /// Authority without the leading `//`.
    pub authority: Option<String>,
    /// Path, possibly empty.
    pub path: String,
    /// Query without the leading `?`.
    pub query: Option<String>,
    /// Fragment without the leading `#`.
    pub fragment: Option<String>,
}

impl UriParts {
    /// Reassemble the components (RFC 3986 §5.3).
    pub fn recompose(&self) -> String {
        let mut out = String::new();
        if let Some(scheme) = &self.scheme {
            out.push_str(scheme);
            out.push(':');
        }
        if let Some(authority) = &self.authority {
            out.push_str("//");
            out.push_str(authority);
        }
        out.push_str(&self.path);
        if let Some(query) = &self.query {
            out.push('?');
            out.push_str(query);
        }
        if let Some(fragment) = &self.fragment {
            out.push('#');
            out.push_str(fragment);
        }
        out
    }
}

/// RFC 3986 reference resolution for schema ids.
#[derive(Debug, Clone, Copy, Default)]
pub struct UriResolver;

impl UriResolver {
    /// Split a URI reference into its components.
    pub fn parse(uri: &str) -> UriParts {
        let mut rest = uri;
        let mut parts = UriParts::default();

        if let Some(scheme) = scheme_of(rest) {
            parts.scheme = Some(scheme.to_string());
            rest = &rest[scheme.len() + 1..];
        }
        if let Some(after) = rest.strip_prefix("//") {
            let end = after.find(['/', '?', '#']).unwrap_or(after.len());
            parts.authority = Some(after[..end].to_string());
            rest = &after[end..];
        }
        if let Some(hash) = rest.find('#') {
            parts.fragment = Some(rest[hash + 1..].to_string());
            rest = &rest[..hash];
        }
        if let Some(question) = rest.find('?') {
            parts.query = Some(rest[question + 1..].to_string());
            rest = &rest[..question];
        }
        parts.path = rest.to_string();
        parts
    }

    /// Whether `uri` starts with a syntactically valid scheme.
    pub fn has_scheme(uri: &str) -> bool {
        scheme_of(uri).is_some()
    }

    /// Split at the first `#`. The fragment is empty when absent.
    pub fn split_fragment(uri: &str) -> (&str, &str) {
        uri.split_once('#').unwrap_or((uri, ""))
    }

    /// Resolve `reference` against `base`, producing an absolute URI.
    ///
    /// # Errors
    ///
    /// Returns `ResolutionError::InvalidUri` if the merged URI cannot be
    /// parsed, or if a schemeless base is given and the working directory is
    /// unavailable.
    pub fn resolve(reference: &str, base: &str) -> Result<String, ResolutionError> {
        let r = Self::parse(reference);
        if r.scheme.is_some() {
            let mut target = r;
            target.path = Self::remove_dot_segments(&target.path);
            return Self::normalize(&target.recompose());
        }

        let base = absolute_base(base)?;
        let b = Self::parse(&base);
        let mut target = UriParts {
            scheme: b.scheme.clone(),
            fragment: r.fragment.clone(),
            ..UriParts::default()
        };

        if r.authority.is_some() {
            target.authority = r.authority;
            target.path = Self::remove_dot_segments(&r.path);
            target.query = r.query;
        } else {
            target.authority = b.authority.clone();
            if r.path.is_empty() {
                target.path = b.path.clone();
                target.query = r.query.or(b.query);
            } else {
                target.path = if b.authority.is_some() && b.path.is_empty() {
                    Self::combine(&r.path, "/")
                } else {
                    Self::combine(&r.path, &b.path)
                };
                target.query = r.query;
            }
        }
        Self::normalize(&target.recompose())
    }

    /// Merge a relative path onto the directory of `base_path`.
    ///
    /// A relative path starting with `/` is already absolute and the base is
    /// ignored. Dot segments are removed from the result.
    ///
    /// ```
    /// use conform_core::uri::UriResolver;
    ///
    /// assert_eq!(UriResolver::combine("b.json", "/schemas/a.json"), "/schemas/b.json");
    /// assert_eq!(UriResolver::combine("../b.json", "/schemas/v1/a.json"), "/schemas/b.json");
    /// assert_eq!(UriResolver::combine("/b.json", "/schemas/a.json"), "/b.json");
    /// ```
    pub fn combine(relative_path: &str, base_path: &str) -> String {
        if relative_path.starts_with('/') {
            return Self::remove_dot_segments(relative_path);
        }
        let directory = match base_path.rfind('/') {
            Some(slash) => &base_path[..=slash],
            None => "",
        };
        Self::remove_dot_segments(&format!("{directory}{relative_path}"))
    }

    /// Remove `.` and `..` segments (RFC 3986 §5.2.4).
    pub fn remove_dot_segments(path: &str) -> String {
        let mut input = path;
        let mut output: Vec<&str> = Vec::new();
        let absolute = path.starts_with('/');

        while !input.is_empty() {
            if let Some(rest) = input.strip_prefix("../") {
                input = rest;
            } else if let Some(rest) = input.strip_prefix("./") {
                input = rest;
            } else if input.starts_with("/./") {
                input = &input[2..];
            } else if input == "/." {
                input = "/";
            } else if input.starts_with("/../") {
                input = &input[3..];
                output.pop();
            } else if input == "/.." {
                input = "/";
                output.pop();
            } else if input == "." || input == ".." {
                input = "";
            } else {
                let start = usize::from(input.starts_with('/'));
                let end = input[start..]
                    .find('/')
                    .map_or(input.len(), |i| i + start);
                output.push(&input[..end]);
                input = &input[end..];
            }
        }

        let joined = output.concat();
        if absolute && !joined.starts_with('/') {
            format!("/{joined}")
        } else {
            joined
        }
    }

    /// Canonical form of a URI. Scheme-bearing URIs are canonicalised with
    /// the `url` crate; relative references only lose their dot segments.
    pub fn normalize(uri: &str) -> Result<String, ResolutionError> {
        if !Self::has_scheme(uri) {
            let mut parts = Self::parse(uri);
            parts.path = Self::remove_dot_segments(&parts.path);
            return Ok(parts.recompose());
        }
        Url::parse(uri)
            .map(String::from)
            .map_err(|e| ResolutionError::invalid_uri(uri, e.to_string()))
    }
}

/// Scheme of `uri` if it begins with `ALPHA *( ALPHA / DIGIT / "+" / "-" / "." ) ":"`.
fn scheme_of(uri: &str) -> Option<&str> {
    let colon = uri.find([':', '/', '?', '#'])?;
    if uri.as_bytes()[colon] != b':' || colon == 0 {
        return None;
    }
    let candidate = &uri[..colon];
    let mut bytes = candidate.bytes();
    let first_ok = bytes.next().is_some_and(|b| b.is_ascii_alphabetic());
    let rest_ok = bytes.all(|b| b.is_ascii_alphanumeric() || matches!(b, b'+' | b'-' | b'.'));
    (first_ok && rest_ok).then_some(candidate)
}

/// Make a base absolute, anchoring schemeless bases at the working directory.
fn absolute_base(base: &str) -> Result<String, ResolutionError> {
    if UriResolver::has_scheme(base) {
        return Ok(base.to_string());
    }
    let cwd = std::env::current_dir()
        .map_err(|e| ResolutionError::invalid_uri(base, format!("no working directory: {e}")))?;
    let cwd_url = Url::from_directory_path(&cwd).map_err(|()| {
        ResolutionError::invalid_uri(base, format!("cannot express '{}' as a URI", cwd.display()))
    })?;
    if base.is_empty() {
        return Ok(cwd_url.into());
    }
    UriResolver::resolve(base, cwd_url.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "http://a/b/c/d;p?q";

    #[test]
    fn parse_splits_all_components() {
        let p = UriResolver::parse("http://example.com:80/a/b.json?x=1#/defs/y");
        assert_eq!(p.scheme.as_deref(), Some("http"));
        assert_eq!(p.authority.as_deref(), Some("example.com:80"));
        assert_eq!(p.path, "/a/b.json");
        assert_eq!(p.query.as_deref(), Some("x=1"));
        assert_eq!(p.fragment.as_deref(), Some("/defs/y"));
        assert_eq!(p.recompose(), "http://example.com:80/a/b.json?x=1#/defs/y");
    }

    #[test]
    fn parse_relative_reference_has_no_scheme() {
        let p = UriResolver::parse("schemas/a.json#/x");
        assert_eq!(p.scheme, None);
        assert_eq!(p.path, "schemas/a.json");
        assert!(!UriResolver::has_scheme("dir/a:b"));
        assert!(!UriResolver::has_scheme("#/definitions"));
        assert!(!UriResolver::has_scheme("1abc:x"));
        assert!(UriResolver::has_scheme("urn:example:thing"));
    }

    #[test]
    fn rfc3986_normal_examples() {
        let cases = [
            ("g", "http://a/b/c/g"),
            ("./g", "http://a/b/c/g"),
            ("g/", "http://a/b/c/g/"),
            ("/g", "http://a/g"),
            ("//g", "http://g/"),
            ("?y", "http://a/b/c/d;p?y"),
            ("g?y", "http://a/b/c/g?y"),
            ("#s", "http://a/b/c/d;p?q#s"),
            ("g#s", "http://a/b/c/g#s"),
            ("", "http://a/b/c/d;p?q"),
            (".", "http://a/b/c/"),
            ("..", "http://a/b/"),
            ("../g", "http://a/b/g"),
            ("../..", "http://a/"),
            ("../../g", "http://a/g"),
        ];
        for (reference, expected) in cases {
            assert_eq!(
                UriResolver::resolve(reference, BASE).unwrap(),
                expected,
                "resolving {reference:?}"
            );
        }
    }

    #[test]
    fn rfc3986_abnormal_examples() {
        let cases = [
            ("../../../g", "http://a/g"),
            ("/./g", "http://a/g"),
            ("/../g", "http://a/g"),
            ("g.", "http://a/b/c/g."),
            ("..g", "http://a/b/c/..g"),
            ("./g/.", "http://a/b/c/g/"),
            ("g/./h", "http://a/b/c/g/h"),
            ("g/../h", "http://a/b/c/h"),
        ];
        for (reference, expected) in cases {
            assert_eq!(UriResolver::resolve(reference, BASE).unwrap(), expected);
        }
    }

    #[test]
    fn absolute_reference_ignores_base() {
        assert_eq!(
            UriResolver::resolve("http://json-schema.org/draft-04/schema#", BASE).unwrap(),
            "http://json-schema.org/draft-04/schema#"
        );
    }

    #[test]
    fn fragment_only_reference_keeps_document() {
        assert_eq!(
            UriResolver::resolve("#/definitions/node", "internal://provided-schema/").unwrap(),
            "internal://provided-schema/#/definitions/node"
        );
    }

    #[test]
    fn sibling_document_reference() {
        assert_eq!(
            UriResolver::resolve("b.json#/x", "http://example.com/schemas/a.json").unwrap(),
            "http://example.com/schemas/b.json#/x"
        );
    }

    #[test]
    fn schemeless_base_anchors_at_working_directory() {
        let cwd = Url::from_directory_path(std::env::current_dir().unwrap()).unwrap();
        let resolved = UriResolver::resolve("b.json", "schemas/a.json").unwrap();
        assert_eq!(resolved, cwd.join("schemas/b.json").unwrap().to_string());
        assert!(resolved.starts_with("file:///"));
    }

    #[test]
    fn combine_handles_bare_names_and_dots() {
        assert_eq!(UriResolver::combine("b.json", "a.json"), "b.json");
        assert_eq!(UriResolver::combine("./x/../y.json", "/r/s.json"), "/r/y.json");
        assert_eq!(UriResolver::combine("b.json", "/r/"), "/r/b.json");
    }

    #[test]
    fn remove_dot_segments_examples() {
        assert_eq!(UriResolver::remove_dot_segments("/a/b/c/./../../g"), "/a/g");
        assert_eq!(UriResolver::remove_dot_segments("mid/content=5/../6"), "mid/6");
        assert_eq!(UriResolver::remove_dot_segments("/.."), "/");
        assert_eq!(UriResolver::remove_dot_segments(""), "");
    }

    #[test]
    fn normalize_canonicalises_case() {
        assert_eq!(
            UriResolver::normalize("HTTP://Example.COM/a/./b.json").unwrap(),
            "http://example.com/a/b.json"
        );
    }

    #[test]
    fn split_fragment_defaults_to_empty() {
        assert_eq!(UriResolver::split_fragment("a.json"), ("a.json", ""));
        assert_eq!(UriResolver::split_fragment("a.json#/x"), ("a.json", "/x"));
        assert_eq!(UriResolver::split_fragment("a.json#"), ("a.json", ""));
    }
}
