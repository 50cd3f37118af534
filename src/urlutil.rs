//! URL string helpers shared by route matching, generation and rewriting.
//!
//! These cover exactly what the core needs from a URL: splitting into
//! scheme/host/path/query, query-string handling, percent decoding, and
//! path-segment manipulation. Paths are compared and stored without
//! surrounding slashes; the root path is the empty string.

use std::collections::BTreeMap;

/// The pieces of a URL the localization core cares about.
///
/// The fragment is discarded. `path` keeps its percent encoding; use
/// [`UrlParts::path_segments`] for the decoded form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlParts {
    pub scheme: Option<String>,
    pub host: Option<String>,
    pub path: String,
    pub query: Option<String>,
}

impl UrlParts {
    /// Decoded path segments, without surrounding slashes. Empty for the root.
    pub fn path_segments(&self) -> Vec<String> {
        let trimmed = self.path.trim_matches('/');
        if trimmed.is_empty() {
            return Vec::new();
        }
        trimmed.split('/').map(|s| percent_decode(s, false)).collect()
    }

    /// Decoded, slash-trimmed path. Empty string for the root.
    pub fn normalized_path(&self) -> String {
        self.path_segments().join("/")
    }
}

/// Split a URL into its parts. Accepts absolute URLs (`https://host/a/b?q`),
/// protocol-relative URLs (`//host/a`) and bare paths (`/a/b?q`, `a/b`).
pub fn split_url(url: &str) -> UrlParts {
    // Drop the fragment first; it never participates in routing.
    let url = url.split('#').next().unwrap_or("");

    let (before_query, query) = match url.split_once('?') {
        Some((b, q)) => (b, Some(q.to_string())),
        None => (url, None),
    };

    let (scheme, rest) = match before_query.split_once("://") {
        Some((s, r)) => (Some(s.to_string()), r),
        None => match before_query.strip_prefix("//") {
            Some(r) => (None, r),
            None => {
                return UrlParts {
                    scheme: None,
                    host: None,
                    path: before_query.to_string(),
                    query,
                };
            }
        },
    };

    let (host, path) = match rest.split_once('/') {
        Some((h, p)) => (h.to_string(), p.to_string()),
        None => (rest.to_string(), String::new()),
    };

    UrlParts {
        scheme,
        host: Some(host),
        path,
        query,
    }
}

/// Decode percent escapes. Invalid escapes pass through unchanged. When
/// `plus_as_space` is set, `+` decodes to a space (query-string convention).
pub fn percent_decode(input: &str, plus_as_space: bool) -> String {
    let bytes = input.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        if b == b'%' {
            if let (Some(hi), Some(lo)) = (
                bytes.get(i + 1).copied().and_then(hex_val),
                bytes.get(i + 2).copied().and_then(hex_val),
            ) {
                decoded.push(hi * 16 + lo);
                i += 3;
                continue;
            }
        }
        if plus_as_space && b == b'+' {
            decoded.push(b' ');
        } else {
            decoded.push(b);
        }
        i += 1;
    }

    String::from_utf8_lossy(&decoded).into_owned()
}

fn hex_val(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

/// Parse a query string into an ordered key/value map. Keys and values are
/// percent-decoded, with `+` treated as a space.
pub fn parse_query(query: &str) -> BTreeMap<String, String> {
    let mut out = BTreeMap::new();
    for pair in query.split('&') {
        if pair.is_empty() {
            continue;
        }
        let (key, value) = match pair.split_once('=') {
            Some((k, v)) => (k, v),
            None => (pair, ""),
        };
        out.insert(percent_decode(key, true), percent_decode(value, true));
    }
    out
}

/// Render a query map back into a query string. Values are emitted decoded:
/// localized URLs are percent-decoded for readability as a final step, so
/// re-encoding here would be immediately undone.
pub fn render_query(queries: &BTreeMap<String, String>) -> String {
    queries
        .iter()
        .map(|(k, v)| {
            if v.is_empty() {
                k.clone()
            } else {
                format!("{}={}", k, v)
            }
        })
        .collect::<Vec<_>>()
        .join("&")
}

/// Insert `segment` into `path` at a 1-based position, clamped to the path
/// bounds. Position 1 prepends; positions past the end append.
pub fn insert_segment(path: &str, segment: &str, position: usize) -> String {
    let trimmed = path.trim_matches('/');
    let mut segments: Vec<&str> = if trimmed.is_empty() {
        Vec::new()
    } else {
        trimmed.split('/').collect()
    };

    let index = position.saturating_sub(1).min(segments.len());
    segments.insert(index, segment);
    segments.join("/")
}

/// Slash-trimmed segment count of a path. Zero for the root.
pub fn segment_count(path: &str) -> usize {
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        0
    } else {
        trimmed.split('/').count()
    }
}

/// Compare two paths ignoring surrounding slashes and percent encoding.
pub fn same_path(a: &str, b: &str) -> bool {
    normalize_path(a) == normalize_path(b)
}

/// Decoded, slash-trimmed form of a path string.
pub fn normalize_path(path: &str) -> String {
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        return String::new();
    }
    trimmed
        .split('/')
        .map(|s| percent_decode(s, false))
        .collect::<Vec<_>>()
        .join("/")
}
