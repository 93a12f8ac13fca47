//! Route matching logic.
//!
//! # Responsibilities
//! - Match the request URL against a router's base URL (scheme + host + prefix)
//! - Match the remaining path against entry patterns
//! - Extract named parameters and wildcard remainders
//!
//! # Design Decisions
//! - Host matching is case-insensitive (host names carry no case)
//! - Path matching is case-sensitive
//! - Patterns are compiled once at registration, matched per request
//! - No regex: segment-by-segment comparison keeps matching O(path length)

use std::collections::HashMap;

use axum::http::Method;
use url::Url;

/// Named parameters bound during path matching.
pub type PathParams = HashMap<String, String>;

/// One compiled segment of a path pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    /// Literal segment, compared case-sensitively.
    Literal(String),
    /// `:name` segment binding exactly one path segment.
    Param(String),
    /// Trailing `*` matching any remainder (including empty).
    Wildcard,
}

/// A compiled path pattern (`/users/:id`, `/files/*`, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    segments: Vec<Segment>,
}

impl PathPattern {
    /// Compile a pattern string.
    ///
    /// A `*` segment is only meaningful in trailing position; anywhere else
    /// it is treated as a literal.
    pub fn parse(pattern: &str) -> Self {
        let raw: Vec<&str> = pattern.split('/').filter(|s| !s.is_empty()).collect();
        let last = raw.len().saturating_sub(1);

        let segments = raw
            .iter()
            .enumerate()
            .map(|(i, s)| {
                if let Some(name) = s.strip_prefix(':') {
                    Segment::Param(name.to_string())
                } else if *s == "*" && i == last {
                    Segment::Wildcard
                } else {
                    Segment::Literal(s.to_string())
                }
            })
            .collect();

        Self { segments }
    }

    /// Match a path (e.g. `/users/42`) against this pattern.
    ///
    /// Returns the bound parameters on a match. A trailing wildcard binds
    /// the unmatched remainder under the `*` key.
    pub fn matches(&self, path: &str) -> Option<PathParams> {
        let parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let mut params = PathParams::new();

        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Wildcard => {
                    params.insert("*".to_string(), parts[i..].join("/"));
                    return Some(params);
                }
                Segment::Literal(lit) => {
                    if parts.get(i) != Some(&lit.as_str()) {
                        return None;
                    }
                }
                Segment::Param(name) => match parts.get(i) {
                    Some(value) => {
                        params.insert(name.clone(), value.to_string());
                    }
                    None => return None,
                },
            }
        }

        if parts.len() == self.segments.len() {
            Some(params)
        } else {
            None
        }
    }
}

/// Method condition on a route entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MethodMatcher {
    /// Matches every method (middleware, `all`).
    Any,
    /// Matches one method exactly.
    Exact(Method),
}

impl MethodMatcher {
    pub fn matches(&self, method: &Method) -> bool {
        match self {
            MethodMatcher::Any => true,
            MethodMatcher::Exact(m) => m == method,
        }
    }
}

/// Matches a request URL against a router's base URL and yields the
/// path remainder used for entry matching.
#[derive(Debug, Clone)]
pub struct BaseMatcher {
    scheme: String,
    host: String,
    port: Option<u16>,
    path_prefix: String,
}

impl BaseMatcher {
    /// Build a matcher from a parsed base URL.
    ///
    /// The host is normalized to lowercase for case-insensitive matching;
    /// the path prefix stays case-sensitive.
    pub fn new(base: &Url) -> Self {
        Self {
            scheme: base.scheme().to_string(),
            host: base.host_str().unwrap_or_default().to_lowercase(),
            port: base.port(),
            path_prefix: base.path().trim_end_matches('/').to_string(),
        }
    }

    /// Return the path remainder if `url` falls under this base.
    ///
    /// The remainder always starts with `/` (the base prefix itself maps
    /// to `/`).
    pub fn strip(&self, url: &Url) -> Option<String> {
        if url.scheme() != self.scheme {
            return None;
        }
        if url.host_str().unwrap_or_default().to_lowercase() != self.host {
            return None;
        }
        if url.port_or_known_default() != self.effective_port(url) {
            return None;
        }

        let path = url.path();
        let rest = path.strip_prefix(self.path_prefix.as_str())?;
        if rest.is_empty() {
            Some("/".to_string())
        } else if rest.starts_with('/') {
            Some(rest.to_string())
        } else {
            // Prefix ended mid-segment ("/api" must not claim "/apiary").
            None
        }
    }

    fn effective_port(&self, url: &Url) -> Option<u16> {
        match self.port {
            Some(p) => Some(p),
            None => match self.scheme.as_str() {
                "http" => Some(80),
                "https" => Some(443),
                _ => url.port_or_known_default(),
            },
        }
    }
}
