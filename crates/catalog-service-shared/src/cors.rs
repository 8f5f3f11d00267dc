//! Cross-origin policy.
//!
//! Allowed origins are either exact (`https://shop.example.com`) or a
//! scheme and host with any port (`http://localhost:*`). Credentials are
//! allowed, so a wildcard `*` origin is never accepted.

use axum::http::{header, request, HeaderName, HeaderValue, Method};
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::config::CorsConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
enum OriginPattern {
    Exact(String),
    AnyPort(String),
}

impl OriginPattern {
    fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim().trim_end_matches('/');
        if raw.is_empty() || raw == "*" || !raw.contains("://") {
            return None;
        }
        match raw.strip_suffix(":*") {
            Some(prefix) => Some(OriginPattern::AnyPort(prefix.to_ascii_lowercase())),
            None => Some(OriginPattern::Exact(raw.to_ascii_lowercase())),
        }
    }

    fn matches(&self, origin: &str) -> bool {
        match self {
            OriginPattern::Exact(expected) => origin == expected,
            OriginPattern::AnyPort(prefix) => {
                origin == prefix
                    || origin
                        .strip_prefix(prefix.as_str())
                        .and_then(|rest| rest.strip_prefix(':'))
                        .is_some_and(|port| {
                            !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit())
                        })
            }
        }
    }
}

/// Parsed allow-list.
#[derive(Debug, Clone, Default)]
pub struct OriginPolicy {
    patterns: Vec<OriginPattern>,
}

impl OriginPolicy {
    pub fn new<S: AsRef<str>>(origins: &[S]) -> Self {
        let mut patterns = Vec::new();
        for origin in origins {
            match OriginPattern::parse(origin.as_ref()) {
                Some(pattern) => patterns.push(pattern),
                None => tracing::error!(
                    origin = origin.as_ref(),
                    "ignoring invalid CORS origin; expected scheme://host[:port|:*]"
                ),
            }
        }
        Self { patterns }
    }

    pub fn allows(&self, origin: &str) -> bool {
        let origin = origin.to_ascii_lowercase();
        self.patterns.iter().any(|p| p.matches(&origin))
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

pub fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let policy = OriginPolicy::new(&config.allowed_origins);
    if policy.is_empty() {
        tracing::warn!("no valid CORS origins configured; cross-origin requests will be refused");
    } else {
        tracing::info!(origins = ?config.allowed_origins, "CORS configured");
    }

    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(
            move |origin: &HeaderValue, _parts: &request::Parts| {
                origin.to_str().is_ok_and(|o| policy.allows(o))
            },
        ))
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::HEAD,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            header::ACCEPT,
            HeaderName::from_static("x-request-id"),
            HeaderName::from_static("x-ai-platform"),
            HeaderName::from_static("x-no-compression"),
        ])
        .expose_headers([
            HeaderName::from_static("x-request-id"),
            HeaderName::from_static("x-api-version"),
            HeaderName::from_static("x-ratelimit-limit"),
            HeaderName::from_static("x-ratelimit-remaining"),
            header::RETRY_AFTER,
        ])
        .max_age(config.max_age)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_origins_match_case_insensitively() {
        let policy = OriginPolicy::new(&["https://Shop.example.com/"]);
        assert!(policy.allows("https://shop.example.com"));
        assert!(!policy.allows("https://shop.example.com:8443"));
        assert!(!policy.allows("http://shop.example.com"));
    }

    #[test]
    fn wildcard_port_patterns() {
        let policy = OriginPolicy::new(&["http://localhost:*"]);
        assert!(policy.allows("http://localhost:5173"));
        assert!(policy.allows("http://localhost"));
        assert!(!policy.allows("http://localhost:"));
        assert!(!policy.allows("http://localhost:80abc"));
        assert!(!policy.allows("http://localhost.evil.com"));
        assert!(!policy.allows("https://localhost:5173"));
    }

    #[test]
    fn invalid_entries_are_dropped() {
        let policy = OriginPolicy::new(&["*", "", "localhost"]);
        assert!(policy.is_empty());
        assert!(!policy.allows("http://localhost"));
    }
}
