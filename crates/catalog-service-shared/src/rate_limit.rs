//! Per-client fixed-window rate limiting.
//!
//! Two policies share one window length:
//!
//! - **standard**: applies to `/api` and `/api/...` paths
//! - **ai**: applies to every path for clients identified as AI platforms,
//!   by an `X-AI-Platform` header or a known user-agent substring
//!
//! A request counts against exactly one policy. AI traffic skips the
//! standard limiter entirely. A client's window starts at its first counted
//! request and resets once the window length has elapsed.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use axum::extract::{Request, State};
use axum::http::{header, HeaderMap, HeaderName, HeaderValue};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use dashmap::DashMap;

use crate::config::RateLimitConfig;
use crate::error::ApiError;
use crate::metrics::record_rate_limited;
use crate::middleware::peer_addr;

pub const AI_PLATFORM_HEADER: HeaderName = HeaderName::from_static("x-ai-platform");
const LIMIT_HEADER: HeaderName = HeaderName::from_static("x-ratelimit-limit");
const REMAINING_HEADER: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
const RESET_HEADER: HeaderName = HeaderName::from_static("x-ratelimit-reset");

/// Lower-case user-agent fragments that mark a request as AI traffic.
pub const AI_USER_AGENT_MARKERS: &[&str] = &[
    "chatgpt",
    "gptbot",
    "openai",
    "claude",
    "anthropic",
    "perplexity",
    "gemini",
    "bard",
    "copilot",
    "cohere",
];

/// Time source for window arithmetic.
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> Instant;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<Instant>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Arc::new(Mutex::new(Instant::now())),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Which limiter a request counts against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    Standard,
    Ai,
}

impl Policy {
    pub fn code(self) -> &'static str {
        match self {
            Policy::Standard => "RATE_LIMIT_EXCEEDED",
            Policy::Ai => "AI_RATE_LIMIT_EXCEEDED",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Policy::Standard => "standard",
            Policy::Ai => "ai",
        }
    }
}

/// Outcome of counting one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allowed {
        limit: u32,
        remaining: u32,
        reset_in: Duration,
    },
    Limited {
        limit: u32,
        retry_after: Duration,
    },
}

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

/// Fixed-window counters keyed by client identity.
#[derive(Debug)]
pub struct WindowCounter {
    window: Duration,
    max: u32,
    clients: DashMap<String, Window>,
}

impl WindowCounter {
    pub fn new(window: Duration, max: u32) -> Self {
        Self {
            window,
            max,
            clients: DashMap::new(),
        }
    }

    /// Count one request from `client` at `now`.
    pub fn check(&self, client: &str, now: Instant) -> Decision {
        let mut entry = self
            .clients
            .entry(client.to_string())
            .or_insert(Window {
                started: now,
                count: 0,
            });

        if now.saturating_duration_since(entry.started) >= self.window {
            *entry = Window {
                started: now,
                count: 0,
            };
        }
        let reset_in = self
            .window
            .saturating_sub(now.saturating_duration_since(entry.started));

        if entry.count >= self.max {
            return Decision::Limited {
                limit: self.max,
                retry_after: reset_in,
            };
        }
        entry.count += 1;
        Decision::Allowed {
            limit: self.max,
            remaining: self.max - entry.count,
            reset_in,
        }
    }

    /// Drop windows that have fully elapsed.
    pub fn purge_expired(&self, now: Instant) {
        self.clients
            .retain(|_, w| now.saturating_duration_since(w.started) < self.window);
    }

    pub fn tracked_clients(&self) -> usize {
        self.clients.len()
    }
}

pub struct RateLimiter {
    enabled: bool,
    clock: Arc<dyn Clock>,
    standard: WindowCounter,
    ai: WindowCounter,
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("enabled", &self.enabled)
            .field("standard_clients", &self.standard.tracked_clients())
            .field("ai_clients", &self.ai.tracked_clients())
            .finish()
    }
}

impl RateLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: &RateLimitConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            enabled: config.enabled,
            clock,
            standard: WindowCounter::new(config.window, config.max_requests),
            ai: WindowCounter::new(config.window, config.ai_max_requests),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// The policy a request falls under, or `None` when it is not limited.
    pub fn classify(&self, path: &str, headers: &HeaderMap) -> Option<Policy> {
        if is_ai_traffic(headers) {
            Some(Policy::Ai)
        } else if path == "/api" || path.starts_with("/api/") {
            Some(Policy::Standard)
        } else {
            None
        }
    }

    pub fn check(&self, policy: Policy, client: &str) -> Decision {
        let now = self.clock.now();
        match policy {
            Policy::Standard => self.standard.check(client, now),
            Policy::Ai => self.ai.check(client, now),
        }
    }

    pub fn purge_expired(&self) {
        let now = self.clock.now();
        self.standard.purge_expired(now);
        self.ai.purge_expired(now);
    }
}

/// Whether the request comes from an AI platform.
pub fn is_ai_traffic(headers: &HeaderMap) -> bool {
    if headers.contains_key(AI_PLATFORM_HEADER) {
        return true;
    }
    headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(|ua| {
            let ua = ua.to_ascii_lowercase();
            AI_USER_AGENT_MARKERS.iter().any(|m| ua.contains(m))
        })
        .unwrap_or(false)
}

/// Key identifying the caller: peer address, else the first
/// `X-Forwarded-For` hop, else "unknown".
pub fn client_identity(req: &Request) -> String {
    if let Some(addr) = peer_addr(req.extensions()) {
        return addr.ip().to_string();
    }
    req.headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
        .unwrap_or_else(|| "unknown".to_string())
}

fn ceil_secs(d: Duration) -> u64 {
    d.as_secs() + u64::from(d.subsec_nanos() > 0)
}

fn set_number(headers: &mut HeaderMap, name: HeaderName, value: u64) {
    if let Ok(v) = HeaderValue::from_str(&value.to_string()) {
        headers.insert(name, v);
    }
}

pub async fn rate_limit_middleware(
    State(limiter): State<Arc<RateLimiter>>,
    req: Request,
    next: Next,
) -> Response {
    if !limiter.is_enabled() {
        return next.run(req).await;
    }
    let Some(policy) = limiter.classify(req.uri().path(), req.headers()) else {
        return next.run(req).await;
    };

    let client = client_identity(&req);
    match limiter.check(policy, &client) {
        Decision::Allowed {
            limit,
            remaining,
            reset_in,
        } => {
            let mut response = next.run(req).await;
            let headers = response.headers_mut();
            set_number(headers, LIMIT_HEADER, u64::from(limit));
            set_number(headers, REMAINING_HEADER, u64::from(remaining));
            set_number(headers, RESET_HEADER, ceil_secs(reset_in));
            response
        }
        Decision::Limited { limit, retry_after } => {
            let retry_after_secs = ceil_secs(retry_after);
            tracing::warn!(
                client = %client,
                policy = policy.as_str(),
                path = %req.uri().path(),
                retry_after_secs,
                "rate limit exceeded"
            );
            record_rate_limited(policy.as_str());

            let mut response =
                ApiError::rate_limited(policy.code(), limit, retry_after_secs).into_response();
            let headers = response.headers_mut();
            set_number(headers, header::RETRY_AFTER, retry_after_secs);
            set_number(headers, LIMIT_HEADER, u64::from(limit));
            set_number(headers, REMAINING_HEADER, 0);
            set_number(headers, RESET_HEADER, retry_after_secs);
            response
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(max: u32, ai_max: u32) -> RateLimitConfig {
        RateLimitConfig {
            enabled: true,
            window: Duration::from_secs(900),
            max_requests: max,
            ai_max_requests: ai_max,
        }
    }

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (k, v) in pairs {
            map.insert(*k, HeaderValue::from_static(v));
        }
        map
    }

    #[test]
    fn allows_up_to_limit_then_rejects() {
        let clock = ManualClock::new();
        let limiter = RateLimiter::with_clock(&config(3, 10), Arc::new(clock.clone()));

        for expected_remaining in [2, 1, 0] {
            match limiter.check(Policy::Standard, "1.2.3.4") {
                Decision::Allowed { remaining, .. } => assert_eq!(remaining, expected_remaining),
                other => panic!("unexpected {:?}", other),
            }
        }
        assert!(matches!(
            limiter.check(Policy::Standard, "1.2.3.4"),
            Decision::Limited { limit: 3, .. }
        ));
    }

    #[test]
    fn window_resets_after_elapsed() {
        let clock = ManualClock::new();
        let limiter = RateLimiter::with_clock(&config(1, 10), Arc::new(clock.clone()));

        assert!(matches!(limiter.check(Policy::Standard, "c"), Decision::Allowed { .. }));
        clock.advance(Duration::from_secs(600));
        match limiter.check(Policy::Standard, "c") {
            Decision::Limited { retry_after, .. } => {
                assert_eq!(retry_after, Duration::from_secs(300))
            }
            other => panic!("unexpected {:?}", other),
        }
        clock.advance(Duration::from_secs(300));
        assert!(matches!(limiter.check(Policy::Standard, "c"), Decision::Allowed { .. }));
    }

    #[test]
    fn clients_and_policies_are_independent() {
        let limiter = RateLimiter::new(&config(1, 1));
        assert!(matches!(limiter.check(Policy::Standard, "a"), Decision::Allowed { .. }));
        assert!(matches!(limiter.check(Policy::Standard, "b"), Decision::Allowed { .. }));
        assert!(matches!(limiter.check(Policy::Ai, "a"), Decision::Allowed { .. }));
        assert!(matches!(limiter.check(Policy::Standard, "a"), Decision::Limited { .. }));
    }

    #[test]
    fn classification() {
        let limiter = RateLimiter::new(&config(1, 1));
        assert_eq!(limiter.classify("/api/services", &HeaderMap::new()), Some(Policy::Standard));
        assert_eq!(limiter.classify("/api", &HeaderMap::new()), Some(Policy::Standard));
        assert_eq!(limiter.classify("/apiary", &HeaderMap::new()), None);
        assert_eq!(limiter.classify("/health", &HeaderMap::new()), None);
        assert_eq!(
            limiter.classify("/health", &headers(&[("x-ai-platform", "custom")])),
            Some(Policy::Ai)
        );
        assert_eq!(
            limiter.classify(
                "/api/services",
                &headers(&[("user-agent", "Mozilla/5.0 (compatible; GPTBot/1.1)")])
            ),
            Some(Policy::Ai)
        );
    }

    #[test]
    fn ordinary_browsers_are_not_ai() {
        assert!(!is_ai_traffic(&headers(&[(
            "user-agent",
            "Mozilla/5.0 (X11; Linux x86_64) Firefox/130.0"
        )])));
    }

    #[test]
    fn purge_drops_only_expired_windows() {
        let clock = ManualClock::new();
        let limiter = RateLimiter::with_clock(&config(5, 5), Arc::new(clock.clone()));
        limiter.check(Policy::Standard, "old");
        clock.advance(Duration::from_secs(899));
        limiter.check(Policy::Standard, "new");
        clock.advance(Duration::from_secs(1));
        limiter.purge_expired();
        assert_eq!(limiter.standard.tracked_clients(), 1);
    }

    #[test]
    fn client_identity_falls_back_to_forwarded_for() {
        let req = axum::http::Request::builder()
            .header("x-forwarded-for", "203.0.113.7, 10.0.0.1")
            .body(axum::body::Body::empty())
            .unwrap();
        assert_eq!(client_identity(&req), "203.0.113.7");

        let req = axum::http::Request::builder()
            .body(axum::body::Body::empty())
            .unwrap();
        assert_eq!(client_identity(&req), "unknown");
    }

    #[test]
    fn peer_address_wins_over_forwarded_for() {
        let mut req = axum::http::Request::builder()
            .header("x-forwarded-for", "203.0.113.7")
            .body(axum::body::Body::empty())
            .unwrap();
        req.extensions_mut().insert(crate::test_utils::test_peer(42));
        assert_eq!(client_identity(&req), "192.0.2.42");
    }

    #[test]
    fn tls_peer_address_identifies_client() {
        let mut req = axum::http::Request::builder()
            .header("x-forwarded-for", "203.0.113.7")
            .body(axum::body::Body::empty())
            .unwrap();
        let peer = crate::tls::TlsPeer(([192, 0, 2, 9], 443).into());
        req.extensions_mut()
            .insert(axum::extract::ConnectInfo(peer));
        assert_eq!(client_identity(&req), "192.0.2.9");
    }

    #[test]
    fn ceil_secs_rounds_up() {
        assert_eq!(ceil_secs(Duration::from_millis(1500)), 2);
        assert_eq!(ceil_secs(Duration::from_secs(3)), 3);
    }
}
