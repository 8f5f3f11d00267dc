//! Fixtures for handler and pipeline tests.
//!
//! Enable the `test-utils` feature to use these from other crates.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use axum::extract::ConnectInfo;
use axum::http::{HeaderMap, Method};
use chrono::Utc;

use crate::config::{RateLimitConfig, ServiceConfig};
use crate::middleware::{RequestContext, RequestId};
use crate::state::AppState;

static TEST_STATE: OnceLock<AppState> = OnceLock::new();
static REQUEST_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Default configuration with a short timeout and a fixed test platform name.
pub fn test_config() -> ServiceConfig {
    ServiceConfig {
        request_timeout: Duration::from_secs(5),
        platform: "catalog-test".to_string(),
        ..ServiceConfig::default()
    }
}

/// [`test_config`] with a small standard ceiling for rate-limit tests.
pub fn test_config_with_limit(max_requests: u32) -> ServiceConfig {
    ServiceConfig {
        rate_limit: RateLimitConfig {
            max_requests,
            ..RateLimitConfig::default()
        },
        ..test_config()
    }
}

/// Shared state over [`test_config`]. Loaded once per test binary.
///
/// # Panics
///
/// Panics if the static catalog tables are inconsistent.
pub fn test_state() -> AppState {
    TEST_STATE
        .get_or_init(|| {
            AppState::load(test_config())
                .unwrap_or_else(|e| panic!("failed to load test catalog: {}", e))
        })
        .clone()
}

/// Unique request id for tests.
pub fn test_request_id() -> String {
    format!("test-{}", REQUEST_COUNTER.fetch_add(1, Ordering::Relaxed))
}

/// A context as the tagging stage would build it.
pub fn test_context(method: Method, path: &str) -> RequestContext {
    RequestContext {
        request_id: RequestId::new(test_request_id()),
        received_at: Utc::now(),
        started_at: Instant::now(),
        method,
        path: path.to_string(),
        headers: HeaderMap::new(),
        remote_addr: None,
        user_agent: None,
    }
}

/// Peer address extension for requests that bypass a real listener.
pub fn test_peer(last_octet: u8) -> ConnectInfo<SocketAddr> {
    ConnectInfo(SocketAddr::from(([192, 0, 2, last_octet], 40000)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_loads() {
        let state = test_state();
        assert_eq!(state.catalog().services.len(), 10);
        assert_eq!(state.config().platform, "catalog-test");
    }

    #[test]
    fn request_ids_are_unique() {
        assert_ne!(test_request_id(), test_request_id());
    }

    #[test]
    fn limit_override() {
        let config = test_config_with_limit(2);
        assert_eq!(config.rate_limit.max_requests, 2);
        assert_eq!(config.rate_limit.ai_max_requests, 1000);
    }
}
