//! Prometheus metrics for the catalog service.
//!
//! - [`MetricsConfig`]: whether to install the recorder
//! - [`init_metrics`]: install the Prometheus recorder once per process
//! - [`metrics_handler`]: text exposition for `GET /metrics`
//! - business helpers for catalog lookups, simulations, rate limiting and errors

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;
use thiserror::Error;

static PROMETHEUS_HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

/// Whether the Prometheus recorder is installed at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsConfig {
    pub enabled: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl MetricsConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// `METRICS_ENABLED`: anything but "false" or "0" enables (default: true).
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let enabled = lookup("METRICS_ENABLED")
            .map(|v| {
                let v = v.trim();
                !(v.eq_ignore_ascii_case("false") || v == "0")
            })
            .unwrap_or(true);
        Self { enabled }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MetricsError {
    #[error("metrics are disabled")]
    Disabled,
    #[error("metrics recorder already initialized")]
    AlreadyInitialized,
    #[error("failed to install metrics recorder: {0}")]
    InstallFailed(String),
}

/// Install the Prometheus recorder. Must run before any metric is recorded
/// for those samples to be exported.
pub fn init_metrics(config: &MetricsConfig) -> Result<(), MetricsError> {
    if !config.enabled {
        return Err(MetricsError::Disabled);
    }
    if PROMETHEUS_HANDLE.get().is_some() {
        return Err(MetricsError::AlreadyInitialized);
    }

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| MetricsError::InstallFailed(e.to_string()))?;

    PROMETHEUS_HANDLE
        .set(handle)
        .map_err(|_| MetricsError::AlreadyInitialized)
}

pub async fn metrics_handler() -> String {
    PROMETHEUS_HANDLE
        .get()
        .map(|h| h.render())
        .unwrap_or_else(|| "# Metrics not initialized\n".to_string())
}

/// Count a catalog read. `outcome` is "found", "not_found", "listed" or "filtered".
pub fn record_catalog_lookup(collection: &str, outcome: &'static str) {
    metrics::counter!(
        "catalog_lookups_total",
        "collection" => collection.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}

/// Count a simulated mutation or AI generation.
pub fn record_simulation(kind: &'static str) {
    metrics::counter!("catalog_simulations_total", "kind" => kind).increment(1);
}

pub fn record_rate_limited(policy: &'static str) {
    metrics::counter!("catalog_rate_limited_total", "policy" => policy).increment(1);
}

/// Count an error envelope produced by the error responder.
pub fn record_error(code: &str, status: u16) {
    metrics::counter!(
        "catalog_errors_total",
        "code" => code.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_from_lookup() {
        assert!(MetricsConfig::from_lookup(|_| None).enabled);
        assert!(!MetricsConfig::from_lookup(|_| Some("FALSE".into())).enabled);
        assert!(!MetricsConfig::from_lookup(|_| Some("0".into())).enabled);
        assert!(MetricsConfig::from_lookup(|_| Some("yes".into())).enabled);
    }

    #[test]
    fn disabled_config_is_rejected() {
        let config = MetricsConfig { enabled: false };
        assert_eq!(init_metrics(&config), Err(MetricsError::Disabled));
    }

    #[tokio::test]
    async fn handler_returns_exposition_text() {
        let output = metrics_handler().await;
        assert!(output.contains('#') || output.is_empty() || output.contains("_total"));
    }

    #[test]
    fn business_helpers_record_without_recorder() {
        record_catalog_lookup("services", "found");
        record_catalog_lookup("software", "not_found");
        record_simulation("software_analysis");
        record_rate_limited("ai");
        record_error("ROUTE_NOT_FOUND", 404);
    }

    #[test]
    fn error_display() {
        assert_eq!(MetricsError::Disabled.to_string(), "metrics are disabled");
        assert!(MetricsError::InstallFailed("boom".into())
            .to_string()
            .contains("boom"));
    }
}
