//! Liveness and health handlers.
//!
//! `GET /` and `GET /health` answer as long as the process is serving.
//! `GET /api/health` adds uptime, environment, catalog sizes and a memory
//! snapshot of the current process.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use sysinfo::{ProcessRefreshKind, ProcessesToUpdate, System};

use crate::middleware::{RequestContext, RequestId};
use crate::response::{timestamp_now, ApiResponse};
use crate::state::AppState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LivenessStatus {
    pub status: String,
    pub message: String,
    pub timestamp: String,
    pub service: String,
    pub version: String,
    #[serde(rename = "requestId")]
    pub request_id: String,
}

impl LivenessStatus {
    pub fn alive(service: &str, version: &str, request_id: &RequestId) -> Self {
        Self {
            status: "ok".to_string(),
            message: format!("{} is running", service),
            timestamp: timestamp_now(),
            service: service.to_string(),
            version: version.to_string(),
            request_id: request_id.to_string(),
        }
    }
}

/// Resident and virtual memory of this process, in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemorySnapshot {
    pub resident_bytes: u64,
    pub virtual_bytes: u64,
}

impl MemorySnapshot {
    /// `None` when the platform does not expose process statistics.
    pub fn current() -> Option<Self> {
        let pid = sysinfo::get_current_pid().ok()?;
        let mut system = System::new();
        system.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[pid]),
            true,
            ProcessRefreshKind::nothing().with_memory(),
        );
        system.process(pid).map(|process| Self {
            resident_bytes: process.memory(),
            virtual_bytes: process.virtual_memory(),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogCounts {
    pub services: usize,
    pub software: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: String,
    pub service: String,
    pub version: String,
    pub environment: String,
    pub started_at: String,
    pub uptime_seconds: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory: Option<MemorySnapshot>,
    pub catalog: CatalogCounts,
}

impl HealthReport {
    pub fn collect(state: &AppState) -> Self {
        let config = state.config();
        Self {
            status: "healthy".to_string(),
            service: config.platform.clone(),
            version: config.api_version.clone(),
            environment: config.environment.as_str().to_string(),
            started_at: state.started_at().to_rfc3339(),
            uptime_seconds: state.uptime().as_secs(),
            memory: MemorySnapshot::current(),
            catalog: CatalogCounts {
                services: state.catalog().services.len(),
                software: state.catalog().software.len(),
            },
        }
    }
}

/// ```text
/// GET /health
/// {"status":"ok","message":"catalog-api is running","timestamp":"...",
///  "service":"catalog-api","version":"1.0.0","requestId":"..."}
/// ```
pub async fn liveness(State(state): State<AppState>, ctx: RequestContext) -> Json<LivenessStatus> {
    let config = state.config();
    Json(LivenessStatus::alive(&config.platform, &config.api_version, &ctx.request_id))
}

pub async fn health_report(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> ApiResponse<HealthReport> {
    ApiResponse::new("Service is healthy", &ctx, HealthReport::collect(&state))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServiceConfig;

    #[test]
    fn liveness_status() {
        let status = LivenessStatus::alive("catalog-api", "1.0.0", &RequestId::new("live-1"));
        assert_eq!(status.status, "ok");
        assert_eq!(status.service, "catalog-api");
        assert!(status.message.contains("running"));

        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["requestId"], "live-1");
    }

    #[test]
    fn report_reflects_state() {
        let state = AppState::load(ServiceConfig::default()).unwrap();
        let report = HealthReport::collect(&state);
        assert_eq!(report.status, "healthy");
        assert_eq!(report.environment, "development");
        assert_eq!(report.catalog.services, 10);
        assert_eq!(report.catalog.software, state.catalog().software.len());
    }

    #[test]
    fn memory_snapshot_when_available() {
        if let Some(memory) = MemorySnapshot::current() {
            assert!(memory.resident_bytes > 0);
        }
    }

    #[test]
    fn report_serialization_skips_missing_memory() {
        let state = AppState::load(ServiceConfig::default()).unwrap();
        let mut report = HealthReport::collect(&state);
        report.memory = None;
        let json = serde_json::to_string(&report).unwrap();
        assert!(!json.contains("memory"));
        assert!(json.contains("\"uptime_seconds\""));
    }
}
