//! Shared HTTP infrastructure for the catalog service.
//!
//! - [`Pipeline`]: the ordered middleware chain applied to the router
//! - [`ApiError`] and the error responder: the single failure format
//! - [`ApiResponse`] / [`CatalogRead`]: success bodies
//! - [`RateLimiter`]: per-client fixed-window limits with an injectable clock
//! - [`AppState`]: the read-only catalog plus configuration
//! - [`health`], [`logging`], [`metrics`], [`tls`]: ambient plumbing
//!
//! # Architecture
//!
//! Handlers stay thin. Catalog content and simulation payloads come from
//! `catalog-lib`; this crate only adapts them to HTTP:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  axum Handler                                               │
//! │  - Extract RequestContext and body (ApiJson)                │
//! │  - Validate into catalog-lib types                          │
//! │  - Call catalog-lib                                         │
//! │  - Return ApiResponse or ApiError                           │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Testing Support
//!
//! The [`test_utils`] module provides fixtures. Enable the `test-utils`
//! feature to reach it from dependent crates.

pub mod compression;
pub mod config;
pub mod cors;
mod error;
pub mod health;
pub mod logging;
pub mod metrics;
pub mod middleware;
mod pipeline;
pub mod rate_limit;
mod request;
mod response;
pub mod security;
mod state;
pub mod tls;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use config::{ConfigError, Environment, ServiceConfig};
pub use error::{
    error_responder, panic_response, ApiError, ErrorEnvelope, ErrorKind, ErrorResponder,
};
pub use health::{health_report, liveness, HealthReport, LivenessStatus};
pub use logging::{init_logging, LogFormat, LoggingConfig};
pub use metrics::{
    init_metrics, metrics_handler, record_catalog_lookup, record_error, record_rate_limited,
    record_simulation, MetricsConfig, MetricsError,
};
pub use middleware::{
    extract_or_generate_request_id, MetricsLayer, RequestContext, RequestId, REQUEST_ID_HEADER,
};
pub use pipeline::{spawn_rate_limit_sweeper, Pipeline};
pub use rate_limit::{Clock, ManualClock, RateLimiter, SystemClock};
pub use request::{
    ApiJson, ApiPath, AutomationWorkflowRequest, CreateEntryRequest, EntryDraft,
    PerformanceOptimizationRequest, SecurityAssessmentRequest, SoftwareAnalysisRequest,
    UpdateEntryRequest, ValidAnalysis, ValidWorkflow, Validate,
};
pub use response::{timestamp_now, ApiResponse, CatalogRead};
pub use state::{AppState, AppStateError};
pub use tls::{load_tls_config, TlsError, TlsListener, TlsPeer};
