//! Route table and dispatcher.

mod ai;
mod catalog;
mod system;

use axum::http::{Method, Uri};
use axum::routing::{get, post};
use axum::Router;
use serde::Serialize;

use catalog_service_shared::{
    health_report, liveness, metrics_handler, ApiError, AppState, Pipeline,
};

use crate::docs;

/// One entry of the public route table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KnownRoute {
    pub method: &'static str,
    pub path: &'static str,
    pub summary: &'static str,
}

const fn route(method: &'static str, path: &'static str, summary: &'static str) -> KnownRoute {
    KnownRoute {
        method,
        path,
        summary,
    }
}

/// Every registered route, in documentation order.
pub const KNOWN_ROUTES: &[KnownRoute] = &[
    route("GET", "/api/health", "Service health, uptime and memory"),
    route("GET", "/api/services", "List all services"),
    route("POST", "/api/services", "Create a service (simulated)"),
    route("GET", "/api/services/{id}", "Get one service"),
    route("PUT", "/api/services/{id}", "Update a service (simulated)"),
    route("DELETE", "/api/services/{id}", "Delete a service (simulated)"),
    route("GET", "/api/services/category/{category}", "Services in one category"),
    route("GET", "/api/software", "List all software"),
    route("GET", "/api/software/{id}", "Get one software product"),
    route("GET", "/api/software/category/{category}", "Software in one category"),
    route("POST", "/api/ai/software-analysis", "Simulated code analysis"),
    route("POST", "/api/ai/automation-workflow", "Workflow template"),
    route("POST", "/api/ai/performance-optimization", "Simulated performance review"),
    route("POST", "/api/ai/security-assessment", "Simulated security assessment"),
    route("GET", "/api/ai/intelligent-monitoring", "Simulated monitoring snapshot"),
    route("GET", "/api/ai/models", "Available simulated models"),
    route("GET", "/", "Liveness"),
    route("GET", "/health", "Liveness"),
    route("POST", "/refresh", "Redirects to /api/auth/refresh"),
    route("POST", "/auth/refresh", "Redirects to /api/auth/refresh"),
    route("GET", "/api-docs", "Interactive API reference"),
    route("GET", "/api-docs/openapi.json", "API description document"),
    route("GET", "/metrics", "Prometheus metrics"),
];

/// `"METHOD /path"` for every known route.
pub fn available_routes() -> Vec<String> {
    KNOWN_ROUTES
        .iter()
        .map(|r| format!("{} {}", r.method, r.path))
        .collect()
}

/// Body shared by simulated endpoints.
#[derive(Debug, Serialize)]
pub(crate) struct Simulated<T> {
    pub data: T,
    pub simulated: bool,
}

impl<T> Simulated<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            simulated: true,
        }
    }
}

async fn not_found(method: Method, uri: Uri) -> ApiError {
    ApiError::route_not_found(&method, uri.path(), available_routes())
}

/// Build the application router with the full pipeline applied.
pub fn build_router(state: AppState, pipeline: Pipeline) -> Router {
    let api = Router::new()
        .route("/health", get(health_report))
        .nest("/services", catalog::services_router())
        .nest("/software", catalog::software_router())
        .nest("/ai", ai::router());

    let router = Router::new()
        .route("/", get(liveness))
        .route("/health", get(liveness))
        .route("/refresh", post(system::refresh_redirect))
        .route("/auth/refresh", post(system::refresh_redirect))
        .route("/api-docs", get(docs::swagger_page))
        .route("/api-docs/openapi.json", get(docs::openapi_document))
        .route("/metrics", get(metrics_handler))
        .nest("/api", api)
        .fallback(not_found);

    pipeline.apply(router).with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn known_routes_are_unique() {
        let unique: HashSet<_> = KNOWN_ROUTES.iter().map(|r| (r.method, r.path)).collect();
        assert_eq!(unique.len(), KNOWN_ROUTES.len());
    }

    #[test]
    fn available_routes_format() {
        let routes = available_routes();
        assert!(routes.contains(&"GET /api/services".to_string()));
        assert!(routes.contains(&"POST /api/ai/software-analysis".to_string()));
    }
}
