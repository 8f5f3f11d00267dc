//! Application state shared by every handler.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde_json::Value;
use thiserror::Error;

use catalog_lib::{Catalog, Error as LibError};

use crate::config::ServiceConfig;

#[derive(Debug, Error)]
pub enum AppStateError {
    #[error("failed to load catalog: {0}")]
    Catalog(#[from] LibError),
}

/// Cheaply cloneable handle over the read-only catalog, the configuration
/// and the API description document.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    catalog: Catalog,
    config: ServiceConfig,
    api_document: Value,
    started_at: Instant,
    started_wall: DateTime<Utc>,
}

impl AppState {
    /// Load the static catalog and wrap it with `config`.
    pub fn load(config: ServiceConfig) -> Result<Self, AppStateError> {
        let catalog = Catalog::load()?;
        tracing::info!(
            services = catalog.services.len(),
            software = catalog.software.len(),
            "catalog loaded"
        );
        Ok(Self::from_components(catalog, config, Value::Null))
    }

    pub fn from_components(catalog: Catalog, config: ServiceConfig, api_document: Value) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                catalog,
                config,
                api_document,
                started_at: Instant::now(),
                started_wall: Utc::now(),
            }),
        }
    }

    /// Replace the API description. Only meaningful before the state is shared.
    pub fn with_api_document(self, api_document: Value) -> Self {
        match Arc::try_unwrap(self.inner) {
            Ok(mut inner) => {
                inner.api_document = api_document;
                Self {
                    inner: Arc::new(inner),
                }
            }
            Err(shared) => Self {
                inner: Arc::new(AppStateInner {
                    catalog: shared.catalog.clone(),
                    config: shared.config.clone(),
                    api_document,
                    started_at: shared.started_at,
                    started_wall: shared.started_wall,
                }),
            },
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.inner.catalog
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.inner.config
    }

    pub fn api_document(&self) -> &Value {
        &self.inner.api_document
    }

    pub fn uptime(&self) -> Duration {
        self.inner.started_at.elapsed()
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.inner.started_wall
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("services", &self.inner.catalog.services.len())
            .field("software", &self.inner.catalog.software.len())
            .field("environment", &self.inner.config.environment)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_builds_catalog() {
        let state = AppState::load(ServiceConfig::default()).unwrap();
        assert_eq!(state.catalog().services.len(), 10);
        assert!(state.api_document().is_null());
    }

    #[test]
    fn clones_share_the_same_catalog() {
        let state = AppState::load(ServiceConfig::default()).unwrap();
        let clone = state.clone();
        assert!(std::ptr::eq(state.catalog(), clone.catalog()));
    }

    #[test]
    fn api_document_can_be_attached() {
        let state = AppState::load(ServiceConfig::default())
            .unwrap()
            .with_api_document(serde_json::json!({"openapi": "3.0.3"}));
        assert_eq!(state.api_document()["openapi"], "3.0.3");
    }

    #[test]
    fn catalog_failures_name_their_source() {
        let err = AppStateError::from(LibError::DuplicateId {
            collection: "services".to_string(),
            id: 3,
        });
        assert_eq!(
            err.to_string(),
            "failed to load catalog: duplicate id 3 in services catalog"
        );
    }

    #[test]
    fn debug_output_is_compact() {
        let state = AppState::load(ServiceConfig::default()).unwrap();
        let debug = format!("{:?}", state);
        assert!(debug.contains("services: 10"));
    }
}
