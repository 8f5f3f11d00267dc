//! The ordered request pipeline.
//!
//! Outermost first:
//!
//! 1. [`MetricsLayer`]
//! 2. security headers
//! 3. error responder
//! 4. CORS
//! 5. rate limiting
//! 6. compression (opt-out check, then encoder)
//! 7. body size limit
//! 8. response metadata
//! 9. request tagging and timeout
//! 10. panic capture
//!
//! Security headers wrap the error responder so rejected requests carry them
//! too. The rate limiter runs before anything reads the body. Metadata wraps
//! the timeout and the panic boundary, so those failures are stamped as well.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::middleware::{from_fn, from_fn_with_state};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;

use crate::compression::{compression_layer, compression_opt_out};
use crate::config::ServiceConfig;
use crate::cors::cors_layer;
use crate::error::{error_responder, panic_response, ErrorResponder};
use crate::middleware::{
    response_metadata, tag_request, MetricsLayer, RequestTimeout, ResponseMetadata,
};
use crate::rate_limit::{rate_limit_middleware, Clock, RateLimiter};
use crate::security::security_headers;

/// Everything the pipeline needs, built once at startup.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: ServiceConfig,
    limiter: Arc<RateLimiter>,
}

impl Pipeline {
    pub fn new(config: &ServiceConfig) -> Self {
        Self {
            config: config.clone(),
            limiter: Arc::new(RateLimiter::new(&config.rate_limit)),
        }
    }

    /// Pipeline whose rate limiter reads time from `clock`.
    pub fn with_clock(config: &ServiceConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            config: config.clone(),
            limiter: Arc::new(RateLimiter::with_clock(&config.rate_limit, clock)),
        }
    }

    pub fn rate_limiter(&self) -> Arc<RateLimiter> {
        Arc::clone(&self.limiter)
    }

    /// Wrap every route and the fallback of `router`.
    ///
    /// Call after all routes and the fallback are registered.
    pub fn apply<S>(self, router: Router<S>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        let config = self.config;
        let layers = ServiceBuilder::new()
            .layer(MetricsLayer)
            .layer(from_fn(security_headers))
            .layer(from_fn_with_state(
                ErrorResponder::new(config.environment),
                error_responder,
            ))
            .layer(cors_layer(&config.cors))
            .layer(from_fn_with_state(self.limiter, rate_limit_middleware))
            .layer(from_fn(compression_opt_out))
            .layer(compression_layer(config.compression_min_bytes))
            .layer(DefaultBodyLimit::max(config.body_limit_bytes))
            .layer(from_fn_with_state(
                ResponseMetadata::new(&config.api_version, &config.platform),
                response_metadata,
            ))
            .layer(from_fn_with_state(
                RequestTimeout(config.request_timeout),
                tag_request,
            ))
            .layer(CatchPanicLayer::custom(panic_response));

        router.layer(layers)
    }
}

/// Periodically drop expired rate-limit windows so idle clients do not
/// accumulate. Runs until the runtime shuts down.
pub fn spawn_rate_limit_sweeper(limiter: Arc<RateLimiter>, every: Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            limiter.purge_expired();
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use axum::response::Response;
    use axum::routing::get;
    use serde_json::Value;
    use tower::ServiceExt;

    use crate::config::Environment;
    use crate::test_utils::test_config;

    async fn ok() -> &'static str {
        "ok"
    }

    async fn boom() -> &'static str {
        panic!("handler exploded")
    }

    async fn slow() -> &'static str {
        tokio::time::sleep(Duration::from_secs(5)).await;
        "late"
    }

    fn config(environment: Environment) -> ServiceConfig {
        ServiceConfig {
            environment,
            request_timeout: Duration::from_millis(100),
            ..test_config()
        }
    }

    async fn send(config: &ServiceConfig, uri: &str) -> Response {
        let router = Router::new()
            .route("/api/ok", get(ok))
            .route("/api/boom", get(boom))
            .route("/api/slow", get(slow));
        let app = Pipeline::new(config).apply(router);

        let req = Request::builder()
            .uri(uri)
            .header("x-request-id", "rid-pipeline")
            .body(Body::empty())
            .unwrap();
        app.oneshot(req).await.unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn assert_stamped(response: &Response) {
        let headers = response.headers();
        assert_eq!(headers["x-api-version"], "1.0.0");
        assert_eq!(headers["x-platform"], "catalog-test");
        assert_eq!(headers["x-request-id"], "rid-pipeline");
        assert_eq!(headers["x-content-type-options"], "nosniff");
    }

    #[tokio::test]
    async fn successful_responses_are_stamped() {
        let response = send(&config(Environment::Development), "/api/ok").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_stamped(&response);
    }

    #[tokio::test]
    async fn panics_become_stamped_envelopes() {
        let response = send(&config(Environment::Development), "/api/boom").await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_stamped(&response);

        let body = body_json(response).await;
        assert_eq!(body["code"], "INTERNAL_ERROR");
        assert_eq!(body["requestId"], "rid-pipeline");
        assert_eq!(body["stack"], "handler exploded");
    }

    #[tokio::test]
    async fn production_panics_hide_detail() {
        let response = send(&config(Environment::Production), "/api/boom").await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_stamped(&response);

        let body = body_json(response).await;
        assert!(body.get("stack").is_none());
        assert!(!body["message"].as_str().unwrap().contains("exploded"));
    }

    #[tokio::test]
    async fn timeouts_become_stamped_envelopes() {
        let response = send(&config(Environment::Development), "/api/slow").await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_stamped(&response);

        let body = body_json(response).await;
        assert_eq!(body["code"], "REQUEST_TIMEOUT");
        assert_eq!(body["requestId"], "rid-pipeline");
        assert_eq!(body["retryable"], true);
    }
}
