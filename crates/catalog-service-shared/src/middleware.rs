//! Request tagging, response metadata and HTTP metrics.
//!
//! - [`RequestId`] / [`extract_or_generate_request_id`]: correlation ids
//! - [`RequestContext`]: per-request record attached by [`tag_request`]
//! - [`response_metadata`]: version, platform and request id headers
//! - [`MetricsLayer`]: tower layer recording `http_*` metrics
//!
//! # Request ID Propagation
//!
//! A non-empty `X-Request-ID` header of at most [`MAX_REQUEST_ID_LEN`] visible
//! ASCII characters is reused as is. Otherwise a UUID v7 is generated. The id
//! is recorded on the request span, echoed in the `X-Request-ID` response
//! header and embedded in every success and error body.

use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};

use axum::extract::{ConnectInfo, FromRequestParts, MatchedPath, Request, State};
use axum::http::request::Parts;
use axum::http::{Extensions, HeaderMap, HeaderName, HeaderValue, Method, Response};
use axum::middleware::Next;
use axum::response::IntoResponse;
use chrono::{DateTime, Utc};
use pin_project_lite::pin_project;
use tower::{Layer, Service};
use tracing::{info_span, Instrument};
use uuid::Uuid;

use crate::error::ApiError;
use crate::tls::TlsPeer;

pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");
pub const API_VERSION_HEADER: HeaderName = HeaderName::from_static("x-api-version");
pub const PLATFORM_HEADER: HeaderName = HeaderName::from_static("x-platform");

/// Longest inbound request id that is reused rather than replaced.
pub const MAX_REQUEST_ID_LEN: usize = 128;

/// Newtype wrapper for request correlation IDs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestId(pub String);

impl RequestId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a new UUID v7 request ID.
    pub fn generate() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn header_value(&self) -> Option<HeaderValue> {
        HeaderValue::from_str(&self.0).ok()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for RequestId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for RequestId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Read a usable caller-supplied request id, if any.
pub fn extract_request_id(headers: &HeaderMap) -> Option<RequestId> {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty() && s.len() <= MAX_REQUEST_ID_LEN)
        .filter(|s| s.bytes().all(|b| b.is_ascii_graphic()))
        .map(RequestId::from)
}

/// Extract the request ID from headers or generate a new UUID v7.
pub fn extract_or_generate_request_id(headers: &HeaderMap) -> RequestId {
    extract_request_id(headers).unwrap_or_else(RequestId::generate)
}

/// Client address recorded by whichever listener accepted the connection.
pub fn peer_addr(extensions: &Extensions) -> Option<SocketAddr> {
    extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr)
        .or_else(|| {
            extensions
                .get::<ConnectInfo<TlsPeer>>()
                .map(|ConnectInfo(TlsPeer(addr))| *addr)
        })
}

/// Per-request record created when a request enters the tagging stage.
///
/// The context rides in the request extensions for handlers and is copied
/// into the response extensions so outer stages (the error responder in
/// particular) see the same request id.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: RequestId,
    pub received_at: DateTime<Utc>,
    pub started_at: Instant,
    pub method: Method,
    pub path: String,
    pub headers: HeaderMap,
    pub remote_addr: Option<SocketAddr>,
    pub user_agent: Option<String>,
}

impl RequestContext {
    pub fn from_parts(parts: &Parts) -> Self {
        Self::build(&parts.method, parts.uri.path(), &parts.headers, &parts.extensions)
    }

    pub fn from_request(req: &Request) -> Self {
        Self::build(req.method(), req.uri().path(), req.headers(), req.extensions())
    }

    fn build(
        method: &Method,
        path: &str,
        headers: &HeaderMap,
        extensions: &Extensions,
    ) -> Self {
        Self {
            request_id: extract_or_generate_request_id(headers),
            received_at: Utc::now(),
            started_at: Instant::now(),
            method: method.clone(),
            path: path.to_string(),
            headers: headers.clone(),
            remote_addr: peer_addr(extensions),
            user_agent: headers
                .get(axum::http::header::USER_AGENT)
                .and_then(|v| v.to_str().ok())
                .map(String::from),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }
}

impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<RequestContext>()
            .cloned()
            .unwrap_or_else(|| RequestContext::from_parts(parts)))
    }
}

/// Deadline applied to everything inside the tagging stage.
#[derive(Debug, Clone, Copy)]
pub struct RequestTimeout(pub Duration);

/// Attach a [`RequestContext`], open the request span and enforce the timeout.
pub async fn tag_request(
    State(RequestTimeout(timeout)): State<RequestTimeout>,
    mut req: Request,
    next: Next,
) -> axum::response::Response {
    let context = RequestContext::from_request(&req);
    req.extensions_mut().insert(context.clone());

    let remote_addr = context.remote_addr.map(|a| a.to_string());
    let span = info_span!(
        "request",
        request_id = %context.request_id,
        method = %context.method,
        path = %context.path,
        remote_addr = remote_addr.as_deref().unwrap_or("-"),
    );

    let mut response = async {
        tracing::debug!(
            user_agent = context.user_agent.as_deref().unwrap_or("-"),
            "handling request"
        );
        match tokio::time::timeout(timeout, next.run(req)).await {
            Ok(response) => response,
            Err(_) => {
                tracing::warn!(timeout_ms = timeout.as_millis() as u64, "request timed out");
                ApiError::timeout(timeout).into_response()
            }
        }
    }
    .instrument(span.clone())
    .await;

    span.in_scope(|| {
        tracing::info!(
            status = response.status().as_u16(),
            latency_ms = context.elapsed().as_secs_f64() * 1000.0,
            "request completed"
        );
    });

    response.extensions_mut().insert(context);
    response
}

/// Static header values stamped on every response.
#[derive(Debug, Clone)]
pub struct ResponseMetadata {
    api_version: HeaderValue,
    platform: HeaderValue,
}

impl ResponseMetadata {
    pub fn new(api_version: &str, platform: &str) -> Self {
        let fallback = || HeaderValue::from_static("unknown");
        Self {
            api_version: HeaderValue::from_str(api_version).unwrap_or_else(|_| fallback()),
            platform: HeaderValue::from_str(platform).unwrap_or_else(|_| fallback()),
        }
    }
}

/// Stamp version, platform and request id headers.
///
/// Wraps the tagging stage, so timeouts and captured panics are stamped too.
/// The id comes from the [`RequestContext`] tagging left on the response.
pub async fn response_metadata(
    State(meta): State<ResponseMetadata>,
    req: Request,
    next: Next,
) -> axum::response::Response {
    let inbound_id = extract_request_id(req.headers());

    let mut response = next.run(req).await;
    let request_id = response
        .extensions()
        .get::<RequestContext>()
        .map(|c| c.request_id.clone())
        .or(inbound_id)
        .unwrap_or_else(RequestId::generate);

    let headers = response.headers_mut();
    headers.insert(API_VERSION_HEADER, meta.api_version.clone());
    headers.insert(PLATFORM_HEADER, meta.platform.clone());
    if let Some(value) = request_id.header_value() {
        headers.insert(REQUEST_ID_HEADER, value);
    }
    response
}

/// Metric label for a request path.
///
/// Uses the matched route template so `/api/services/1` and
/// `/api/services/2` share one series. Unmatched requests share "unmatched".
pub fn route_label<B>(req: &Request<B>) -> String {
    req.extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string())
}

fn status_bucket(status: u16) -> &'static str {
    match status {
        200..=299 => "2xx",
        300..=399 => "3xx",
        400..=499 => "4xx",
        500..=599 => "5xx",
        _ => "other",
    }
}

fn content_length(headers: &HeaderMap) -> Option<f64> {
    headers
        .get(axum::http::header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<f64>().ok())
}

// =============================================================================
// MetricsLayer
// =============================================================================

/// Tower layer recording:
/// - `http_requests_total`: counter by method, route, status bucket
/// - `http_request_duration_seconds`: histogram by method, route
/// - `http_request_size_bytes` / `http_response_size_bytes`: histograms by method, route
#[derive(Debug, Clone)]
pub struct MetricsLayer;

impl<S> Layer<S> for MetricsLayer {
    type Service = MetricsMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        MetricsMiddleware { inner }
    }
}

#[derive(Debug, Clone)]
pub struct MetricsMiddleware<S> {
    inner: S,
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for MetricsMiddleware<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>> + Clone + Send + 'static,
    S::Future: Send,
    ReqBody: Send + 'static,
    ResBody: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = MetricsFuture<S::Future>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<ReqBody>) -> Self::Future {
        let method = req.method().to_string();
        let route = route_label(&req);

        if let Some(size) = content_length(req.headers()) {
            metrics::histogram!(
                "http_request_size_bytes",
                "method" => method.clone(),
                "path" => route.clone()
            )
            .record(size);
        }

        MetricsFuture {
            inner: self.inner.call(req),
            start: Instant::now(),
            method,
            route,
        }
    }
}

pin_project! {
    /// Future wrapper that records metrics on completion.
    pub struct MetricsFuture<F> {
        #[pin]
        inner: F,
        start: Instant,
        method: String,
        route: String,
    }
}

impl<F, ResBody, E> Future for MetricsFuture<F>
where
    F: Future<Output = Result<Response<ResBody>, E>>,
{
    type Output = F::Output;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();
        let result = match this.inner.poll(cx) {
            Poll::Pending => return Poll::Pending,
            Poll::Ready(result) => result,
        };

        let status = match &result {
            Ok(response) => {
                if let Some(size) = content_length(response.headers()) {
                    metrics::histogram!(
                        "http_response_size_bytes",
                        "method" => this.method.clone(),
                        "path" => this.route.clone()
                    )
                    .record(size);
                }
                status_bucket(response.status().as_u16())
            }
            Err(_) => "5xx",
        };

        metrics::counter!(
            "http_requests_total",
            "method" => this.method.clone(),
            "path" => this.route.clone(),
            "status" => status
        )
        .increment(1);
        metrics::histogram!(
            "http_request_duration_seconds",
            "method" => this.method.clone(),
            "path" => this.route.clone()
        )
        .record(this.start.elapsed().as_secs_f64());

        Poll::Ready(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    #[test]
    fn request_id_generate() {
        let id1 = RequestId::generate();
        let id2 = RequestId::generate();
        assert_ne!(id1, id2);
        assert_eq!(id1.as_str().len(), 36);
    }

    #[test]
    fn request_id_from_header() {
        let mut headers = HeaderMap::new();
        headers.insert("X-Request-ID", HeaderValue::from_static("trace-123"));
        assert_eq!(extract_or_generate_request_id(&headers).as_str(), "trace-123");
    }

    #[test]
    fn request_id_generated_when_missing_or_empty() {
        let headers = HeaderMap::new();
        assert_eq!(extract_or_generate_request_id(&headers).as_str().len(), 36);

        let mut headers = HeaderMap::new();
        headers.insert("x-request-id", HeaderValue::from_static(""));
        assert_eq!(extract_or_generate_request_id(&headers).as_str().len(), 36);
    }

    #[test]
    fn oversized_or_spaced_request_id_is_replaced() {
        let mut headers = HeaderMap::new();
        let long = "a".repeat(MAX_REQUEST_ID_LEN + 1);
        headers.insert("x-request-id", HeaderValue::from_str(&long).unwrap());
        assert!(extract_request_id(&headers).is_none());

        headers.insert("x-request-id", HeaderValue::from_static("has space"));
        assert!(extract_request_id(&headers).is_none());
    }

    #[test]
    fn context_reuses_inbound_id() {
        let req = axum::http::Request::builder()
            .method(Method::POST)
            .uri("/api/services?x=1")
            .header("x-request-id", "abc")
            .header("user-agent", "curl/8")
            .body(Body::empty())
            .unwrap();
        let ctx = RequestContext::from_request(&req);
        assert_eq!(ctx.request_id.as_str(), "abc");
        assert_eq!(ctx.path, "/api/services");
        assert_eq!(ctx.method, Method::POST);
        assert_eq!(ctx.user_agent.as_deref(), Some("curl/8"));
        assert_eq!(ctx.headers["x-request-id"], "abc");
        assert_eq!(ctx.headers.len(), 2);
        assert!(ctx.remote_addr.is_none());
    }

    #[test]
    fn peer_address_comes_from_either_listener() {
        let addr = SocketAddr::from(([198, 51, 100, 7], 5000));

        let mut extensions = Extensions::new();
        assert_eq!(peer_addr(&extensions), None);

        extensions.insert(ConnectInfo(TlsPeer(addr)));
        assert_eq!(peer_addr(&extensions), Some(addr));

        let mut extensions = Extensions::new();
        extensions.insert(ConnectInfo(addr));
        assert_eq!(peer_addr(&extensions), Some(addr));
    }

    #[test]
    fn unmatched_route_label() {
        let req = axum::http::Request::builder().uri("/nope/123").body(()).unwrap();
        assert_eq!(route_label(&req), "unmatched");
    }

    #[test]
    fn status_buckets() {
        assert_eq!(status_bucket(200), "2xx");
        assert_eq!(status_bucket(307), "3xx");
        assert_eq!(status_bucket(429), "4xx");
        assert_eq!(status_bucket(503), "5xx");
        assert_eq!(status_bucket(101), "other");
    }
}
