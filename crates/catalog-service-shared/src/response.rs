//! Success response bodies.

use axum::http::header::{CACHE_CONTROL, EXPIRES, PRAGMA};
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::middleware::RequestContext;

/// Current time as an RFC 3339 string with millisecond precision.
pub fn timestamp_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Envelope for every successful JSON body.
///
/// `data` is flattened, so a payload struct with `data` and `metadata`
/// fields produces `{"message", "timestamp", "requestId", "data", "metadata"}`.
///
/// ```
/// use catalog_service_shared::{ApiResponse, RequestContext};
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Count {
///     count: usize,
/// }
///
/// fn respond(ctx: &RequestContext) -> ApiResponse<Count> {
///     ApiResponse::new("Counted", ctx, Count { count: 3 })
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub message: String,
    pub timestamp: String,
    pub request_id: String,
    #[serde(flatten)]
    pub data: T,
    #[serde(skip)]
    status: Option<StatusCode>,
}

impl<T> ApiResponse<T> {
    pub fn new(message: impl Into<String>, ctx: &RequestContext, data: T) -> Self {
        Self {
            message: message.into(),
            timestamp: timestamp_now(),
            request_id: ctx.request_id.to_string(),
            data,
            status: None,
        }
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = Some(status);
        self
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = self.status.unwrap_or(StatusCode::OK);
        (status, Json(self)).into_response()
    }
}

/// Catalog read response. Adds headers that forbid any caching so clients
/// always see current catalog content.
#[derive(Debug, Clone)]
pub struct CatalogRead<T>(pub ApiResponse<T>);

impl<T: Serialize> IntoResponse for CatalogRead<T> {
    fn into_response(self) -> Response {
        let mut response = self.0.into_response();
        let headers = response.headers_mut();
        headers.insert(
            CACHE_CONTROL,
            HeaderValue::from_static("no-cache, no-store, must-revalidate, private"),
        );
        headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));
        headers.insert(EXPIRES, HeaderValue::from_static("0"));
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::RequestId;
    use axum::body::to_bytes;
    use axum::http::{HeaderMap, Method};

    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
    struct Payload {
        data: Vec<u32>,
    }

    fn context(id: &str) -> RequestContext {
        RequestContext {
            request_id: RequestId::new(id),
            received_at: Utc::now(),
            started_at: std::time::Instant::now(),
            method: Method::GET,
            path: "/api/services".to_string(),
            headers: HeaderMap::new(),
            remote_addr: None,
            user_agent: None,
        }
    }

    #[tokio::test]
    async fn flattens_payload_and_embeds_request_id() {
        let response =
            ApiResponse::new("ok", &context("req-9"), Payload { data: vec![1, 2] }).into_response();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["message"], "ok");
        assert_eq!(body["requestId"], "req-9");
        assert_eq!(body["data"], serde_json::json!([1, 2]));
        assert!(body.get("status").is_none());
    }

    #[test]
    fn custom_status() {
        let response = ApiResponse::new("made", &context("r"), Payload { data: vec![] })
            .with_status(StatusCode::CREATED)
            .into_response();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    #[test]
    fn catalog_reads_forbid_caching() {
        let response = CatalogRead(ApiResponse::new("ok", &context("r"), Payload { data: vec![] }))
            .into_response();
        assert_eq!(
            response.headers()[CACHE_CONTROL],
            "no-cache, no-store, must-revalidate, private"
        );
        assert_eq!(response.headers()[PRAGMA], "no-cache");
        assert_eq!(response.headers()[EXPIRES], "0");
    }

    #[test]
    fn timestamp_is_rfc3339() {
        let ts = timestamp_now();
        assert!(chrono::DateTime::parse_from_rfc3339(&ts).is_ok());
        assert!(ts.ends_with('Z'));
    }
}
