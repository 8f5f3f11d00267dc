//! Failure signalling and the error responder.
//!
//! Handlers and middleware never write error bodies. They return an
//! [`ApiError`], whose `IntoResponse` impl produces a bodiless response with
//! the error stored in its extensions. The [`error_responder`] stage, which
//! sits outside tagging, is the only place that turns an error into an
//! [`ErrorEnvelope`]. It also wraps unmarked 4xx/5xx responses produced by
//! the framework itself (405, 413, plain-text rejections) so every failure has
//! the same shape.

use std::any::Any;
use std::time::Duration;

use axum::extract::{Request, State};
use axum::http::header::{CONTENT_ENCODING, CONTENT_LENGTH, CONTENT_TYPE};
use axum::http::{HeaderValue, Method, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use catalog_lib::Error as LibError;

use crate::config::Environment;
use crate::metrics::record_error;
use crate::middleware::{extract_request_id, RequestContext, RequestId, REQUEST_ID_HEADER};
use crate::response::timestamp_now;

const GENERIC_INTERNAL_MESSAGE: &str = "An internal error occurred. Please try again later.";

/// Failure category. Each kind has a default status, label and retry hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    RateLimit,
    NotFound,
    Internal,
}

impl ErrorKind {
    pub fn default_status(self) -> StatusCode {
        match self {
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::RateLimit => StatusCode::TOO_MANY_REQUESTS,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ErrorKind::Validation => "Validation Error",
            ErrorKind::RateLimit => "Too Many Requests",
            ErrorKind::NotFound => "Not Found",
            ErrorKind::Internal => "Internal Server Error",
        }
    }

    pub fn retryable(self) -> bool {
        matches!(self, ErrorKind::RateLimit | ErrorKind::Internal)
    }

    fn suggested_action(self) -> &'static str {
        match self {
            ErrorKind::Validation => "Check the request parameters and try again",
            ErrorKind::RateLimit => "Wait for the rate limit window to reset before retrying",
            ErrorKind::NotFound => "Check the URL or see /api-docs for available routes",
            ErrorKind::Internal => "Retry the request later or contact support if it persists",
        }
    }
}

/// An error raised anywhere in the pipeline.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{code}: {message}")]
pub struct ApiError {
    kind: ErrorKind,
    status: StatusCode,
    label: Option<String>,
    code: String,
    message: String,
    suggested_action: Option<String>,
    extra: Map<String, Value>,
    internal: Option<String>,
}

impl ApiError {
    pub fn new(kind: ErrorKind, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            status: kind.default_status(),
            label: None,
            code: code.into(),
            message: message.into(),
            suggested_action: None,
            extra: Map::new(),
            internal: None,
        }
    }

    pub fn validation(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, code, message)
    }

    pub fn not_found(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, code, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, "INTERNAL_ERROR", message)
    }

    /// 400 for a field outside its enumeration; lists the accepted values.
    pub fn invalid_parameters(field: &str, message: impl Into<String>, supported: &[&str]) -> Self {
        Self::validation("INVALID_PARAMETERS", message)
            .with_label("Invalid parameters")
            .with_extra("field", field)
            .with_extra("supportedTypes", supported)
            .with_suggested_action(format!("Use one of: {}", supported.join(", ")))
    }

    /// 404 for a path no route matches.
    pub fn route_not_found(method: &Method, path: &str, available: Vec<String>) -> Self {
        Self::not_found(
            "ROUTE_NOT_FOUND",
            format!("Route {} {} not found", method, path),
        )
        .with_extra("availableRoutes", available)
    }

    pub fn method_not_allowed(method: &Method, path: &str) -> Self {
        Self::validation(
            "METHOD_NOT_ALLOWED",
            format!("Method {} is not allowed on {}", method, path),
        )
        .with_status(StatusCode::METHOD_NOT_ALLOWED)
        .with_label("Method Not Allowed")
    }

    pub fn payload_too_large(detail: impl Into<String>) -> Self {
        Self::validation("PAYLOAD_TOO_LARGE", "Request body exceeds the allowed size")
            .with_status(StatusCode::PAYLOAD_TOO_LARGE)
            .with_label("Payload Too Large")
            .with_internal(detail)
            .with_suggested_action("Send a smaller request body")
    }

    /// 503 raised when the request timeout elapses.
    pub fn timeout(limit: Duration) -> Self {
        Self::new(
            ErrorKind::Internal,
            "REQUEST_TIMEOUT",
            format!("Request did not complete within {} ms", limit.as_millis()),
        )
        .with_status(StatusCode::SERVICE_UNAVAILABLE)
        .with_label("Service Unavailable")
    }

    /// 429 with the seconds until the caller's window resets.
    pub fn rate_limited(code: &str, limit: u32, retry_after_secs: u64) -> Self {
        Self::new(
            ErrorKind::RateLimit,
            code,
            format!("Rate limit of {} requests per window exceeded", limit),
        )
        .with_extra("retryAfter", retry_after_secs)
        .with_extra("limit", limit)
        .with_suggested_action(format!("Wait {} seconds before retrying", retry_after_secs))
    }

    /// Error for a bodiless failure status produced outside any handler.
    pub fn from_status(status: StatusCode, method: &Method, path: &str) -> Self {
        match status {
            StatusCode::METHOD_NOT_ALLOWED => Self::method_not_allowed(method, path),
            StatusCode::PAYLOAD_TOO_LARGE => {
                Self::payload_too_large(format!("{} {}", method, path))
            }
            StatusCode::NOT_FOUND => Self::not_found(
                "NOT_FOUND",
                format!("Resource {} {} not found", method, path),
            ),
            s if s.is_client_error() => Self::validation(
                "REQUEST_REJECTED",
                s.canonical_reason().unwrap_or("Request rejected"),
            )
            .with_status(s),
            s => Self::internal(s.canonical_reason().unwrap_or("Server error")).with_status(s),
        }
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_suggested_action(mut self, action: impl Into<String>) -> Self {
        self.suggested_action = Some(action.into());
        self
    }

    /// Attach an extra top-level envelope field such as `field` or `retryAfter`.
    pub fn with_extra(mut self, key: &str, value: impl Serialize) -> Self {
        if let Ok(value) = serde_json::to_value(value) {
            self.extra.insert(key.to_string(), value);
        }
        self
    }

    /// Diagnostic detail. Exposed as `stack` outside production only.
    pub fn with_internal(mut self, detail: impl Into<String>) -> Self {
        self.internal = Some(detail.into());
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn extra(&self) -> &Map<String, Value> {
        &self.extra
    }
}

impl From<LibError> for ApiError {
    fn from(err: LibError) -> Self {
        match &err {
            LibError::InvalidId { .. } => {
                ApiError::validation("INVALID_ID", err.to_string()).with_extra("field", "id")
            }
            LibError::EntryNotFound { collection, .. } => {
                let code = match collection.as_str() {
                    "services" => "SERVICE_NOT_FOUND".to_string(),
                    other => format!("{}_NOT_FOUND", other.to_ascii_uppercase()),
                };
                ApiError::not_found(code, err.to_string())
            }
            LibError::UnsupportedValue {
                field, supported, ..
            } => ApiError::invalid_parameters(field, err.to_string(), supported),
            LibError::MissingField { field } => {
                ApiError::validation("MISSING_FIELD", err.to_string()).with_extra("field", *field)
            }
            LibError::DuplicateId { .. } => {
                ApiError::internal("Catalog data is inconsistent").with_internal(err.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut response = self.status.into_response();
        response.extensions_mut().insert(self);
        response
    }
}

/// The uniform failure body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorEnvelope {
    error: String,
    message: String,
    code: String,
    timestamp: String,
    request_id: String,
    retryable: bool,
    suggested_action: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    stack: Option<String>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl ErrorEnvelope {
    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn stack(&self) -> Option<&str> {
        self.stack.as_deref()
    }

    pub fn extra(&self) -> &Map<String, Value> {
        &self.extra
    }
}

/// Builds envelopes. Production mode hides internal messages and diagnostics.
#[derive(Debug, Clone, Copy)]
pub struct ErrorResponder {
    expose_internal: bool,
}

impl ErrorResponder {
    pub fn new(environment: Environment) -> Self {
        Self {
            expose_internal: !environment.is_production(),
        }
    }

    pub fn envelope(&self, error: &ApiError, request_id: &RequestId) -> ErrorEnvelope {
        let hide = error.kind == ErrorKind::Internal && !self.expose_internal;
        ErrorEnvelope {
            error: error
                .label
                .clone()
                .unwrap_or_else(|| error.kind.label().to_string()),
            message: if hide {
                GENERIC_INTERNAL_MESSAGE.to_string()
            } else {
                error.message.clone()
            },
            code: error.code.clone(),
            timestamp: timestamp_now(),
            request_id: request_id.to_string(),
            retryable: error.kind.retryable(),
            suggested_action: error
                .suggested_action
                .clone()
                .unwrap_or_else(|| error.kind.suggested_action().to_string()),
            stack: if self.expose_internal {
                error.internal.clone()
            } else {
                None
            },
            extra: error.extra.clone(),
        }
    }

    /// Replace the body of `response` with the envelope for `error`, keeping
    /// headers set by inner stages.
    pub fn render(&self, error: &ApiError, request_id: &RequestId, response: Response) -> Response {
        let envelope = self.envelope(error, request_id);
        let (mut parts, _) = response.into_parts();
        let (_, body) = Json(envelope).into_response().into_parts();

        parts.status = error.status;
        parts.headers.remove(CONTENT_LENGTH);
        parts.headers.remove(CONTENT_ENCODING);
        parts
            .headers
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if !parts.headers.contains_key(REQUEST_ID_HEADER) {
            if let Some(value) = request_id.header_value() {
                parts.headers.insert(REQUEST_ID_HEADER, value);
            }
        }
        Response::from_parts(parts, body)
    }
}

/// Whether a response without an [`ApiError`] marker still needs an envelope.
///
/// Any failure that is not already JSON qualifies.
fn is_bare_failure(response: &Response) -> bool {
    let status = response.status();
    if !(status.is_client_error() || status.is_server_error()) {
        return false;
    }
    let essence = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(|v| v.trim().to_ascii_lowercase());
    essence.as_deref() != Some("application/json")
}

/// Pipeline stage that renders every failure as an [`ErrorEnvelope`].
pub async fn error_responder(
    State(responder): State<ErrorResponder>,
    req: Request,
    next: Next,
) -> Response {
    let inbound_id = extract_request_id(req.headers());
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let mut response = next.run(req).await;

    let marker = response.extensions_mut().remove::<ApiError>();
    let error = match marker {
        Some(error) => error,
        None if is_bare_failure(&response) => {
            ApiError::from_status(response.status(), &method, &path)
        }
        None => return response,
    };

    let request_id = response
        .extensions()
        .get::<RequestContext>()
        .map(|ctx| ctx.request_id.clone())
        .or(inbound_id)
        .unwrap_or_else(RequestId::generate);

    if error.status.is_server_error() {
        tracing::error!(
            request_id = %request_id,
            code = %error.code,
            status = error.status.as_u16(),
            %method,
            %path,
            detail = error.internal.as_deref().unwrap_or(&error.message),
            "request failed"
        );
    } else {
        tracing::warn!(
            request_id = %request_id,
            code = %error.code,
            status = error.status.as_u16(),
            %method,
            %path,
            message = %error.message,
            "request rejected"
        );
    }
    record_error(&error.code, error.status.as_u16());

    responder.render(&error, &request_id, response)
}

/// Panic handler for `CatchPanicLayer::custom`.
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else {
        "handler panicked".to_string()
    };
    ApiError::internal("Unexpected failure while handling the request")
        .with_internal(detail)
        .into_response()
}
