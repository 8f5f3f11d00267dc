//! Request bodies, validation and the body and path extractors.

use axum::body::Bytes;
use axum::extract::path::ErrorKind as PathErrorKind;
use axum::extract::rejection::PathRejection;
use axum::extract::{Form, FromRequest, FromRequestParts, Path, Request};
use axum::http::header::CONTENT_TYPE;
use axum::http::request::Parts;
use axum::http::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use catalog_lib::{
    AnalysisType, AssessmentScope, CatalogEntry, Category, Choice, EntryId, OptimizationTarget,
    WorkflowType,
};

use crate::error::ApiError;

/// Turns a loosely typed request body into its checked form.
pub trait Validate {
    type Valid;

    fn validate(self) -> Result<Self::Valid, ApiError>;
}

/// Body extractor accepting JSON or form-urlencoded payloads.
///
/// An empty body is treated as `{}` so handlers report missing fields rather
/// than a parse failure. Oversized bodies become 413, malformed ones 400.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_ascii_lowercase());

        if content_type
            .as_deref()
            .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"))
        {
            return Form::<T>::from_request(req, state)
                .await
                .map(|Form(value)| ApiJson(value))
                .map_err(|rejection| {
                    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
                        ApiError::payload_too_large(rejection.body_text())
                    } else {
                        ApiError::validation("INVALID_BODY", rejection.body_text())
                    }
                });
        }

        let bytes = Bytes::from_request(req, state).await.map_err(|rejection| {
            if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
                ApiError::payload_too_large(rejection.body_text())
            } else {
                ApiError::validation("INVALID_BODY", rejection.body_text())
            }
        })?;

        let is_json = content_type.as_deref().map_or(true, |ct| {
            let essence = ct.split(';').next().unwrap_or(ct).trim();
            essence == "application/json" || essence.ends_with("+json")
        });
        if !bytes.is_empty() && !is_json {
            return Err(ApiError::validation(
                "UNSUPPORTED_CONTENT_TYPE",
                "Request body must be JSON or form-urlencoded",
            )
            .with_status(StatusCode::UNSUPPORTED_MEDIA_TYPE)
            .with_label("Unsupported Media Type"));
        }

        let raw: &[u8] = if bytes.is_empty() { b"{}" } else { &bytes };
        serde_json::from_slice(raw).map(ApiJson).map_err(|err| {
            if err.is_data() {
                let message = format!("Request body has the wrong shape: {}", err);
                ApiError::validation("INVALID_BODY", message)
            } else {
                let message = format!("Request body is not valid JSON: {}", err);
                ApiError::validation("INVALID_JSON", message)
            }
        })
    }
}

/// Path extractor whose rejections go through the error envelope.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiPath<T>(pub T);

impl<S, T> FromRequestParts<S> for ApiPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Path::<T>::from_request_parts(parts, state)
            .await
            .map(|Path(value)| ApiPath(value))
            .map_err(path_rejection)
    }
}

fn path_rejection(rejection: PathRejection) -> ApiError {
    if rejection.status().is_server_error() {
        return ApiError::internal("Route parameters are unavailable")
            .with_internal(rejection.body_text());
    }

    let parameter = match &rejection {
        PathRejection::FailedToDeserializePathParams(e) => match e.kind() {
            PathErrorKind::InvalidUtf8InPathParam { key } => Some(key.clone()),
            PathErrorKind::ParseErrorAtKey { key, .. } => Some(key.clone()),
            PathErrorKind::DeserializeError { key, .. } => Some(key.clone()),
            _ => None,
        },
        _ => None,
    };

    let error = ApiError::validation("INVALID_PATH", rejection.body_text());
    match parameter {
        Some(parameter) => error.with_extra("parameter", parameter),
        None => error,
    }
}

fn choice<C: Choice>(value: Option<&str>) -> Result<C, ApiError> {
    C::require(value).map_err(ApiError::from)
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SoftwareAnalysisRequest {
    pub analysis_type: Option<String>,
    pub target: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ValidAnalysis {
    pub analysis_type: AnalysisType,
    pub target: Option<String>,
}

impl Validate for SoftwareAnalysisRequest {
    type Valid = ValidAnalysis;

    fn validate(self) -> Result<ValidAnalysis, ApiError> {
        Ok(ValidAnalysis {
            analysis_type: choice(self.analysis_type.as_deref())?,
            target: self
                .target
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty()),
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AutomationWorkflowRequest {
    pub workflow_type: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ValidWorkflow {
    pub workflow_type: WorkflowType,
    pub name: Option<String>,
}

impl Validate for AutomationWorkflowRequest {
    type Valid = ValidWorkflow;

    fn validate(self) -> Result<ValidWorkflow, ApiError> {
        Ok(ValidWorkflow {
            workflow_type: choice(self.workflow_type.as_deref())?,
            name: self.name.filter(|n| !n.trim().is_empty()),
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceOptimizationRequest {
    pub target: Option<String>,
}

impl Validate for PerformanceOptimizationRequest {
    type Valid = OptimizationTarget;

    fn validate(self) -> Result<OptimizationTarget, ApiError> {
        choice(self.target.as_deref())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityAssessmentRequest {
    pub scope: Option<String>,
}

impl Validate for SecurityAssessmentRequest {
    type Valid = AssessmentScope;

    fn validate(self) -> Result<AssessmentScope, ApiError> {
        choice(self.scope.as_deref())
    }
}

/// Body of a simulated service creation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CreateEntryRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<String>,
    pub category: Option<String>,
    pub features: Vec<String>,
    pub technologies: Vec<String>,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub delivery_time: Option<String>,
}

/// A creation request that passed validation but has no id yet.
#[derive(Debug, Clone)]
pub struct EntryDraft {
    request: CreateEntryRequest,
    name: String,
    category: Category,
}

impl EntryDraft {
    pub fn into_entry(self, id: EntryId) -> CatalogEntry {
        let r = self.request;
        CatalogEntry {
            id,
            name: self.name,
            description: r.description.unwrap_or_default(),
            price: r.price.unwrap_or_else(|| "Contact for pricing".to_string()),
            category: self.category,
            features: r.features,
            technologies: r.technologies,
            icon: r.icon.unwrap_or_else(|| "box".to_string()),
            color: r.color.unwrap_or_else(|| "#6366f1".to_string()),
            delivery_time: r.delivery_time.unwrap_or_else(|| "To be agreed".to_string()),
        }
    }
}

fn required_name(name: Option<&str>) -> Result<String, ApiError> {
    name.map(str::trim)
        .filter(|n| !n.is_empty())
        .map(String::from)
        .ok_or_else(|| ApiError::from(catalog_lib::Error::MissingField { field: "name" }))
}

fn category(value: &str) -> Result<Category, ApiError> {
    Category::parse(value).ok_or_else(|| {
        let supported: Vec<&str> = Category::ALL.iter().map(|c| c.as_str()).collect();
        ApiError::invalid_parameters(
            "category",
            format!("'{}' is not a supported category", value),
            &supported,
        )
    })
}

impl Validate for CreateEntryRequest {
    type Valid = EntryDraft;

    fn validate(self) -> Result<EntryDraft, ApiError> {
        let name = required_name(self.name.as_deref())?;
        let category = match self.category.as_deref() {
            Some(raw) => category(raw)?,
            None => {
                return Err(ApiError::from(catalog_lib::Error::MissingField {
                    field: "category",
                }))
            }
        };
        Ok(EntryDraft {
            request: self,
            name,
            category,
        })
    }
}

/// Body of a simulated service update. Absent fields keep current values.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UpdateEntryRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<String>,
    pub category: Option<String>,
    pub features: Option<Vec<String>>,
    pub technologies: Option<Vec<String>>,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub delivery_time: Option<String>,
}

impl UpdateEntryRequest {
    /// Produce the updated copy of `current` without touching the store.
    pub fn apply_to(self, current: &CatalogEntry) -> Result<CatalogEntry, ApiError> {
        let mut updated = current.clone();
        if self.name.is_some() {
            updated.name = required_name(self.name.as_deref())?;
        }
        if let Some(raw) = self.category.as_deref() {
            updated.category = category(raw)?;
        }
        if let Some(description) = self.description {
            updated.description = description;
        }
        if let Some(price) = self.price {
            updated.price = price;
        }
        if let Some(features) = self.features {
            updated.features = features;
        }
        if let Some(technologies) = self.technologies {
            updated.technologies = technologies;
        }
        if let Some(icon) = self.icon {
            updated.icon = icon;
        }
        if let Some(color) = self.color {
            updated.color = color;
        }
        if let Some(delivery_time) = self.delivery_time {
            updated.delivery_time = delivery_time;
        }
        Ok(updated)
    }
}
