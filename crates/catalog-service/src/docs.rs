//! API description document and the interactive reference page.
//!
//! The document is read once at startup from the first candidate path that
//! exists. A malformed file is skipped with a warning; when nothing usable is
//! found a minimal document is generated from [`KNOWN_ROUTES`].

use std::path::{Path, PathBuf};

use axum::extract::State;
use axum::response::Html;
use axum::Json;
use serde_json::{Map, Value};
use utoipa::openapi::path::{HttpMethod, OperationBuilder, Paths};
use utoipa::openapi::response::ResponseBuilder;
use utoipa::OpenApi;

use catalog_service_shared::AppState;

use crate::routes::KNOWN_ROUTES;

const SWAGGER_PAGE: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8" />
  <title>Catalog API reference</title>
  <link rel="stylesheet" href="https://unpkg.com/swagger-ui-dist@5/swagger-ui.css" />
</head>
<body>
  <div id="swagger-ui"></div>
  <script src="https://unpkg.com/swagger-ui-dist@5/swagger-ui-bundle.js"></script>
  <script>
    window.onload = () => {
      window.ui = SwaggerUIBundle({ url: "/api-docs/openapi.json", dom_id: "#swagger-ui" });
    };
  </script>
</body>
</html>
"##;

/// Paths searched for the API description, most specific first.
pub fn candidate_paths(configured: Option<&Path>) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Some(path) = configured {
        paths.push(path.to_path_buf());
    }
    paths.push(PathBuf::from("docs/openapi.json"));
    paths.push(PathBuf::from("openapi.json"));
    paths.push(Path::new(env!("CARGO_MANIFEST_DIR")).join("../../docs/openapi.json"));
    paths
}

/// Load the first readable, well-formed document among `candidates`.
///
/// Falls back to [`stub_document`].
pub fn load_api_document(candidates: &[PathBuf], version: &str) -> Value {
    for path in candidates {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "cannot read API document");
                continue;
            }
        };
        match serde_json::from_str::<Value>(&contents) {
            Ok(document) if document.is_object() => {
                tracing::info!(path = %path.display(), "loaded API document");
                return document;
            }
            Ok(_) => {
                tracing::warn!(path = %path.display(), "API document is not a JSON object");
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "invalid API document");
            }
        }
    }

    tracing::info!("no API document found, serving generated stub");
    stub_document(version)
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Catalog API",
        description = "Services and software catalog with simulated AI endpoints."
    ),
    tags(
        (name = "catalog", description = "Services and software"),
        (name = "ai", description = "Simulated AI endpoints"),
        (name = "system", description = "Health, docs and metrics"),
    ),
)]
struct StubApiDoc;

fn http_method(method: &str) -> Option<HttpMethod> {
    match method {
        "GET" => Some(HttpMethod::Get),
        "POST" => Some(HttpMethod::Post),
        "PUT" => Some(HttpMethod::Put),
        "PATCH" => Some(HttpMethod::Patch),
        "DELETE" => Some(HttpMethod::Delete),
        _ => None,
    }
}

fn route_tag(path: &str) -> &'static str {
    if path.starts_with("/api/ai/") {
        "ai"
    } else if path.starts_with("/api/services") || path.starts_with("/api/software") {
        "catalog"
    } else {
        "system"
    }
}

/// Minimal OpenAPI document listing every known route.
pub fn stub_document(version: &str) -> Value {
    let mut document = StubApiDoc::openapi();
    document.info.version = version.to_string();

    let mut paths = Paths::new();
    for route in KNOWN_ROUTES {
        let Some(method) = http_method(route.method) else {
            continue;
        };
        let operation = OperationBuilder::new()
            .summary(Some(route.summary))
            .tag(route_tag(route.path))
            .response(
                "default",
                ResponseBuilder::new().description("JSON envelope").build(),
            )
            .build();
        paths.add_path_operation(route.path, vec![method], operation);
    }
    document.paths = paths;

    serde_json::to_value(&document).unwrap_or_else(|e| {
        tracing::error!(error = %e, "failed to serialize generated API document");
        Value::Object(Map::new())
    })
}

pub async fn swagger_page() -> Html<&'static str> {
    Html(SWAGGER_PAGE)
}

pub async fn openapi_document(State(state): State<AppState>) -> Json<Value> {
    match state.api_document() {
        Value::Null => Json(stub_document(&state.config().api_version)),
        document => Json(document.clone()),
    }
}
