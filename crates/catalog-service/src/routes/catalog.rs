//! Catalog collection handlers.
//!
//! Reads serve the bundled tables unchanged. Service mutations are validated
//! and answered as if applied; the catalog itself never changes.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use serde::Serialize;
use serde_json::{Map, Value};

use catalog_lib::{parse_entry_id, CatalogEntry, CatalogStore, Category, EntryId};
use catalog_service_shared::{
    record_catalog_lookup, record_simulation, ApiError, ApiJson, ApiPath, ApiResponse, AppState,
    CatalogRead, CreateEntryRequest, RequestContext, UpdateEntryRequest, Validate,
};

use super::Simulated;

pub(super) fn services_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_services).post(create_service))
        .route(
            "/{id}",
            get(get_service).put(update_service).delete(delete_service),
        )
        .route("/category/{category}", get(services_by_category))
}

pub(super) fn software_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_software))
        .route("/{id}", get(get_software))
        .route("/category/{category}", get(software_by_category))
}

#[derive(Debug, Serialize)]
pub(crate) struct CatalogList {
    data: Vec<CatalogEntry>,
    metadata: Map<String, Value>,
}

#[derive(Debug, Serialize)]
pub(crate) struct CatalogItem {
    data: CatalogEntry,
}

#[derive(Debug, Serialize)]
pub(crate) struct CategoryListing {
    category: String,
    count: usize,
    data: Vec<CatalogEntry>,
}

#[derive(Debug, Serialize)]
pub(crate) struct Deleted {
    id: EntryId,
    name: String,
    deleted: bool,
}

fn list(store: &CatalogStore, ctx: &RequestContext, noun: &str) -> CatalogRead<CatalogList> {
    let categories: Vec<&'static str> = store
        .categories()
        .into_iter()
        .map(Category::as_str)
        .collect();

    let mut metadata = Map::new();
    metadata.insert(format!("total_{}", store.collection()), Value::from(store.len()));
    metadata.insert("count".to_string(), Value::from(store.len()));
    metadata.insert("categories".to_string(), Value::from(categories));

    record_catalog_lookup(store.collection(), "listed");
    CatalogRead(ApiResponse::new(
        format!("{} retrieved successfully", noun),
        ctx,
        CatalogList {
            data: store.entries().to_vec(),
            metadata,
        },
    ))
}

fn find<'a>(store: &'a CatalogStore, raw_id: &str) -> Result<&'a CatalogEntry, ApiError> {
    let id = parse_entry_id(raw_id)?;
    match store.require(id) {
        Ok(entry) => {
            record_catalog_lookup(store.collection(), "found");
            Ok(entry)
        }
        Err(e) => {
            record_catalog_lookup(store.collection(), "not_found");
            Err(e.into())
        }
    }
}

fn get_one(
    store: &CatalogStore,
    raw_id: &str,
    ctx: &RequestContext,
    noun: &str,
) -> Result<CatalogRead<CatalogItem>, ApiError> {
    let entry = find(store, raw_id)?;
    Ok(CatalogRead(ApiResponse::new(
        format!("{} retrieved successfully", noun),
        ctx,
        CatalogItem {
            data: entry.clone(),
        },
    )))
}

fn in_category(
    store: &CatalogStore,
    category: &str,
    ctx: &RequestContext,
    noun: &str,
) -> CatalogRead<CategoryListing> {
    let data: Vec<CatalogEntry> = store
        .by_category_name(category)
        .into_iter()
        .cloned()
        .collect();

    record_catalog_lookup(store.collection(), "filtered");
    CatalogRead(ApiResponse::new(
        format!("{} in category '{}' retrieved successfully", noun, category),
        ctx,
        CategoryListing {
            category: category.to_string(),
            count: data.len(),
            data,
        },
    ))
}

async fn list_services(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> CatalogRead<CatalogList> {
    list(&state.catalog().services, &ctx, "Services")
}

async fn get_service(
    State(state): State<AppState>,
    ctx: RequestContext,
    ApiPath(id): ApiPath<String>,
) -> Result<CatalogRead<CatalogItem>, ApiError> {
    get_one(&state.catalog().services, &id, &ctx, "Service")
}

async fn services_by_category(
    State(state): State<AppState>,
    ctx: RequestContext,
    ApiPath(category): ApiPath<String>,
) -> CatalogRead<CategoryListing> {
    in_category(&state.catalog().services, &category, &ctx, "Services")
}

async fn list_software(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> CatalogRead<CatalogList> {
    list(&state.catalog().software, &ctx, "Software")
}

async fn get_software(
    State(state): State<AppState>,
    ctx: RequestContext,
    ApiPath(id): ApiPath<String>,
) -> Result<CatalogRead<CatalogItem>, ApiError> {
    get_one(&state.catalog().software, &id, &ctx, "Software")
}

async fn software_by_category(
    State(state): State<AppState>,
    ctx: RequestContext,
    ApiPath(category): ApiPath<String>,
) -> CatalogRead<CategoryListing> {
    in_category(&state.catalog().software, &category, &ctx, "Software")
}

async fn create_service(
    State(state): State<AppState>,
    ctx: RequestContext,
    ApiJson(body): ApiJson<CreateEntryRequest>,
) -> Result<ApiResponse<Simulated<CatalogEntry>>, ApiError> {
    let draft = body.validate()?;
    let entry = draft.into_entry(state.catalog().services.next_id());

    tracing::info!(id = entry.id, name = %entry.name, "simulated service creation");
    record_simulation("service_create");
    Ok(ApiResponse::new("Service created successfully", &ctx, Simulated::new(entry))
        .with_status(StatusCode::CREATED))
}

async fn update_service(
    State(state): State<AppState>,
    ctx: RequestContext,
    ApiPath(id): ApiPath<String>,
    ApiJson(body): ApiJson<UpdateEntryRequest>,
) -> Result<ApiResponse<Simulated<CatalogEntry>>, ApiError> {
    let current = find(&state.catalog().services, &id)?;
    let updated = body.apply_to(current)?;

    tracing::info!(id = updated.id, "simulated service update");
    record_simulation("service_update");
    Ok(ApiResponse::new("Service updated successfully", &ctx, Simulated::new(updated)))
}

async fn delete_service(
    State(state): State<AppState>,
    ctx: RequestContext,
    ApiPath(id): ApiPath<String>,
) -> Result<ApiResponse<Simulated<Deleted>>, ApiError> {
    let entry = find(&state.catalog().services, &id)?;

    tracing::info!(id = entry.id, "simulated service deletion");
    record_simulation("service_delete");
    Ok(ApiResponse::new(
        "Service deleted successfully",
        &ctx,
        Simulated::new(Deleted {
            id: entry.id,
            name: entry.name.clone(),
            deleted: true,
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Method;
    use catalog_service_shared::test_utils::{test_context, test_state};

    #[test]
    fn list_metadata_counts_collection() {
        let state = test_state();
        let ctx = test_context(Method::GET, "/api/services");
        let CatalogRead(response) = list(&state.catalog().services, &ctx, "Services");

        assert_eq!(response.data.data.len(), 10);
        assert_eq!(response.data.metadata["total_services"], 10);
        assert_eq!(response.request_id, ctx.request_id.to_string());
    }

    #[test]
    fn find_distinguishes_bad_and_unknown_ids() {
        let state = test_state();
        let services = &state.catalog().services;

        assert_eq!(find(services, "1").unwrap().id, 1);
        assert_eq!(find(services, "abc").unwrap_err().code(), "INVALID_ID");
        assert_eq!(find(services, "999").unwrap_err().code(), "SERVICE_NOT_FOUND");
    }

    #[test]
    fn category_listing_is_case_insensitive() {
        let state = test_state();
        let ctx = test_context(Method::GET, "/api/services/category/AI");
        let CatalogRead(response) = in_category(&state.catalog().services, "AI", &ctx, "Services");

        assert!(response.data.count > 0);
        assert!(response.data.data.iter().all(|e| e.category == Category::Ai));
    }
}
