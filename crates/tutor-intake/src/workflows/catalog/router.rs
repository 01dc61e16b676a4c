use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::shared::SharedCategoryCatalog;
use super::tree::{CategoryError, CategoryId, NewCategory};

#[derive(Debug, Deserialize)]
pub struct CategoryUpdate {
    pub label: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Admin endpoints for maintaining the category hierarchy.
pub fn category_router(catalog: Arc<SharedCategoryCatalog>) -> Router {
    Router::new()
        .route(
            "/api/v1/categories",
            get(list_handler).post(create_handler),
        )
        .route(
            "/api/v1/categories/:category_id",
            get(fetch_handler)
                .put(update_handler)
                .delete(delete_handler),
        )
        .with_state(catalog)
}

pub(crate) async fn list_handler(State(catalog): State<Arc<SharedCategoryCatalog>>) -> Response {
    match catalog.snapshot() {
        Ok(categories) => (StatusCode::OK, axum::Json(categories)).into_response(),
        Err(err) => category_error(err),
    }
}

pub(crate) async fn fetch_handler(
    State(catalog): State<Arc<SharedCategoryCatalog>>,
    Path(category_id): Path<String>,
) -> Response {
    let id = CategoryId(category_id);
    match catalog.get(&id) {
        Ok(Some(category)) => (StatusCode::OK, axum::Json(category)).into_response(),
        Ok(None) => category_error(CategoryError::NotFound(id)),
        Err(err) => category_error(err),
    }
}

pub(crate) async fn create_handler(
    State(catalog): State<Arc<SharedCategoryCatalog>>,
    request: Result<axum::Json<NewCategory>, JsonRejection>,
) -> Response {
    let axum::Json(request) = match request {
        Ok(body) => body,
        Err(rejection) => return invalid_body(rejection),
    };
    match catalog.insert(request) {
        Ok(category) => {
            tracing::info!(category = %category.id, "category created");
            (StatusCode::CREATED, axum::Json(category)).into_response()
        }
        Err(err) => category_error(err),
    }
}

pub(crate) async fn update_handler(
    State(catalog): State<Arc<SharedCategoryCatalog>>,
    Path(category_id): Path<String>,
    update: Result<axum::Json<CategoryUpdate>, JsonRejection>,
) -> Response {
    let axum::Json(update) = match update {
        Ok(body) => body,
        Err(rejection) => return invalid_body(rejection),
    };
    let id = CategoryId(category_id);
    match catalog.rename(&id, &update.label, update.description) {
        Ok(category) => (StatusCode::OK, axum::Json(category)).into_response(),
        Err(err) => category_error(err),
    }
}

pub(crate) async fn delete_handler(
    State(catalog): State<Arc<SharedCategoryCatalog>>,
    Path(category_id): Path<String>,
) -> Response {
    let id = CategoryId(category_id);
    match catalog.remove(&id) {
        Ok(category) => {
            tracing::info!(category = %category.id, "category removed");
            (StatusCode::OK, axum::Json(category)).into_response()
        }
        Err(err) => category_error(err),
    }
}

fn invalid_body(rejection: JsonRejection) -> Response {
    let payload = json!({ "error": rejection.body_text(), "kind": "invalid_body" });
    (rejection.status(), axum::Json(payload)).into_response()
}

fn category_error(err: CategoryError) -> Response {
    let status = match err {
        CategoryError::EmptyLabel
        | CategoryError::UnknownParent(_)
        | CategoryError::DepthExceeded { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        CategoryError::DuplicateId(_) | CategoryError::HasChildren(_) => StatusCode::CONFLICT,
        CategoryError::NotFound(_) => StatusCode::NOT_FOUND,
        CategoryError::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
    };

    let payload = json!({ "error": err.to_string(), "kind": err.kind() });
    (status, axum::Json(payload)).into_response()
}
