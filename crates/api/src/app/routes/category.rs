use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, patch, post},
};

use bistro_core::CategoryId;

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::CurrentUser;

pub fn read_router() -> Router {
    Router::new().route("/api/category", get(list_categories))
}

pub fn owner_router() -> Router {
    Router::new()
        .route("/api/category", post(create_category))
        .route("/api/category/:category_id", patch(update_category))
        .route("/api/category/:category_id", delete(delete_category))
}

pub async fn create_category(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<CurrentUser>,
    Json(body): Json<dto::CategoryRequest>,
) -> axum::response::Response {
    let draft = match body.into_draft() {
        Ok(d) => d,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.create_category(user.id(), draft).await {
        Ok(category) => (
            StatusCode::CREATED,
            Json(serde_json::json!({
                "message": "category created",
                "data": dto::category_to_json(&category),
            })),
        )
            .into_response(),
        Err(e) => errors::api_error_to_response(e),
    }
}

pub async fn list_categories(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.list_categories().await {
        Ok(categories) => {
            let data = categories.iter().map(dto::category_to_json).collect::<Vec<_>>();
            (StatusCode::OK, Json(serde_json::json!({ "data": data }))).into_response()
        }
        Err(e) => errors::api_error_to_response(e),
    }
}

pub async fn update_category(
    Extension(services): Extension<Arc<AppServices>>,
    Path(category_id): Path<String>,
    Json(body): Json<dto::CategoryRequest>,
) -> axum::response::Response {
    let category_id: CategoryId = match category_id.parse() {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };
    let update = match body.into_update() {
        Ok(u) => u,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.update_category(category_id, update).await {
        Ok(category) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "message": "category updated",
                "data": dto::category_to_json(&category),
            })),
        )
            .into_response(),
        Err(e) => errors::api_error_to_response(e),
    }
}

pub async fn delete_category(
    Extension(services): Extension<Arc<AppServices>>,
    Path(category_id): Path<String>,
) -> axum::response::Response {
    let category_id: CategoryId = match category_id.parse() {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.delete_category(category_id).await {
        Ok(_) => (
            StatusCode::OK,
            Json(serde_json::json!({ "message": "category deleted" })),
        )
            .into_response(),
        Err(e) => errors::api_error_to_response(e),
    }
}
