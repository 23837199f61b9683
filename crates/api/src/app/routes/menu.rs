use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, patch, post},
};

use bistro_core::{CategoryId, DomainResult, MenuId};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn read_router() -> Router {
    Router::new()
        .route("/api/category/:category_id/menu", get(list_menus))
        .route("/api/category/:category_id/menu/:menu_id", get(get_menu))
}

pub fn owner_router() -> Router {
    Router::new()
        .route("/api/category/:category_id/menu", post(create_menu))
        .route("/api/category/:category_id/menu/:menu_id", patch(update_menu))
        .route("/api/category/:category_id/menu/:menu_id", delete(delete_menu))
}

fn parse_pair(category_id: &str, menu_id: &str) -> DomainResult<(CategoryId, MenuId)> {
    Ok((category_id.parse()?, menu_id.parse()?))
}

pub async fn create_menu(
    Extension(services): Extension<Arc<AppServices>>,
    Path(category_id): Path<String>,
    Json(body): Json<dto::CreateMenuRequest>,
) -> axum::response::Response {
    let category_id: CategoryId = match category_id.parse() {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };
    let draft = match body.into_draft() {
        Ok(d) => d,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.create_menu(category_id, draft).await {
        Ok(menu) => (
            StatusCode::CREATED,
            Json(serde_json::json!({
                "message": "menu created",
                "data": dto::menu_to_json(&menu),
            })),
        )
            .into_response(),
        Err(e) => errors::api_error_to_response(e),
    }
}

pub async fn list_menus(
    Extension(services): Extension<Arc<AppServices>>,
    Path(category_id): Path<String>,
) -> axum::response::Response {
    let category_id: CategoryId = match category_id.parse() {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.list_menus(category_id).await {
        Ok(menus) => {
            let data = menus.iter().map(dto::menu_to_json).collect::<Vec<_>>();
            (StatusCode::OK, Json(serde_json::json!({ "data": data }))).into_response()
        }
        Err(e) => errors::api_error_to_response(e),
    }
}

pub async fn get_menu(
    Extension(services): Extension<Arc<AppServices>>,
    Path((category_id, menu_id)): Path<(String, String)>,
) -> axum::response::Response {
    let (category_id, menu_id) = match parse_pair(&category_id, &menu_id) {
        Ok(ids) => ids,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.get_menu(category_id, menu_id).await {
        Ok(menu) => (
            StatusCode::OK,
            Json(serde_json::json!({ "data": dto::menu_to_json(&menu) })),
        )
            .into_response(),
        Err(e) => errors::api_error_to_response(e),
    }
}

pub async fn update_menu(
    Extension(services): Extension<Arc<AppServices>>,
    Path((category_id, menu_id)): Path<(String, String)>,
    Json(body): Json<dto::UpdateMenuRequest>,
) -> axum::response::Response {
    let (category_id, menu_id) = match parse_pair(&category_id, &menu_id) {
        Ok(ids) => ids,
        Err(e) => return errors::domain_error_to_response(e),
    };
    let patch = match body.into_patch() {
        Ok(p) => p,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.update_menu(category_id, menu_id, patch).await {
        Ok(menu) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "message": "menu updated",
                "data": dto::menu_to_json(&menu),
            })),
        )
            .into_response(),
        Err(e) => errors::api_error_to_response(e),
    }
}

pub async fn delete_menu(
    Extension(services): Extension<Arc<AppServices>>,
    Path((category_id, menu_id)): Path<(String, String)>,
) -> axum::response::Response {
    let (category_id, menu_id) = match parse_pair(&category_id, &menu_id) {
        Ok(ids) => ids,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.delete_menu(category_id, menu_id).await {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({ "message": "menu deleted" })),
        )
            .into_response(),
        Err(e) => errors::api_error_to_response(e),
    }
}
