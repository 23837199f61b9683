use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post},
};

use bistro_core::OrderId;

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::CurrentUser;

pub fn customer_router() -> Router {
    Router::new()
        .route("/api/orders", post(place_order))
        .route("/api/orders/customer", get(customer_orders))
}

pub fn owner_router() -> Router {
    Router::new()
        .route("/api/orders/owner", get(owner_orders))
        .route("/api/orders/:order_id/status", patch(update_order_status))
}

pub async fn place_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<CurrentUser>,
    Json(body): Json<dto::CreateOrderRequest>,
) -> axum::response::Response {
    let draft = match body.into_draft() {
        Ok(d) => d,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.place_order(user.id(), draft).await {
        Ok(_) => (
            StatusCode::CREATED,
            Json(serde_json::json!({ "message": "order placed" })),
        )
            .into_response(),
        Err(e) => errors::api_error_to_response(e),
    }
}

pub async fn customer_orders(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<CurrentUser>,
) -> axum::response::Response {
    match services.customer_orders(user.id()).await {
        Ok(views) => (StatusCode::OK, Json(views)).into_response(),
        Err(e) => errors::api_error_to_response(e),
    }
}

pub async fn owner_orders(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.owner_orders().await {
        Ok(views) => (StatusCode::OK, Json(views)).into_response(),
        Err(e) => errors::api_error_to_response(e),
    }
}

pub async fn update_order_status(
    Extension(services): Extension<Arc<AppServices>>,
    Path(order_id): Path<String>,
    Json(body): Json<dto::UpdateOrderStatusRequest>,
) -> axum::response::Response {
    let order_id: OrderId = match order_id.parse() {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };
    let status = match body.into_status() {
        Ok(s) => s,
        Err(e) => return errors::domain_error_to_response(e),
    };

    // 201 on update is deliberate, kept for client compatibility.
    match services.update_order_status(order_id, status).await {
        Ok(_) => (
            StatusCode::CREATED,
            Json(serde_json::json!({ "message": "order status updated" })),
        )
            .into_response(),
        Err(e) => errors::api_error_to_response(e),
    }
}
