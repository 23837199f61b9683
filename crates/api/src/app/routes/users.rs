use std::sync::Arc;

use axum::{
    Json, Router,
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
    routing::post,
};
use axum_extra::extract::cookie::{Cookie, CookieJar};

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::middleware::AUTH_COOKIE;

pub fn router() -> Router {
    Router::new()
        .route("/api/users/signup", post(signup))
        .route("/api/users/signin", post(signin))
}

pub async fn signup(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::SignupRequest>,
) -> axum::response::Response {
    let signup = match body.into_signup() {
        Ok(s) => s,
        Err(e) => return errors::domain_error_to_response(e),
    };

    let user = match services.signup(signup).await {
        Ok(u) => u,
        Err(e) => return errors::api_error_to_response(e),
    };

    (
        StatusCode::CREATED,
        Json(serde_json::json!({
            "message": "signup completed",
            "nickname": user.nickname,
        })),
    )
        .into_response()
}

pub async fn signin(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::SigninRequest>,
) -> axum::response::Response {
    let credentials = match body.into_credentials() {
        Ok(c) => c,
        Err(e) => return errors::domain_error_to_response(e),
    };

    let token = match services.signin(credentials).await {
        Ok(t) => t,
        Err(e) => return errors::api_error_to_response(e),
    };

    let jar = CookieJar::new().add(
        Cookie::build((AUTH_COOKIE, format!("Bearer {token}")))
            .path("/")
            .http_only(true),
    );

    (
        jar,
        (
            StatusCode::OK,
            Json(serde_json::json!({ "message": "signed in" })),
        ),
    )
        .into_response()
}
