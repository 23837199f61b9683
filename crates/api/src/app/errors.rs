use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum_extra::extract::cookie::{Cookie, CookieJar};
use serde_json::json;
use thiserror::Error;

use bistro_core::DomainError;
use bistro_store::StoreError;

use crate::middleware::AUTH_COOKIE;

/// Failure of a service operation, ready to be mapped onto a response.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("invalid nickname or password")]
    BadCredentials,
    #[error("{0}")]
    Internal(String),
}

pub fn api_error_to_response(err: ApiError) -> axum::response::Response {
    match err {
        ApiError::Domain(e) => domain_error_to_response(e),
        ApiError::Store(e) => store_error_to_response(e),
        ApiError::BadCredentials => json_error(
            StatusCode::UNAUTHORIZED,
            "bad_credentials",
            "invalid nickname or password",
        ),
        ApiError::Internal(msg) => {
            tracing::error!(error = %msg, "internal error");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg)
        }
    }
}

pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    match err {
        DomainError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        DomainError::InvalidId(msg) => json_error(StatusCode::BAD_REQUEST, "invalid_id", msg),
        DomainError::NotFound(what) => json_error(
            StatusCode::NOT_FOUND,
            "not_found",
            format!("{what} not found"),
        ),
        DomainError::Forbidden(msg) => json_error(StatusCode::UNAUTHORIZED, "unauthorized", msg),
        DomainError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
    }
}

pub fn store_error_to_response(err: StoreError) -> axum::response::Response {
    match err {
        StoreError::NotFound(what) => json_error(
            StatusCode::NOT_FOUND,
            "not_found",
            format!("{what} not found"),
        ),
        StoreError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
        StoreError::Backend(msg) => {
            tracing::error!(error = %msg, "store failure");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", msg)
        }
    }
}

/// 401 that also removes the session cookie, so a bad token is not retried.
///
/// The removal cookie is added explicitly: `CookieJar::remove` on a fresh jar
/// emits nothing, since the jar never saw the original cookie.
pub fn auth_failure(message: impl Into<String>) -> axum::response::Response {
    let mut removal = Cookie::new(AUTH_COOKIE, "");
    removal.set_path("/");
    removal.make_removal();
    let jar = CookieJar::new().add(removal);
    (
        jar,
        json_error(StatusCode::UNAUTHORIZED, "unauthorized", message),
    )
        .into_response()
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
