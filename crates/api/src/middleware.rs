use std::sync::Arc;

use axum::{
    extract::{Extension, State},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;

use bistro_auth::{Role, TokenError, TokenService};
use bistro_store::Store;

use crate::app::errors;
use crate::context::CurrentUser;

/// Cookie that carries the session token, as `Bearer <token>`.
pub const AUTH_COOKIE: &str = "authorization";

#[derive(Clone)]
pub struct AuthState {
    pub tokens: TokenService,
    pub store: Arc<dyn Store>,
}

/// Resolve the session cookie into a `CurrentUser` extension.
///
/// Every failure answers 401 with a distinct message and a `Set-Cookie`
/// that removes the session cookie, so a client holding a bad token is
/// forced to sign in again rather than retry it.
pub async fn auth_middleware(
    State(state): State<AuthState>,
    jar: CookieJar,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let raw = match jar.get(AUTH_COOKIE) {
        Some(cookie) => cookie.value().to_string(),
        None => return errors::auth_failure("authentication required"),
    };

    let mut parts = raw.split_whitespace();
    let (scheme, token) = match (parts.next(), parts.next()) {
        (Some(scheme), Some(token)) if parts.next().is_none() => (scheme, token),
        _ => return errors::auth_failure("malformed authorization cookie"),
    };

    if scheme != "Bearer" {
        return errors::auth_failure("unsupported token type");
    }

    let user_id = match state.tokens.verify(token) {
        Ok(id) => id,
        Err(TokenError::Expired) => return errors::auth_failure("token expired"),
        Err(_) => return errors::auth_failure("invalid token"),
    };

    // A token for a user that no longer exists is treated as revoked.
    let user = match state.store.user_by_id(user_id).await {
        Ok(Some(user)) => user,
        Ok(None) => return errors::auth_failure("unknown user"),
        Err(e) => return errors::store_error_to_response(e),
    };

    req.extensions_mut().insert(CurrentUser::new(user));

    next.run(req).await
}

/// Require a specific role for a route group.
///
/// Layered per-router after `auth_middleware`, so `CurrentUser` is always
/// present. Mismatch answers 401, matching the rest of the auth surface.
pub async fn require_role(
    State(required): State<Role>,
    Extension(user): Extension<CurrentUser>,
    req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    if user.role() != required {
        return errors::json_error(
            axum::http::StatusCode::UNAUTHORIZED,
            "unauthorized",
            format!("{required} role required"),
        );
    }
    next.run(req).await
}
