//! HTTP application wiring (Axum router + service wiring).
//!
//! - `services.rs`: business operations on top of the storage trait
//! - `routes/`: HTTP routes + handlers (one file per domain area)
//! - `dto.rs`: request/response DTOs and JSON mapping helpers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router, routing::get};

use bistro_auth::{Role, TokenService};
use bistro_store::Store;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub fn build_app(store: Arc<dyn Store>, tokens: TokenService) -> Router {
    let services = Arc::new(services::AppServices::new(store.clone(), tokens.clone()));
    let auth_state = middleware::AuthState { tokens, store };

    let owner_only = routes::owner_router().layer(axum::middleware::from_fn_with_state(
        Role::Owner,
        middleware::require_role,
    ));
    let customer_only = routes::customer_router().layer(axum::middleware::from_fn_with_state(
        Role::Customer,
        middleware::require_role,
    ));

    // Mutations and order views sit behind the cookie guard; catalog reads
    // are served to anonymous clients.
    let protected = owner_only.merge(customer_only).layer(
        axum::middleware::from_fn_with_state(auth_state, middleware::auth_middleware),
    );

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(routes::users::router())
        .merge(routes::public_router())
        .merge(protected)
        .layer(Extension(services))
}
