use axum::Router;

pub mod category;
pub mod menu;
pub mod orders;
pub mod system;
pub mod users;

/// Catalog reads, open to anonymous clients (menu browsing).
pub fn public_router() -> Router {
    Router::new()
        .merge(category::read_router())
        .merge(menu::read_router())
}

/// Owner-only routes (catalog mutations, order oversight).
pub fn owner_router() -> Router {
    Router::new()
        .merge(category::owner_router())
        .merge(menu::owner_router())
        .merge(orders::owner_router())
}

/// Customer-only routes (placing and reviewing own orders).
pub fn customer_router() -> Router {
    orders::customer_router()
}
