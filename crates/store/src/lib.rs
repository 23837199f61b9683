//! `bistro-store` — the persistence boundary.
//!
//! Exposes a single [`Store`] trait covering users, categories, menus and
//! orders, with two implementations: [`InMemoryStore`] for tests and local
//! development, and [`PostgresStore`] for production. Business rules live in
//! the domain crates; this crate only knows rows, filters and transactions.

pub mod in_memory;
pub mod postgres;
pub mod r#trait;

pub use in_memory::InMemoryStore;
pub use postgres::PostgresStore;
pub use r#trait::{CustomerOrderRow, NewUser, OwnerOrderRow, Store, StoreError};
