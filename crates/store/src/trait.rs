use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use bistro_auth::{Role, User};
use bistro_catalog::{Category, CategoryDraft, CategoryUpdate, Menu, MenuDraft, MenuPatch};
use bistro_core::{CategoryId, MenuId, OrderId, UserId};
use bistro_orders::{Order, OrderDraft, OrderStatus};

/// A user row ready for insertion (credentials already hashed and validated).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub nickname: String,
    pub password_hash: String,
    pub user_type: Role,
}

/// An order joined with the menu it references, for the customer listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerOrderRow {
    pub order: Order,
    pub menu_name: String,
    pub menu_price: i64,
}

/// An order joined with its menu and the ordering customer, for the owner
/// listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnerOrderRow {
    pub order: Order,
    pub menu_name: String,
    pub menu_price: i64,
    pub customer_id: UserId,
    pub customer_nickname: String,
}

/// Store operation error.
///
/// These are **infrastructure-boundary errors** (missing rows, uniqueness,
/// backend failures) as opposed to domain errors (schema validation, role
/// checks), which never reach this layer.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The targeted row does not exist or is soft-deleted.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// A uniqueness constraint was violated (e.g. duplicate nickname).
    #[error("conflict: {0}")]
    Conflict(String),

    /// The backend failed (connection, pool, constraint machinery).
    #[error("storage backend failure: {0}")]
    Backend(String),
}

/// The persistence layer for the whole system.
///
/// ## Design Principles
///
/// - **No business rules**: payloads arrive pre-validated; this trait only
///   persists, filters and joins.
/// - **Soft deletes are invisible**: every read excludes rows whose
///   `is_deleted` timestamp is set, and update/delete operations treat such
///   rows as absent.
/// - **Cascade atomicity**: `soft_delete_category` marks the category and
///   every currently-active menu of that category in one atomic step; either
///   both are visible to subsequent reads or neither is.
/// - **Statelessness**: implementations hold no per-request state; concurrent
///   single-row updates are last-write-wins.
#[async_trait]
pub trait Store: Send + Sync {
    // ── users ────────────────────────────────────────────────────────────

    /// Insert a user. Fails with `Conflict` when the nickname is taken.
    async fn create_user(&self, new: NewUser) -> Result<User, StoreError>;

    async fn user_by_id(&self, id: UserId) -> Result<Option<User>, StoreError>;

    async fn user_by_nickname(&self, nickname: &str) -> Result<Option<User>, StoreError>;

    // ── categories ───────────────────────────────────────────────────────

    async fn insert_category(
        &self,
        creator: UserId,
        draft: &CategoryDraft,
    ) -> Result<Category, StoreError>;

    /// Active categories, display order ascending (ties resolve by id).
    async fn list_categories(&self) -> Result<Vec<Category>, StoreError>;

    /// Overwrite name and display order. `NotFound` when absent or deleted.
    async fn update_category(
        &self,
        id: CategoryId,
        update: &CategoryUpdate,
    ) -> Result<Category, StoreError>;

    /// Soft-delete a category and cascade to its active menus atomically.
    /// Returns the number of menus that were cascaded.
    async fn soft_delete_category(
        &self,
        id: CategoryId,
        now: DateTime<Utc>,
    ) -> Result<u64, StoreError>;

    /// Whether an active category with this id exists.
    async fn category_exists(&self, id: CategoryId) -> Result<bool, StoreError>;

    // ── menus ────────────────────────────────────────────────────────────

    async fn insert_menu(
        &self,
        category_id: CategoryId,
        draft: &MenuDraft,
    ) -> Result<Menu, StoreError>;

    /// One active menu, scoped to its category. `None` when the menu is
    /// absent, soft-deleted, or belongs to a different category.
    async fn menu_in_category(
        &self,
        category_id: CategoryId,
        menu_id: MenuId,
    ) -> Result<Option<Menu>, StoreError>;

    /// One active menu regardless of category (order placement path).
    async fn menu_by_id(&self, menu_id: MenuId) -> Result<Option<Menu>, StoreError>;

    /// Active menus of a category, display order ascending.
    async fn list_menus(&self, category_id: CategoryId) -> Result<Vec<Menu>, StoreError>;

    async fn update_menu(
        &self,
        category_id: CategoryId,
        menu_id: MenuId,
        patch: &MenuPatch,
    ) -> Result<Menu, StoreError>;

    /// Single-row soft delete; menus are leaves, nothing cascades further.
    async fn soft_delete_menu(
        &self,
        category_id: CategoryId,
        menu_id: MenuId,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    // ── orders ───────────────────────────────────────────────────────────

    async fn insert_order(&self, customer: UserId, draft: &OrderDraft)
        -> Result<Order, StoreError>;

    /// The caller's orders, newest first, joined with menu name/price.
    async fn orders_for_customer(
        &self,
        customer: UserId,
    ) -> Result<Vec<CustomerOrderRow>, StoreError>;

    /// Every order system-wide, newest first, joined with menu and customer.
    async fn orders_for_owner(&self) -> Result<Vec<OwnerOrderRow>, StoreError>;

    /// Overwrite an order's status unconditionally. `NotFound` when absent.
    async fn update_order_status(
        &self,
        id: OrderId,
        status: &OrderStatus,
    ) -> Result<Order, StoreError>;
}
