//! Postgres-backed store implementation.
//!
//! Uses an sqlx connection pool; every read excludes soft-deleted rows in the
//! WHERE clause, and the category soft-delete cascade runs inside a single
//! transaction so that a crash between the two UPDATEs can never leave a
//! deleted category with still-active menus.
//!
//! ## Error Mapping
//!
//! SQLx errors are mapped to `StoreError` as follows:
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError | Scenario |
//! |------------|----------------------|------------|----------|
//! | Database (unique violation) | `23505` | `Conflict` | Duplicate nickname at signup |
//! | Database (foreign key violation) | `23503` | `NotFound` | Referenced category/menu/user row vanished between check and insert |
//! | Database (other) | Any other | `Backend` | Constraint or statement failure |
//! | RowNotFound / PoolClosed / Other | N/A | `Backend` | Connection failures, pool shutdown |
//!
//! Missing rows on targeted updates are detected via `rows_affected` /
//! RETURNING, not via sqlx errors.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::instrument;

use bistro_auth::{Role, User};
use bistro_catalog::{
    Category, CategoryDraft, CategoryUpdate, Menu, MenuDraft, MenuPatch, MenuStatus,
};
use bistro_core::{CategoryId, MenuId, OrderId, UserId};
use bistro_orders::{Order, OrderDraft, OrderStatus};

use super::r#trait::{CustomerOrderRow, NewUser, OwnerOrderRow, Store, StoreError};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id            BIGSERIAL PRIMARY KEY,
    nickname      TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    user_type     TEXT NOT NULL,
    created_at    TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE TABLE IF NOT EXISTS categories (
    id            BIGSERIAL PRIMARY KEY,
    name          TEXT NOT NULL,
    display_order INTEGER NOT NULL DEFAULT 0,
    user_id       BIGINT REFERENCES users(id),
    is_deleted    TIMESTAMPTZ
);

CREATE TABLE IF NOT EXISTS menus (
    id            BIGSERIAL PRIMARY KEY,
    category_id   BIGINT NOT NULL REFERENCES categories(id),
    name          TEXT NOT NULL,
    description   TEXT NOT NULL,
    image         TEXT NOT NULL,
    price         BIGINT NOT NULL CHECK (price >= 0),
    display_order INTEGER NOT NULL DEFAULT 0,
    status        TEXT NOT NULL DEFAULT 'FOR_SALE',
    is_deleted    TIMESTAMPTZ
);

CREATE TABLE IF NOT EXISTS orders (
    id         BIGSERIAL PRIMARY KEY,
    menu_id    BIGINT NOT NULL REFERENCES menus(id),
    user_id    BIGINT NOT NULL REFERENCES users(id),
    quantity   BIGINT NOT NULL CHECK (quantity > 0),
    status     TEXT NOT NULL DEFAULT 'PENDING',
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
"#;

/// Postgres-backed store.
///
/// `PostgresStore` is `Send + Sync`; the sqlx pool handles connection
/// management across threads. Single-row writes rely on Postgres row-level
/// atomicity; only the cascade needs an explicit transaction.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Create a new store over an existing connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the schema if it does not exist yet.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::raw_sql(SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("migrate", e))?;
        Ok(())
    }
}

#[async_trait]
impl Store for PostgresStore {
    #[instrument(skip(self, new), fields(nickname = %new.nickname), err)]
    async fn create_user(&self, new: NewUser) -> Result<User, StoreError> {
        let row = sqlx::query(
            r#"
            INSERT INTO users (nickname, password_hash, user_type)
            VALUES ($1, $2, $3)
            RETURNING id, nickname, password_hash, user_type, created_at
            "#,
        )
        .bind(&new.nickname)
        .bind(&new.password_hash)
        .bind(new.user_type.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StoreError::Conflict(format!("nickname '{}' is already taken", new.nickname))
            } else {
                map_sqlx_error("create_user", e)
            }
        })?;

        user_from_row(&row)
    }

    async fn user_by_id(&self, id: UserId) -> Result<Option<User>, StoreError> {
        let row = sqlx::query(
            "SELECT id, nickname, password_hash, user_type, created_at FROM users WHERE id = $1",
        )
        .bind(id.as_i64())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("user_by_id", e))?;

        row.as_ref().map(user_from_row).transpose()
    }

    async fn user_by_nickname(&self, nickname: &str) -> Result<Option<User>, StoreError> {
        let row = sqlx::query(
            "SELECT id, nickname, password_hash, user_type, created_at FROM users WHERE nickname = $1",
        )
        .bind(nickname)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("user_by_nickname", e))?;

        row.as_ref().map(user_from_row).transpose()
    }

    #[instrument(skip(self, draft), fields(creator = %creator), err)]
    async fn insert_category(
        &self,
        creator: UserId,
        draft: &CategoryDraft,
    ) -> Result<Category, StoreError> {
        let row = sqlx::query(
            r#"
            INSERT INTO categories (name, display_order, user_id)
            VALUES ($1, $2, $3)
            RETURNING id, name, display_order, user_id, is_deleted
            "#,
        )
        .bind(&draft.name)
        .bind(draft.order)
        .bind(creator.as_i64())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_category", e))?;

        category_from_row(&row)
    }

    async fn list_categories(&self) -> Result<Vec<Category>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, display_order, user_id, is_deleted
            FROM categories
            WHERE is_deleted IS NULL
            ORDER BY display_order ASC, id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_categories", e))?;

        rows.iter().map(category_from_row).collect()
    }

    async fn update_category(
        &self,
        id: CategoryId,
        update: &CategoryUpdate,
    ) -> Result<Category, StoreError> {
        let row = sqlx::query(
            r#"
            UPDATE categories
            SET name = $2, display_order = $3
            WHERE id = $1 AND is_deleted IS NULL
            RETURNING id, name, display_order, user_id, is_deleted
            "#,
        )
        .bind(id.as_i64())
        .bind(&update.name)
        .bind(update.order)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_category", e))?;

        row.as_ref()
            .map(category_from_row)
            .transpose()?
            .ok_or(StoreError::NotFound("category"))
    }

    #[instrument(skip(self), fields(category_id = %id), err)]
    async fn soft_delete_category(
        &self,
        id: CategoryId,
        now: DateTime<Utc>,
    ) -> Result<u64, StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("soft_delete_category.begin", e))?;

        let category = sqlx::query(
            "UPDATE categories SET is_deleted = $2 WHERE id = $1 AND is_deleted IS NULL",
        )
        .bind(id.as_i64())
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("soft_delete_category", e))?;

        if category.rows_affected() == 0 {
            // Dropping the transaction rolls back.
            return Err(StoreError::NotFound("category"));
        }

        // Cascade only to currently-active menus; already-deleted rows keep
        // their original timestamp.
        let menus = sqlx::query(
            "UPDATE menus SET is_deleted = $2 WHERE category_id = $1 AND is_deleted IS NULL",
        )
        .bind(id.as_i64())
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("soft_delete_category.cascade", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("soft_delete_category.commit", e))?;

        Ok(menus.rows_affected())
    }

    async fn category_exists(&self, id: CategoryId) -> Result<bool, StoreError> {
        let row = sqlx::query(
            "SELECT EXISTS(SELECT 1 FROM categories WHERE id = $1 AND is_deleted IS NULL) AS present",
        )
        .bind(id.as_i64())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("category_exists", e))?;

        row.try_get("present").map_err(decode_error)
    }

    #[instrument(skip(self, draft), fields(category_id = %category_id), err)]
    async fn insert_menu(
        &self,
        category_id: CategoryId,
        draft: &MenuDraft,
    ) -> Result<Menu, StoreError> {
        if !self.category_exists(category_id).await? {
            return Err(StoreError::NotFound("category"));
        }

        let row = sqlx::query(
            r#"
            INSERT INTO menus (category_id, name, description, image, price, display_order, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, category_id, name, description, image, price, display_order, status, is_deleted
            "#,
        )
        .bind(category_id.as_i64())
        .bind(&draft.name)
        .bind(&draft.description)
        .bind(&draft.image)
        .bind(draft.price)
        .bind(draft.order)
        .bind(draft.status.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_fk_violation(&e) {
                StoreError::NotFound("category")
            } else {
                map_sqlx_error("insert_menu", e)
            }
        })?;

        menu_from_row(&row)
    }

    async fn menu_in_category(
        &self,
        category_id: CategoryId,
        menu_id: MenuId,
    ) -> Result<Option<Menu>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, category_id, name, description, image, price, display_order, status, is_deleted
            FROM menus
            WHERE id = $1 AND category_id = $2 AND is_deleted IS NULL
            "#,
        )
        .bind(menu_id.as_i64())
        .bind(category_id.as_i64())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("menu_in_category", e))?;

        row.as_ref().map(menu_from_row).transpose()
    }

    async fn menu_by_id(&self, menu_id: MenuId) -> Result<Option<Menu>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, category_id, name, description, image, price, display_order, status, is_deleted
            FROM menus
            WHERE id = $1 AND is_deleted IS NULL
            "#,
        )
        .bind(menu_id.as_i64())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("menu_by_id", e))?;

        row.as_ref().map(menu_from_row).transpose()
    }

    async fn list_menus(&self, category_id: CategoryId) -> Result<Vec<Menu>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, category_id, name, description, image, price, display_order, status, is_deleted
            FROM menus
            WHERE category_id = $1 AND is_deleted IS NULL
            ORDER BY display_order ASC, id ASC
            "#,
        )
        .bind(category_id.as_i64())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_menus", e))?;

        rows.iter().map(menu_from_row).collect()
    }

    async fn update_menu(
        &self,
        category_id: CategoryId,
        menu_id: MenuId,
        patch: &MenuPatch,
    ) -> Result<Menu, StoreError> {
        let row = sqlx::query(
            r#"
            UPDATE menus
            SET name          = COALESCE($3, name),
                description   = COALESCE($4, description),
                image         = COALESCE($5, image),
                price         = COALESCE($6, price),
                display_order = COALESCE($7, display_order),
                status        = COALESCE($8, status)
            WHERE id = $1 AND category_id = $2 AND is_deleted IS NULL
            RETURNING id, category_id, name, description, image, price, display_order, status, is_deleted
            "#,
        )
        .bind(menu_id.as_i64())
        .bind(category_id.as_i64())
        .bind(patch.name.as_deref())
        .bind(patch.description.as_deref())
        .bind(patch.image.as_deref())
        .bind(patch.price)
        .bind(patch.order)
        .bind(patch.status.map(|s| s.as_str()))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_menu", e))?;

        row.as_ref()
            .map(menu_from_row)
            .transpose()?
            .ok_or(StoreError::NotFound("menu"))
    }

    async fn soft_delete_menu(
        &self,
        category_id: CategoryId,
        menu_id: MenuId,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE menus SET is_deleted = $3 WHERE id = $1 AND category_id = $2 AND is_deleted IS NULL",
        )
        .bind(menu_id.as_i64())
        .bind(category_id.as_i64())
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("soft_delete_menu", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("menu"));
        }
        Ok(())
    }

    #[instrument(skip(self, draft), fields(customer = %customer, menu_id = %draft.menu_id), err)]
    async fn insert_order(
        &self,
        customer: UserId,
        draft: &OrderDraft,
    ) -> Result<Order, StoreError> {
        if self.menu_by_id(draft.menu_id).await?.is_none() {
            return Err(StoreError::NotFound("menu"));
        }

        let row = sqlx::query(
            r#"
            INSERT INTO orders (menu_id, user_id, quantity)
            VALUES ($1, $2, $3)
            RETURNING id, menu_id, user_id, quantity, status, created_at
            "#,
        )
        .bind(draft.menu_id.as_i64())
        .bind(customer.as_i64())
        .bind(draft.quantity)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_fk_violation(&e) {
                StoreError::NotFound("menu")
            } else {
                map_sqlx_error("insert_order", e)
            }
        })?;

        order_from_row(&row)
    }

    async fn orders_for_customer(
        &self,
        customer: UserId,
    ) -> Result<Vec<CustomerOrderRow>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT o.id, o.menu_id, o.user_id, o.quantity, o.status, o.created_at,
                   m.name AS menu_name, m.price AS menu_price
            FROM orders o
            JOIN menus m ON m.id = o.menu_id
            WHERE o.user_id = $1
            ORDER BY o.created_at DESC, o.id DESC
            "#,
        )
        .bind(customer.as_i64())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("orders_for_customer", e))?;

        rows.iter()
            .map(|row| {
                Ok(CustomerOrderRow {
                    order: order_from_row(row)?,
                    menu_name: row.try_get("menu_name").map_err(decode_error)?,
                    menu_price: row.try_get("menu_price").map_err(decode_error)?,
                })
            })
            .collect()
    }

    async fn orders_for_owner(&self) -> Result<Vec<OwnerOrderRow>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT o.id, o.menu_id, o.user_id, o.quantity, o.status, o.created_at,
                   m.name AS menu_name, m.price AS menu_price,
                   u.id AS customer_id, u.nickname AS customer_nickname
            FROM orders o
            JOIN menus m ON m.id = o.menu_id
            JOIN users u ON u.id = o.user_id
            ORDER BY o.created_at DESC, o.id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("orders_for_owner", e))?;

        rows.iter()
            .map(|row| {
                Ok(OwnerOrderRow {
                    order: order_from_row(row)?,
                    menu_name: row.try_get("menu_name").map_err(decode_error)?,
                    menu_price: row.try_get("menu_price").map_err(decode_error)?,
                    customer_id: UserId::new(
                        row.try_get("customer_id").map_err(decode_error)?,
                    ),
                    customer_nickname: row
                        .try_get("customer_nickname")
                        .map_err(decode_error)?,
                })
            })
            .collect()
    }

    #[instrument(skip(self), fields(order_id = %id, status = %status), err)]
    async fn update_order_status(
        &self,
        id: OrderId,
        status: &OrderStatus,
    ) -> Result<Order, StoreError> {
        let row = sqlx::query(
            r#"
            UPDATE orders
            SET status = $2
            WHERE id = $1
            RETURNING id, menu_id, user_id, quantity, status, created_at
            "#,
        )
        .bind(id.as_i64())
        .bind(status.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_order_status", e))?;

        row.as_ref()
            .map(order_from_row)
            .transpose()?
            .ok_or(StoreError::NotFound("order"))
    }
}

// ── row mapping ──────────────────────────────────────────────────────────

fn user_from_row(row: &PgRow) -> Result<User, StoreError> {
    let user_type: String = row.try_get("user_type").map_err(decode_error)?;
    Ok(User {
        id: UserId::new(row.try_get("id").map_err(decode_error)?),
        nickname: row.try_get("nickname").map_err(decode_error)?,
        password_hash: row.try_get("password_hash").map_err(decode_error)?,
        user_type: user_type
            .parse::<Role>()
            .map_err(|e| StoreError::Backend(format!("corrupt user_type column: {e}")))?,
        created_at: row.try_get("created_at").map_err(decode_error)?,
    })
}

fn category_from_row(row: &PgRow) -> Result<Category, StoreError> {
    let user_id: Option<i64> = row.try_get("user_id").map_err(decode_error)?;
    Ok(Category {
        id: CategoryId::new(row.try_get("id").map_err(decode_error)?),
        name: row.try_get("name").map_err(decode_error)?,
        order: row.try_get("display_order").map_err(decode_error)?,
        user_id: user_id.map(UserId::new),
        is_deleted: row.try_get("is_deleted").map_err(decode_error)?,
    })
}

fn menu_from_row(row: &PgRow) -> Result<Menu, StoreError> {
    let status: String = row.try_get("status").map_err(decode_error)?;
    Ok(Menu {
        id: MenuId::new(row.try_get("id").map_err(decode_error)?),
        category_id: CategoryId::new(row.try_get("category_id").map_err(decode_error)?),
        name: row.try_get("name").map_err(decode_error)?,
        description: row.try_get("description").map_err(decode_error)?,
        image: row.try_get("image").map_err(decode_error)?,
        price: row.try_get("price").map_err(decode_error)?,
        order: row.try_get("display_order").map_err(decode_error)?,
        status: status
            .parse::<MenuStatus>()
            .map_err(|e| StoreError::Backend(format!("corrupt status column: {e}")))?,
        is_deleted: row.try_get("is_deleted").map_err(decode_error)?,
    })
}

fn order_from_row(row: &PgRow) -> Result<Order, StoreError> {
    let status: String = row.try_get("status").map_err(decode_error)?;
    Ok(Order {
        id: OrderId::new(row.try_get("id").map_err(decode_error)?),
        menu_id: MenuId::new(row.try_get("menu_id").map_err(decode_error)?),
        user_id: UserId::new(row.try_get("user_id").map_err(decode_error)?),
        quantity: row.try_get("quantity").map_err(decode_error)?,
        status: OrderStatus::new(status),
        created_at: row.try_get("created_at").map_err(decode_error)?,
    })
}

// ── error mapping ────────────────────────────────────────────────────────

fn map_sqlx_error(operation: &'static str, e: sqlx::Error) -> StoreError {
    StoreError::Backend(format!("{operation}: {e}"))
}

fn decode_error(e: sqlx::Error) -> StoreError {
    StoreError::Backend(format!("row decode: {e}"))
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.code().as_deref() == Some("23505"))
}

fn is_fk_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.code().as_deref() == Some("23503"))
}
