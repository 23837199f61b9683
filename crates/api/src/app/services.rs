//! Business operations on top of the storage trait.
//!
//! Handlers stay thin: they parse the request into validated domain types and
//! call one method here. Everything below the validation boundary works with
//! typed ids and drafts only.

use std::sync::Arc;

use chrono::Utc;

use bistro_auth::{Credentials, Signup, TokenService, User, hash_password, verify_password};
use bistro_catalog::{Category, CategoryDraft, CategoryUpdate, Menu, MenuDraft, MenuPatch};
use bistro_core::{CategoryId, MenuId, OrderId, UserId};
use bistro_orders::{CustomerOrderView, Order, OrderDraft, OrderStatus, OwnerOrderView};
use bistro_store::{NewUser, Store, StoreError};

use super::errors::ApiError;

#[derive(Clone)]
pub struct AppServices {
    store: Arc<dyn Store>,
    tokens: TokenService,
}

impl AppServices {
    pub fn new(store: Arc<dyn Store>, tokens: TokenService) -> Self {
        Self { store, tokens }
    }

    // ── users ────────────────────────────────────────────────────────────

    pub async fn signup(&self, signup: Signup) -> Result<User, ApiError> {
        let password_hash = hash_password(&signup.password)
            .map_err(|e| ApiError::Internal(format!("password hashing failed: {e}")))?;

        let user = self
            .store
            .create_user(NewUser {
                nickname: signup.nickname,
                password_hash,
                user_type: signup.user_type,
            })
            .await?;

        tracing::info!(user_id = %user.id, "user signed up");
        Ok(user)
    }

    /// Verify credentials and issue a session token.
    ///
    /// Unknown nickname and wrong password collapse into the same error so the
    /// response does not leak which one it was.
    pub async fn signin(&self, credentials: Credentials) -> Result<String, ApiError> {
        let user = self
            .store
            .user_by_nickname(&credentials.nickname)
            .await?
            .ok_or(ApiError::BadCredentials)?;

        let matches = verify_password(&credentials.password, &user.password_hash)
            .map_err(|e| ApiError::Internal(format!("password verification failed: {e}")))?;
        if !matches {
            return Err(ApiError::BadCredentials);
        }

        let token = self
            .tokens
            .issue(user.id)
            .map_err(|e| ApiError::Internal(format!("token issue failed: {e}")))?;

        tracing::info!(user_id = %user.id, "user signed in");
        Ok(token)
    }

    // ── categories ───────────────────────────────────────────────────────

    pub async fn create_category(
        &self,
        creator: UserId,
        draft: CategoryDraft,
    ) -> Result<Category, ApiError> {
        Ok(self.store.insert_category(creator, &draft).await?)
    }

    pub async fn list_categories(&self) -> Result<Vec<Category>, ApiError> {
        Ok(self.store.list_categories().await?)
    }

    pub async fn update_category(
        &self,
        id: CategoryId,
        update: CategoryUpdate,
    ) -> Result<Category, ApiError> {
        Ok(self.store.update_category(id, &update).await?)
    }

    /// Soft-delete a category and every active menu under it, atomically.
    pub async fn delete_category(&self, id: CategoryId) -> Result<u64, ApiError> {
        let cascaded = self.store.soft_delete_category(id, Utc::now()).await?;
        tracing::info!(category_id = %id, cascaded, "category soft-deleted");
        Ok(cascaded)
    }

    // ── menus ────────────────────────────────────────────────────────────

    pub async fn create_menu(
        &self,
        category_id: CategoryId,
        draft: MenuDraft,
    ) -> Result<Menu, ApiError> {
        Ok(self.store.insert_menu(category_id, &draft).await?)
    }

    pub async fn list_menus(&self, category_id: CategoryId) -> Result<Vec<Menu>, ApiError> {
        // An empty category lists fine; a missing one is 404.
        if !self.store.category_exists(category_id).await? {
            return Err(StoreError::NotFound("category").into());
        }
        Ok(self.store.list_menus(category_id).await?)
    }

    pub async fn get_menu(
        &self,
        category_id: CategoryId,
        menu_id: MenuId,
    ) -> Result<Menu, ApiError> {
        self.store
            .menu_in_category(category_id, menu_id)
            .await?
            .ok_or_else(|| StoreError::NotFound("menu").into())
    }

    pub async fn update_menu(
        &self,
        category_id: CategoryId,
        menu_id: MenuId,
        patch: MenuPatch,
    ) -> Result<Menu, ApiError> {
        Ok(self.store.update_menu(category_id, menu_id, &patch).await?)
    }

    pub async fn delete_menu(
        &self,
        category_id: CategoryId,
        menu_id: MenuId,
    ) -> Result<(), ApiError> {
        Ok(self
            .store
            .soft_delete_menu(category_id, menu_id, Utc::now())
            .await?)
    }

    // ── orders ───────────────────────────────────────────────────────────

    pub async fn place_order(
        &self,
        customer: UserId,
        draft: OrderDraft,
    ) -> Result<Order, ApiError> {
        let order = self.store.insert_order(customer, &draft).await?;
        tracing::info!(order_id = %order.id, customer = %customer, "order placed");
        Ok(order)
    }

    pub async fn customer_orders(
        &self,
        customer: UserId,
    ) -> Result<Vec<CustomerOrderView>, ApiError> {
        let rows = self.store.orders_for_customer(customer).await?;
        Ok(rows
            .iter()
            .map(|row| CustomerOrderView::build(&row.order, &row.menu_name, row.menu_price))
            .collect())
    }

    pub async fn owner_orders(&self) -> Result<Vec<OwnerOrderView>, ApiError> {
        let rows = self.store.orders_for_owner().await?;
        Ok(rows
            .iter()
            .map(|row| {
                OwnerOrderView::build(
                    &row.order,
                    row.customer_id,
                    &row.customer_nickname,
                    &row.menu_name,
                    row.menu_price,
                )
            })
            .collect())
    }

    pub async fn update_order_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<Order, ApiError> {
        Ok(self.store.update_order_status(id, &status).await?)
    }
}
