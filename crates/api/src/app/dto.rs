//! Request/response DTOs and JSON mapping helpers.
//!
//! Request structs accept every field as optional so that a missing field
//! surfaces as a 400 validation error from the domain constructors, not as a
//! framework-level deserialization failure.

use serde::Deserialize;
use serde_json::json;

use bistro_auth::{Credentials, Signup};
use bistro_catalog::{Category, CategoryDraft, CategoryUpdate, Menu, MenuDraft, MenuPatch, MenuStatus};
use bistro_core::{DomainError, DomainResult, MenuId};
use bistro_orders::{OrderDraft, OrderStatus};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub nickname: Option<String>,
    pub password: Option<String>,
    #[serde(rename = "userType")]
    pub user_type: Option<String>,
}

impl SignupRequest {
    pub fn into_signup(self) -> DomainResult<Signup> {
        Signup::new(
            require("nickname", self.nickname)?,
            require("password", self.password)?,
            self.user_type.as_deref(),
        )
    }
}

#[derive(Debug, Deserialize)]
pub struct SigninRequest {
    pub nickname: Option<String>,
    pub password: Option<String>,
}

impl SigninRequest {
    pub fn into_credentials(self) -> DomainResult<Credentials> {
        Credentials::new(
            require("nickname", self.nickname)?,
            require("password", self.password)?,
        )
    }
}

#[derive(Debug, Deserialize)]
pub struct CategoryRequest {
    pub name: Option<String>,
    pub order: Option<i32>,
}

impl CategoryRequest {
    pub fn into_draft(self) -> DomainResult<CategoryDraft> {
        CategoryDraft::new(require("name", self.name)?, self.order)
    }

    pub fn into_update(self) -> DomainResult<CategoryUpdate> {
        CategoryUpdate::new(require("name", self.name)?, self.order)
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateMenuRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub price: Option<i64>,
    pub order: Option<i32>,
    pub status: Option<MenuStatus>,
}

impl CreateMenuRequest {
    pub fn into_draft(self) -> DomainResult<MenuDraft> {
        MenuDraft::new(
            require("name", self.name)?,
            require("description", self.description)?,
            require("image", self.image)?,
            require("price", self.price)?,
            self.order,
            self.status,
        )
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateMenuRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub price: Option<i64>,
    pub order: Option<i32>,
    pub status: Option<MenuStatus>,
}

impl UpdateMenuRequest {
    pub fn into_patch(self) -> DomainResult<MenuPatch> {
        MenuPatch::new(
            self.name,
            self.description,
            self.image,
            self.price,
            self.order,
            self.status,
        )
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    #[serde(rename = "menuId")]
    pub menu_id: Option<i64>,
    pub quantity: Option<i64>,
}

impl CreateOrderRequest {
    pub fn into_draft(self) -> DomainResult<OrderDraft> {
        OrderDraft::new(
            MenuId::new(require("menuId", self.menu_id)?),
            require("quantity", self.quantity)?,
        )
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateOrderStatusRequest {
    pub status: Option<String>,
}

impl UpdateOrderStatusRequest {
    pub fn into_status(self) -> DomainResult<OrderStatus> {
        Ok(OrderStatus::new(require("status", self.status)?))
    }
}

/// Unwrap a required request field or fail validation.
pub fn require<T>(field: &str, value: Option<T>) -> DomainResult<T> {
    value.ok_or_else(|| DomainError::validation(format!("{field} is required")))
}

// -------------------------
// Response mapping
// -------------------------

pub fn category_to_json(category: &Category) -> serde_json::Value {
    json!({
        "id": category.id.as_i64(),
        "name": category.name,
        "order": category.order,
        "userId": category.user_id.map(|id| id.as_i64()),
    })
}

pub fn menu_to_json(menu: &Menu) -> serde_json::Value {
    json!({
        "id": menu.id.as_i64(),
        "categoryId": menu.category_id.as_i64(),
        "name": menu.name,
        "description": menu.description,
        "image": menu.image,
        "price": menu.price,
        "order": menu.order,
        "status": menu.status.as_str(),
    })
}
