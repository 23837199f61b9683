use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bistro_core::{DomainError, DomainResult, MenuId, OrderId, UserId};

/// Order status.
///
/// Statuses are free-form strings: the owner may set any value and transitions
/// are not validated (preserved source behavior). Only the initial value is
/// fixed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderStatus(String);

impl OrderStatus {
    pub const PENDING: &'static str = "PENDING";

    pub fn pending() -> Self {
        Self(Self::PENDING.to_string())
    }

    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for OrderStatus {
    fn default() -> Self {
        Self::pending()
    }
}

impl core::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A customer order row.
///
/// References exactly one menu and one user; both are checked to exist at
/// creation time and are not re-verified if later soft-deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub menu_id: MenuId,
    pub user_id: UserId,
    pub quantity: i64,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

/// A validated order-placement payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderDraft {
    pub menu_id: MenuId,
    pub quantity: i64,
}

impl OrderDraft {
    pub fn new(menu_id: MenuId, quantity: i64) -> DomainResult<Self> {
        if quantity <= 0 {
            return Err(DomainError::validation("quantity must be at least 1"));
        }
        Ok(Self { menu_id, quantity })
    }
}

/// A customer's view of one of their orders, enriched with menu data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerOrderView {
    pub menu_name: String,
    pub menu_price: i64,
    pub quantity: i64,
    pub order_status: OrderStatus,
    pub order_date: DateTime<Utc>,
    pub total_amount: i64,
}

impl CustomerOrderView {
    pub fn build(order: &Order, menu_name: &str, menu_price: i64) -> Self {
        Self {
            menu_name: menu_name.to_string(),
            menu_price,
            quantity: order.quantity,
            order_status: order.status.clone(),
            order_date: order.created_at,
            // Saturates rather than wrapping on extreme price/quantity pairs.
            total_amount: menu_price.saturating_mul(order.quantity),
        }
    }
}

/// The owner's view of any order, enriched with the ordering customer too.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerOrderView {
    pub id: UserId,
    pub nickname: String,
    pub menu_name: String,
    pub menu_price: i64,
    pub quantity: i64,
    pub order_status: OrderStatus,
    pub order_date: DateTime<Utc>,
    pub total_amount: i64,
}

impl OwnerOrderView {
    pub fn build(
        order: &Order,
        customer_id: UserId,
        nickname: &str,
        menu_name: &str,
        menu_price: i64,
    ) -> Self {
        Self {
            id: customer_id,
            nickname: nickname.to_string(),
            menu_name: menu_name.to_string(),
            menu_price,
            quantity: order.quantity,
            order_status: order.status.clone(),
            order_date: order.created_at,
            total_amount: menu_price.saturating_mul(order.quantity),
        }
    }
}
