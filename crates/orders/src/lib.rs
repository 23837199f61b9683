//! Orders domain module.
//!
//! Business rules for customer orders: quantity validation, the pending
//! default status, and the enriched per-role listing views with their
//! computed totals. Pure domain logic, no IO.

pub mod order;

pub use order::{CustomerOrderView, Order, OrderDraft, OrderStatus, OwnerOrderView};
