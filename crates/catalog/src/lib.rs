//! Catalog domain module: menu categories and menu items.
//!
//! This crate contains the business rules for the catalog, implemented purely
//! as deterministic domain logic (no IO, no HTTP, no storage). Soft deletion
//! is modeled as a nullable timestamp; rows with a timestamp are invisible to
//! normal reads.

pub mod category;
pub mod menu;

pub use category::{Category, CategoryDraft, CategoryUpdate};
pub use menu::{Menu, MenuDraft, MenuPatch, MenuStatus};
