use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bistro_core::{CategoryId, DomainError, DomainResult, UserId};

const NAME_MIN: usize = 2;
const NAME_MAX: usize = 20;

/// A menu category row.
///
/// `order` is a display rank; duplicates are allowed and ties sort by id.
/// `is_deleted` is the soft-delete marker: `Some(ts)` rows are excluded from
/// all reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub order: i32,
    pub user_id: Option<UserId>,
    pub is_deleted: Option<DateTime<Utc>>,
}

impl Category {
    pub fn is_active(&self) -> bool {
        self.is_deleted.is_none()
    }
}

/// A validated create payload for a category.
///
/// Both fields are required: update overwrites name and order together, so
/// create requires them for the same predictable shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryDraft {
    pub name: String,
    pub order: i32,
}

impl CategoryDraft {
    pub fn new(name: impl Into<String>, order: Option<i32>) -> DomainResult<Self> {
        let name = name.into();
        check_name(&name)?;
        let order =
            order.ok_or_else(|| DomainError::validation("order is required"))?;
        Ok(Self { name, order })
    }
}

/// A validated update payload for a category. Overwrites both fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryUpdate {
    pub name: String,
    pub order: i32,
}

impl CategoryUpdate {
    pub fn new(name: impl Into<String>, order: Option<i32>) -> DomainResult<Self> {
        let draft = CategoryDraft::new(name, order)?;
        Ok(Self {
            name: draft.name,
            order: draft.order,
        })
    }
}

fn check_name(name: &str) -> DomainResult<()> {
    let len = name.chars().count();
    if len < NAME_MIN || len > NAME_MAX {
        return Err(DomainError::validation(format!(
            "name must be {NAME_MIN}-{NAME_MAX} characters, got {len}"
        )));
    }
    Ok(())
}
