use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bistro_core::{CategoryId, DomainError, DomainResult, MenuId};

const NAME_MIN: usize = 2;
const NAME_MAX: usize = 20;
const DESCRIPTION_MIN: usize = 2;
const DESCRIPTION_MAX: usize = 20;

/// Sale status of a menu item.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MenuStatus {
    #[default]
    ForSale,
    SoldOut,
}

impl MenuStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MenuStatus::ForSale => "FOR_SALE",
            MenuStatus::SoldOut => "SOLD_OUT",
        }
    }
}

impl core::str::FromStr for MenuStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "FOR_SALE" => Ok(MenuStatus::ForSale),
            "SOLD_OUT" => Ok(MenuStatus::SoldOut),
            other => Err(DomainError::validation(format!(
                "status must be FOR_SALE or SOLD_OUT, got '{other}'"
            ))),
        }
    }
}

/// A menu item row, always scoped to a category.
///
/// A menu cannot exist without a valid category at creation time; the category
/// is not re-validated on reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Menu {
    pub id: MenuId,
    pub category_id: CategoryId,
    pub name: String,
    pub description: String,
    pub image: String,
    pub price: i64,
    pub order: i32,
    pub status: MenuStatus,
    pub is_deleted: Option<DateTime<Utc>>,
}

impl Menu {
    pub fn is_active(&self) -> bool {
        self.is_deleted.is_none()
    }
}

/// A validated create payload for a menu item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuDraft {
    pub name: String,
    pub description: String,
    pub image: String,
    pub price: i64,
    pub order: i32,
    pub status: MenuStatus,
}

impl MenuDraft {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        image: impl Into<String>,
        price: i64,
        order: Option<i32>,
        status: Option<MenuStatus>,
    ) -> DomainResult<Self> {
        let name = name.into();
        let description = description.into();
        let image = image.into();

        check_length("name", &name, NAME_MIN, NAME_MAX)?;
        check_length("description", &description, DESCRIPTION_MIN, DESCRIPTION_MAX)?;
        if image.trim().is_empty() {
            return Err(DomainError::validation("image must not be empty"));
        }
        check_price(price)?;

        Ok(Self {
            name,
            description,
            image,
            price,
            order: order.unwrap_or(0),
            status: status.unwrap_or_default(),
        })
    }
}

/// A validated partial update for a menu item. Absent fields keep their value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MenuPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub price: Option<i64>,
    pub order: Option<i32>,
    pub status: Option<MenuStatus>,
}

impl MenuPatch {
    pub fn new(
        name: Option<String>,
        description: Option<String>,
        image: Option<String>,
        price: Option<i64>,
        order: Option<i32>,
        status: Option<MenuStatus>,
    ) -> DomainResult<Self> {
        if let Some(name) = &name {
            check_length("name", name, NAME_MIN, NAME_MAX)?;
        }
        if let Some(description) = &description {
            check_length("description", description, DESCRIPTION_MIN, DESCRIPTION_MAX)?;
        }
        if let Some(image) = &image {
            if image.trim().is_empty() {
                return Err(DomainError::validation("image must not be empty"));
            }
        }
        if let Some(price) = price {
            check_price(price)?;
        }

        Ok(Self {
            name,
            description,
            image,
            price,
            order,
            status,
        })
    }

    /// Apply the patch to an existing menu row.
    pub fn apply(&self, menu: &mut Menu) {
        if let Some(name) = &self.name {
            menu.name = name.clone();
        }
        if let Some(description) = &self.description {
            menu.description = description.clone();
        }
        if let Some(image) = &self.image {
            menu.image = image.clone();
        }
        if let Some(price) = self.price {
            menu.price = price;
        }
        if let Some(order) = self.order {
            menu.order = order;
        }
        if let Some(status) = self.status {
            menu.status = status;
        }
    }
}

fn check_length(field: &str, value: &str, min: usize, max: usize) -> DomainResult<()> {
    let len = value.chars().count();
    if len < min || len > max {
        return Err(DomainError::validation(format!(
            "{field} must be {min}-{max} characters, got {len}"
        )));
    }
    Ok(())
}

fn check_price(price: i64) -> DomainResult<()> {
    if price < 0 {
        return Err(DomainError::validation("price must not be negative"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(price: i64) -> DomainResult<MenuDraft> {
        MenuDraft::new("Bibimbap", "Rice bowl", "/img/bibimbap.png", price, Some(1), None)
    }

    #[test]
    fn draft_accepts_valid_payload() {
        let menu = draft(9000).unwrap();
        assert_eq!(menu.price, 9000);
        assert_eq!(menu.status, MenuStatus::ForSale);
    }

    #[test]
    fn draft_rejects_negative_price() {
        let err = draft(-1).unwrap_err();
        match err {
            DomainError::Validation(_) => {}
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn draft_accepts_zero_price() {
        assert!(draft(0).is_ok());
    }

    #[test]
    fn draft_rejects_long_description() {
        let err = MenuDraft::new(
            "Bibimbap",
            "d".repeat(21),
            "/img/bibimbap.png",
            9000,
            None,
            None,
        )
        .unwrap_err();
        match err {
            DomainError::Validation(_) => {}
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn patch_rejects_negative_price() {
        let err = MenuPatch::new(None, None, None, Some(-100), None, None).unwrap_err();
        match err {
            DomainError::Validation(_) => {}
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn patch_applies_only_present_fields() {
        let mut menu = Menu {
            id: MenuId::new(1),
            category_id: CategoryId::new(1),
            name: "Bibimbap".to_string(),
            description: "Rice bowl".to_string(),
            image: "/img/bibimbap.png".to_string(),
            price: 9000,
            order: 1,
            status: MenuStatus::ForSale,
            is_deleted: None,
        };

        let patch = MenuPatch::new(None, None, None, Some(9500), None, Some(MenuStatus::SoldOut))
            .unwrap();
        patch.apply(&mut menu);

        assert_eq!(menu.price, 9500);
        assert_eq!(menu.status, MenuStatus::SoldOut);
        assert_eq!(menu.name, "Bibimbap");
    }

    #[test]
    fn status_parses_canonical_spellings() {
        assert_eq!("FOR_SALE".parse::<MenuStatus>().unwrap(), MenuStatus::ForSale);
        assert!("for_sale".parse::<MenuStatus>().is_err());
    }
}
