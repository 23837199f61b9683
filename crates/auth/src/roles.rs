use core::str::FromStr;

use serde::{Deserialize, Serialize};

use bistro_core::DomainError;

/// Account role used for authorization.
///
/// This system has exactly two roles, so the type is a closed enum rather than
/// an opaque string. Input parsing is case-insensitive (`"owner"`, `"OWNER"`
/// and `"Owner"` are all accepted), the canonical spelling is capitalized.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Owner,
    Customer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Owner => "Owner",
            Role::Customer => "Customer",
        }
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("owner") {
            Ok(Role::Owner)
        } else if s.eq_ignore_ascii_case("customer") {
            Ok(Role::Customer)
        } else {
            Err(DomainError::validation(format!(
                "userType must be Owner or Customer, got '{s}'"
            )))
        }
    }
}
