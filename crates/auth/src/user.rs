//! User accounts and signup/signin payload validation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bistro_core::{DomainError, DomainResult, UserId};

use crate::Role;

const NICKNAME_MIN: usize = 2;
const NICKNAME_MAX: usize = 20;
const PASSWORD_MIN: usize = 2;
const PASSWORD_MAX: usize = 20;

/// A stored user account.
///
/// Accounts are created at signup and never deleted; `password_hash` is an
/// argon2 PHC string, never the plaintext.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub nickname: String,
    pub password_hash: String,
    pub user_type: Role,
    pub created_at: DateTime<Utc>,
}

/// A validated signup payload.
///
/// Construction is the schema-validation step: field lengths and the role
/// spelling are checked here, before anything reaches storage. Uniqueness of
/// the nickname is a storage concern and is checked there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signup {
    pub nickname: String,
    pub password: String,
    pub user_type: Role,
}

impl Signup {
    pub fn new(
        nickname: impl Into<String>,
        password: impl Into<String>,
        user_type: Option<&str>,
    ) -> DomainResult<Self> {
        let nickname = nickname.into();
        let password = password.into();

        check_length("nickname", &nickname, NICKNAME_MIN, NICKNAME_MAX)?;
        check_length("password", &password, PASSWORD_MIN, PASSWORD_MAX)?;

        // userType is optional at signup; absent means least privilege.
        let user_type = match user_type {
            Some(raw) => raw.parse::<Role>()?,
            None => Role::Customer,
        };

        Ok(Self {
            nickname,
            password,
            user_type,
        })
    }
}

/// A validated signin payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub nickname: String,
    pub password: String,
}

impl Credentials {
    pub fn new(nickname: impl Into<String>, password: impl Into<String>) -> DomainResult<Self> {
        let nickname = nickname.into();
        let password = password.into();

        check_length("nickname", &nickname, NICKNAME_MIN, NICKNAME_MAX)?;
        check_length("password", &password, PASSWORD_MIN, PASSWORD_MAX)?;

        Ok(Self { nickname, password })
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signup_accepts_valid_payload() {
        let signup = Signup::new("chef", "pw12", Some("Owner")).unwrap();
        assert_eq!(signup.nickname, "chef");
        assert_eq!(signup.user_type, Role::Owner);
    }

    #[test]
    fn signup_defaults_to_customer() {
        let signup = Signup::new("diner", "pw12", None).unwrap();
        assert_eq!(signup.user_type, Role::Customer);
    }

    #[test]
    fn signup_rejects_short_nickname() {
        let err = Signup::new("a", "pw12", None).unwrap_err();
        match err {
            DomainError::Validation(_) => {}
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn signup_rejects_long_password() {
        let err = Signup::new("chef", "p".repeat(21), None).unwrap_err();
        match err {
            DomainError::Validation(_) => {}
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn signup_rejects_unknown_role() {
        let err = Signup::new("chef", "pw12", Some("admin")).unwrap_err();
        match err {
            DomainError::Validation(_) => {}
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn credentials_validate_lengths() {
        assert!(Credentials::new("chef", "pw12").is_ok());
        assert!(Credentials::new("", "pw12").is_err());
    }
}
