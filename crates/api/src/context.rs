use bistro_auth::{Role, User};
use bistro_core::UserId;

/// Authenticated identity for a request.
///
/// Inserted into request extensions by the auth middleware; present on every
/// route behind it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    user: User,
}

impl CurrentUser {
    pub fn new(user: User) -> Self {
        Self { user }
    }

    pub fn id(&self) -> UserId {
        self.user.id
    }

    pub fn role(&self) -> Role {
        self.user.user_type
    }

    pub fn nickname(&self) -> &str {
        &self.user.nickname
    }
}
