//! User domain types.

use chrono::{DateTime, Utc};

use bookstore_core::{Email, UserId, UserRole};

/// A registered account.
#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: Email,
    pub role: UserRole,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The caller identified by a verified access token.
///
/// Carries only what the token asserts; handlers that need the live account
/// state (active flag, current role) load the [`User`] row.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: UserId,
    pub email: String,
    pub role: UserRole,
}

impl CurrentUser {
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    /// Whether the caller may modify a resource owned by `owner`.
    #[must_use]
    pub fn can_modify(&self, owner: UserId) -> bool {
        self.id == owner || self.is_admin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caller(id: i32, role: UserRole) -> CurrentUser {
        CurrentUser {
            id: UserId::new(id),
            email: "reader@example.com".to_string(),
            role,
        }
    }

    #[test]
    fn test_owner_can_modify() {
        assert!(caller(1, UserRole::User).can_modify(UserId::new(1)));
    }

    #[test]
    fn test_other_user_cannot_modify() {
        assert!(!caller(2, UserRole::User).can_modify(UserId::new(1)));
    }

    #[test]
    fn test_admin_can_modify_anything() {
        assert!(caller(2, UserRole::Admin).can_modify(UserId::new(1)));
    }
}
