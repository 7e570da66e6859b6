//! Back-office user accounts.
//!
//! Users live in the auth provider. Role, activation flag, name and phone are
//! kept in the provider's free-form user metadata; [`User`] is the flattened
//! view the admin tooling works with.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{Email, UserId, UserRole};

/// A user account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    /// Empty when the provider has no email on file (e.g. phone sign-ups).
    pub email: String,
    pub role: UserRole,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_sign_in_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// Request to create a user with a password.
#[derive(Clone, Deserialize)]
pub struct NewUser {
    pub email: Email,
    pub password: String,
    #[serde(default)]
    pub role: UserRole,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

impl std::fmt::Debug for NewUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewUser")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .field("role", &self.role)
            .field("full_name", &self.full_name)
            .field("phone", &self.phone)
            .finish()
    }
}

/// Partial update of a user's metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPatch {
    pub id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<Email>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<UserRole>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl UserPatch {
    /// An empty patch for the given user.
    #[must_use]
    pub const fn new(id: UserId) -> Self {
        Self {
            id,
            email: None,
            role: None,
            is_active: None,
            full_name: None,
            phone: None,
        }
    }
}

/// Filters applied to the user listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserFilters {
    #[serde(default)]
    pub role: Option<UserRole>,
    #[serde(default)]
    pub is_active: Option<bool>,
    /// Case-insensitive substring of email or full name.
    #[serde(default)]
    pub search: Option<String>,
}

impl UserFilters {
    /// Whether `user` passes every filter that is set.
    #[must_use]
    pub fn matches(&self, user: &User) -> bool {
        if self.role.is_some_and(|role| role != user.role) {
            return false;
        }
        if self.is_active.is_some_and(|active| active != user.is_active) {
            return false;
        }
        match self.search.as_deref().map(str::to_lowercase) {
            Some(needle) if !needle.is_empty() => {
                user.email.to_lowercase().contains(&needle)
                    || user
                        .full_name
                        .as_deref()
                        .is_some_and(|name| name.to_lowercase().contains(&needle))
            }
            _ => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(email: &str, role: UserRole, is_active: bool, full_name: Option<&str>) -> User {
        let now = Utc::now();
        User {
            id: UserId::random(),
            email: email.to_string(),
            role,
            is_active,
            created_at: now,
            updated_at: now,
            last_sign_in_at: None,
            full_name: full_name.map(String::from),
            phone: None,
        }
    }

    #[test]
    fn test_empty_filters_match_everything() {
        let filters = UserFilters::default();
        assert!(filters.matches(&user("a@b.com", UserRole::User, false, None)));
    }

    #[test]
    fn test_role_and_active_filters() {
        let filters = UserFilters {
            role: Some(UserRole::Admin),
            is_active: Some(true),
            search: None,
        };
        assert!(filters.matches(&user("a@b.com", UserRole::Admin, true, None)));
        assert!(!filters.matches(&user("a@b.com", UserRole::Admin, false, None)));
        assert!(!filters.matches(&user("a@b.com", UserRole::Moderator, true, None)));
    }

    #[test]
    fn test_search_checks_email_and_name() {
        let filters = UserFilters {
            search: Some("SILVA".to_string()),
            ..Default::default()
        };
        assert!(filters.matches(&user("ana@loja.com", UserRole::User, true, Some("Ana Silva"))));
        assert!(filters.matches(&user("silva@loja.com", UserRole::User, true, None)));
        assert!(!filters.matches(&user("ana@loja.com", UserRole::User, true, Some("Ana Souza"))));
    }

    #[test]
    fn test_new_user_debug_redacts_password() {
        let new_user: NewUser = serde_json::from_value(serde_json::json!({
            "email": "ana@loja.com",
            "password": "hunter2-but-longer"
        }))
        .unwrap_or_else(|e| panic!("valid payload: {e}"));
        let debug = format!("{new_user:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("hunter2"));
        assert_eq!(new_user.role, UserRole::User);
    }
}
