//! User roles stored in auth-provider metadata.

use serde::{Deserialize, Serialize};

/// Permission level of a back-office user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Full access, including user management.
    Admin,
    /// Catalog editing without user management.
    Moderator,
    /// Regular customer account.
    #[default]
    User,
}

impl UserRole {
    /// Interpret the free-form `role` metadata value.
    ///
    /// Anything other than `admin` or `moderator` is treated as a plain user.
    #[must_use]
    pub fn from_metadata(value: &str) -> Self {
        match value {
            "admin" => Self::Admin,
            "moderator" => Self::Moderator,
            _ => Self::User,
        }
    }

    /// Metadata value for this role.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Moderator => "moderator",
            Self::User => "user",
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "moderator" => Ok(Self::Moderator),
            "user" => Ok(Self::User),
            _ => Err(format!("invalid user role: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_metadata_falls_back_to_user() {
        assert_eq!(UserRole::from_metadata("admin"), UserRole::Admin);
        assert_eq!(UserRole::from_metadata("moderator"), UserRole::Moderator);
        assert_eq!(UserRole::from_metadata("superuser"), UserRole::User);
        assert_eq!(UserRole::from_metadata(""), UserRole::User);
    }

    #[test]
    fn test_from_str_is_strict() {
        assert!("Admin".parse::<UserRole>().is_err());
        assert_eq!("moderator".parse::<UserRole>(), Ok(UserRole::Moderator));
    }
}
