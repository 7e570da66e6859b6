//! Back-office user administration.
//!
//! Accounts live in the auth provider; role, activation flag, full name and
//! phone are stored in its user metadata. There is no separate profile table.

use std::sync::Arc;

use marys_fashion_core::{NewUser, User, UserFilters, UserId, UserPatch, UserRole};
use serde_json::{Value, json};
use tracing::{error, info, instrument};

use crate::gateway::{AuthGateway, AuthUser, GatewayError, Record, UserAttributes};

/// User administration over an [`AuthGateway`].
#[derive(Clone)]
pub struct UserService {
    gateway: Arc<dyn AuthGateway>,
}

impl UserService {
    #[must_use]
    pub fn new(gateway: Arc<dyn AuthGateway>) -> Self {
        Self { gateway }
    }

    /// Every user passing `filters`.
    #[instrument(skip(self))]
    pub async fn list(&self, filters: &UserFilters) -> Vec<User> {
        match self.gateway.list_users().await {
            Ok(users) => users
                .iter()
                .map(user_from_auth)
                .filter(|user| filters.matches(user))
                .collect(),
            Err(e) => {
                error!(error = %e, "Failed to list users");
                Vec::new()
            }
        }
    }

    /// A single user.
    #[instrument(skip(self))]
    pub async fn get(&self, id: UserId) -> Option<User> {
        match self.gateway.get_user(id.as_uuid()).await {
            Ok(user) => Some(user_from_auth(&user)),
            Err(GatewayError::NotFound(_)) => None,
            Err(e) => {
                error!(error = %e, "Failed to fetch user");
                None
            }
        }
    }

    /// Create an active, pre-confirmed account.
    #[instrument(skip(self, user), fields(email = %user.email))]
    pub async fn create(&self, user: &NewUser) -> Option<User> {
        let mut metadata = Record::new();
        metadata.insert("role".to_string(), json!(user.role.as_str()));
        metadata.insert("is_active".to_string(), json!(true));
        metadata.insert("full_name".to_string(), json!(user.full_name));
        metadata.insert("phone".to_string(), json!(user.phone));

        let attributes = UserAttributes {
            email: Some(user.email.as_str().to_string()),
            password: Some(user.password.clone()),
            email_confirm: Some(true),
            user_metadata: Some(metadata),
        };

        match self.gateway.create_user(&attributes).await {
            Ok(created) => {
                info!(user_id = %created.id, "Created user");
                Some(user_from_auth(&created))
            }
            Err(e) => {
                error!(error = %e, "Failed to create user");
                None
            }
        }
    }

    /// Apply the fields set in `patch`.
    #[instrument(skip(self, patch), fields(user_id = %patch.id))]
    pub async fn update(&self, patch: &UserPatch) -> Option<User> {
        let mut metadata = Record::new();
        if let Some(role) = patch.role {
            metadata.insert("role".to_string(), json!(role.as_str()));
        }
        if let Some(is_active) = patch.is_active {
            metadata.insert("is_active".to_string(), json!(is_active));
        }
        if let Some(full_name) = &patch.full_name {
            metadata.insert("full_name".to_string(), json!(full_name));
        }
        if let Some(phone) = &patch.phone {
            metadata.insert("phone".to_string(), json!(phone));
        }

        let attributes = UserAttributes {
            email: patch.email.as_ref().map(|email| email.as_str().to_string()),
            user_metadata: (!metadata.is_empty()).then_some(metadata),
            ..UserAttributes::default()
        };

        match self.gateway.update_user(patch.id.as_uuid(), &attributes).await {
            Ok(updated) => Some(user_from_auth(&updated)),
            Err(e) => {
                error!(error = %e, "Failed to update user");
                None
            }
        }
    }

    /// Mark a user active.
    pub async fn activate(&self, id: UserId) -> bool {
        self.set_active(id, true).await
    }

    /// Mark a user inactive. The account keeps its credentials.
    pub async fn deactivate(&self, id: UserId) -> bool {
        self.set_active(id, false).await
    }

    /// Delete a user permanently.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: UserId) -> bool {
        match self.gateway.delete_user(id.as_uuid()).await {
            Ok(()) => {
                info!("Deleted user");
                true
            }
            Err(e) => {
                error!(error = %e, "Failed to delete user");
                false
            }
        }
    }

    async fn set_active(&self, id: UserId, is_active: bool) -> bool {
        let mut patch = UserPatch::new(id);
        patch.is_active = Some(is_active);
        self.update(&patch).await.is_some()
    }
}

/// Flatten an auth-provider user into a [`User`].
///
/// Missing `is_active` means active, an unknown role means
/// [`UserRole::User`] and a missing `updated_at` falls back to `created_at`.
#[must_use]
pub fn user_from_auth(user: &AuthUser) -> User {
    let metadata = &user.user_metadata;
    let text = |key: &str| metadata.get(key).and_then(Value::as_str).map(str::to_string);

    User {
        id: UserId::new(user.id),
        email: user.email.clone().unwrap_or_default(),
        role: metadata
            .get("role")
            .and_then(Value::as_str)
            .map_or(UserRole::User, UserRole::from_metadata),
        is_active: metadata.get("is_active") != Some(&Value::Bool(false)),
        created_at: user.created_at,
        updated_at: user.updated_at.unwrap_or(user.created_at),
        last_sign_in_at: user.last_sign_in_at,
        full_name: text("full_name"),
        phone: text("phone"),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use marys_fashion_core::Email;
    use uuid::Uuid;

    use super::*;
    use crate::gateway::MemoryBackend;

    fn service() -> UserService {
        UserService::new(Arc::new(MemoryBackend::new()))
    }

    fn new_user(email: &str, role: UserRole, full_name: &str) -> NewUser {
        NewUser {
            email: Email::parse(email).unwrap(),
            password: "senha-segura".to_string(),
            role,
            full_name: Some(full_name.to_string()),
            phone: None,
        }
    }

    #[test]
    fn test_user_from_auth_defaults() {
        let created_at = Utc::now();
        let mut metadata = Record::new();
        metadata.insert("role".to_string(), json!("superuser"));
        metadata.insert("is_active".to_string(), json!("false"));

        let user = user_from_auth(&AuthUser {
            id: Uuid::new_v4(),
            email: None,
            user_metadata: metadata,
            created_at,
            updated_at: None,
            last_sign_in_at: None,
        });

        assert_eq!(user.email, "");
        assert_eq!(user.role, UserRole::User);
        // Only a literal `false` deactivates.
        assert!(user.is_active);
        assert_eq!(user.updated_at, created_at);
        assert!(user.full_name.is_none());
    }

    #[tokio::test]
    async fn test_create_sets_metadata() {
        let users = service();
        let created = users
            .create(&new_user("maria@example.com", UserRole::Moderator, "Maria Silva"))
            .await
            .unwrap();

        assert_eq!(created.role, UserRole::Moderator);
        assert!(created.is_active);
        assert_eq!(created.full_name.as_deref(), Some("Maria Silva"));
        assert!(created.phone.is_none());
        assert_eq!(users.get(created.id).await.unwrap(), created);
    }

    #[tokio::test]
    async fn test_duplicate_create_returns_none() {
        let users = service();
        let user = new_user("maria@example.com", UserRole::User, "Maria");
        assert!(users.create(&user).await.is_some());
        assert!(users.create(&user).await.is_none());
    }

    #[tokio::test]
    async fn test_list_applies_filters() {
        let users = service();
        users
            .create(&new_user("ana@example.com", UserRole::Admin, "Ana Souza"))
            .await
            .unwrap();
        let bia = users
            .create(&new_user("bia@example.com", UserRole::User, "Beatriz Lima"))
            .await
            .unwrap();
        assert!(users.deactivate(bia.id).await);

        assert_eq!(users.list(&UserFilters::default()).await.len(), 2);

        let admins = UserFilters {
            role: Some(UserRole::Admin),
            ..Default::default()
        };
        assert_eq!(users.list(&admins).await[0].email, "ana@example.com");

        let inactive = UserFilters {
            is_active: Some(false),
            ..Default::default()
        };
        assert_eq!(users.list(&inactive).await[0].id, bia.id);

        let by_name = UserFilters {
            search: Some("LIMA".to_string()),
            ..Default::default()
        };
        assert_eq!(users.list(&by_name).await.len(), 1);

        assert!(users.activate(bia.id).await);
        assert!(users.get(bia.id).await.unwrap().is_active);
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let users = service();
        let created = users
            .create(&new_user("ana@example.com", UserRole::User, "Ana"))
            .await
            .unwrap();

        let mut patch = UserPatch::new(created.id);
        patch.role = Some(UserRole::Admin);
        patch.phone = Some("+55 11 99999-0000".to_string());
        let updated = users.update(&patch).await.unwrap();
        assert_eq!(updated.role, UserRole::Admin);
        assert_eq!(updated.full_name.as_deref(), Some("Ana"));
        assert_eq!(updated.phone.as_deref(), Some("+55 11 99999-0000"));

        assert!(users.delete(created.id).await);
        assert!(users.get(created.id).await.is_none());
        assert!(!users.delete(created.id).await);
        assert!(!users.activate(UserId::random()).await);
    }
}
