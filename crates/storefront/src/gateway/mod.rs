//! Remote data gateway: the backend-as-a-service the storefront delegates to.
//!
//! # Architecture
//!
//! - The backend is the source of truth - no local persistence, direct calls
//! - Three ports: table access ([`DataGateway`]), object storage
//!   ([`StorageGateway`]) and authentication ([`AuthGateway`])
//! - Services receive the ports as `Arc<dyn ...>` at construction time
//!
//! # Adapters
//!
//! - [`SupabaseClient`] - `PostgREST`, Storage and `GoTrue` over HTTP (`reqwest`)
//! - [`MemoryBackend`] - in-process tables for local development and tests

mod memory;
mod query;
pub mod seed;
mod supabase;

pub use memory::MemoryBackend;
pub use query::{Direction, Equals, Filter, Select};
pub use supabase::SupabaseClient;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::config::BackendConfig;

/// A row as returned by the backend: a JSON object keyed by column name.
pub type Record = serde_json::Map<String, serde_json::Value>;

/// Errors that can occur when talking to the backend.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// No row or object matched.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Credentials missing, expired or rejected.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Write conflicts with an existing row or account.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Response or payload did not have the expected shape.
    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// Request could not be built.
    #[error("Invalid request: {0}")]
    Invalid(String),

    /// Backend is not usable (e.g. poisoned in-memory state).
    #[error("Backend unavailable: {0}")]
    Unavailable(String),
}

/// Table access: select, insert, update and delete against named tables.
#[async_trait]
pub trait DataGateway: Send + Sync {
    /// Run a select and return the matching rows.
    async fn select(&self, query: &Select) -> Result<Vec<Record>, GatewayError>;

    /// Run a select that must produce a row.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::NotFound`] when nothing matches.
    async fn select_single(&self, query: &Select) -> Result<Record, GatewayError> {
        let query = query.clone().limit(1);
        self.select(&query)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| GatewayError::NotFound(format!("no row in {}", query.table_name())))
    }

    /// Insert a row and return it as stored (with generated columns).
    async fn insert(&self, table: &str, record: Record) -> Result<Record, GatewayError>;

    /// Apply `patch` to every row matching `key`; returns the updated rows.
    async fn update(
        &self,
        table: &str,
        key: &Equals,
        patch: Record,
    ) -> Result<Vec<Record>, GatewayError>;

    /// Delete every row matching `key`.
    async fn delete(&self, table: &str, key: &Equals) -> Result<(), GatewayError>;
}

/// Options for [`StorageGateway::upload`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOptions {
    /// MIME type sent with the object.
    pub content_type: String,
    /// `Cache-Control: max-age` in seconds.
    pub cache_control_secs: u32,
    /// Overwrite an existing object at the same path.
    pub upsert: bool,
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self {
            content_type: "application/octet-stream".to_string(),
            cache_control_secs: 3600,
            upsert: false,
        }
    }
}

/// Object storage organised in buckets.
#[async_trait]
pub trait StorageGateway: Send + Sync {
    /// Store `bytes` at `path` inside `bucket`.
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        options: &UploadOptions,
    ) -> Result<(), GatewayError>;

    /// Remove objects from `bucket`.
    async fn remove(&self, bucket: &str, paths: &[String]) -> Result<(), GatewayError>;

    /// Public URL of an object. Does not check that the object exists.
    fn public_url(&self, bucket: &str, path: &str) -> String;
}

/// A user record as held by the auth provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
    /// Free-form metadata (role, `is_active`, `full_name`, phone).
    #[serde(default)]
    pub user_metadata: Record,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_sign_in_at: Option<DateTime<Utc>>,
}

/// A signed-in session.
#[derive(Clone, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Unix timestamp (seconds) after which the access token is rejected.
    #[serde(default)]
    pub expires_at: Option<i64>,
    pub user: AuthUser,
}

impl Session {
    /// Whether the access token has expired at `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at
            .is_some_and(|expires_at| now.timestamp() >= expires_at)
    }

    /// Whether the access token has expired.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "[REDACTED]"))
            .field("expires_at", &self.expires_at)
            .field("user", &self.user.id)
            .finish()
    }
}

/// Attributes for creating or updating a user through the admin surface.
///
/// Metadata keys are merged into the existing metadata; a `null` value
/// removes the key.
#[derive(Clone, Default, Serialize)]
pub struct UserAttributes {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_confirm: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_metadata: Option<Record>,
}

impl std::fmt::Debug for UserAttributes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserAttributes")
            .field("email", &self.email)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("email_confirm", &self.email_confirm)
            .field("user_metadata", &self.user_metadata)
            .finish()
    }
}

/// Authentication and the admin-scoped user management surface.
#[async_trait]
pub trait AuthGateway: Send + Sync {
    /// Exchange email and password for a session.
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, GatewayError>;

    /// Register a new account.
    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthUser, GatewayError>;

    /// Revoke the session identified by `access_token`.
    async fn sign_out(&self, access_token: &str) -> Result<(), GatewayError>;

    /// Send a password-reset mail.
    async fn reset_password(&self, email: &str) -> Result<(), GatewayError>;

    /// Resolve the user behind an access token.
    async fn current_user(&self, access_token: &str) -> Result<AuthUser, GatewayError>;

    /// List every user.
    async fn list_users(&self) -> Result<Vec<AuthUser>, GatewayError>;

    /// Fetch one user.
    async fn get_user(&self, id: Uuid) -> Result<AuthUser, GatewayError>;

    /// Create a user.
    async fn create_user(&self, attributes: &UserAttributes) -> Result<AuthUser, GatewayError>;

    /// Update a user's email, password or metadata.
    async fn update_user(
        &self,
        id: Uuid,
        attributes: &UserAttributes,
    ) -> Result<AuthUser, GatewayError>;

    /// Delete a user permanently.
    async fn delete_user(&self, id: Uuid) -> Result<(), GatewayError>;
}

/// The three ports, wired to one backend.
#[derive(Clone)]
pub struct Gateways {
    pub data: Arc<dyn DataGateway>,
    pub storage: Arc<dyn StorageGateway>,
    pub auth: Arc<dyn AuthGateway>,
}

impl Gateways {
    /// Build the adapter selected by `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn connect(config: &BackendConfig) -> Result<Self, GatewayError> {
        match config {
            BackendConfig::Supabase(supabase) => {
                let client = SupabaseClient::new(supabase)?;
                info!(url = %supabase.url, "Using Supabase backend");
                Ok(Self::from_backend(client))
            }
            BackendConfig::Memory => {
                info!("Using in-memory backend with the demo catalog");
                Ok(Self::from_backend(MemoryBackend::with_demo_catalog()))
            }
        }
    }

    /// Use one adapter for all three ports.
    #[must_use]
    pub fn from_backend<B>(backend: B) -> Self
    where
        B: DataGateway + StorageGateway + AuthGateway + 'static,
    {
        let backend = Arc::new(backend);
        Self {
            data: backend.clone(),
            storage: backend.clone(),
            auth: backend,
        }
    }
}

/// Decode backend rows into typed records.
///
/// # Errors
///
/// Returns [`GatewayError::Decode`] if any row does not match `T`.
pub fn decode_rows<T: DeserializeOwned>(rows: Vec<Record>) -> Result<Vec<T>, GatewayError> {
    rows.into_iter().map(decode_row).collect()
}

/// Decode a single backend row.
///
/// # Errors
///
/// Returns [`GatewayError::Decode`] if the row does not match `T`.
pub fn decode_row<T: DeserializeOwned>(row: Record) -> Result<T, GatewayError> {
    Ok(serde_json::from_value(serde_json::Value::Object(row))?)
}

/// Encode a typed payload as a backend row.
///
/// # Errors
///
/// Returns [`GatewayError::Invalid`] if `value` does not serialize to a JSON
/// object.
pub fn encode_row<T: Serialize>(value: &T) -> Result<Record, GatewayError> {
    match serde_json::to_value(value)? {
        serde_json::Value::Object(map) => Ok(map),
        other => Err(GatewayError::Invalid(format!(
            "expected a JSON object, got {other}"
        ))),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_gateway_error_display() {
        let err = GatewayError::Api {
            status: 400,
            message: "bad filter".to_string(),
        };
        assert_eq!(err.to_string(), "API error: 400 - bad filter");
        assert_eq!(
            GatewayError::NotFound("products".to_string()).to_string(),
            "Not found: products"
        );
    }

    #[test]
    fn test_encode_row_requires_object() {
        assert!(encode_row(&serde_json::json!({ "name": "x" })).is_ok());
        assert!(matches!(
            encode_row(&42),
            Err(GatewayError::Invalid(_))
        ));
    }

    #[test]
    fn test_session_expiry_and_debug() {
        let session: Session = serde_json::from_value(serde_json::json!({
            "access_token": "tok-secret",
            "refresh_token": "refresh-secret",
            "expires_at": 1_000,
            "user": {
                "id": "6f1c1c52-3c0e-4d6b-9a43-4a1f6f0a9b10",
                "created_at": "2025-01-01T00:00:00Z"
            }
        }))
        .unwrap();

        assert!(session.is_expired());
        let not_yet = DateTime::from_timestamp(999, 0).unwrap();
        assert!(!session.is_expired_at(not_yet));

        let debug = format!("{session:?}");
        assert!(!debug.contains("tok-secret"));
        assert!(!debug.contains("refresh-secret"));
    }
}
