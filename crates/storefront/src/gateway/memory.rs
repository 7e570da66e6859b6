//! In-process backend implementing all three gateway ports.
//!
//! Tables are vectors of JSON rows with an auto-increment `id` and
//! `created_at`/`updated_at` defaults, storage is a byte map per bucket and
//! auth keeps argon2 password hashes with opaque session tokens. Used with
//! `MF_BACKEND=memory` and by the test suites.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
use std::sync::{Arc, Mutex, MutexGuard};

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use async_trait::async_trait;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde_json::Value;
use tracing::{debug, instrument};
use uuid::Uuid;

use super::{
    AuthGateway, AuthUser, DataGateway, Equals, Filter, GatewayError, Record, Select, Session,
    StorageGateway, UploadOptions, UserAttributes, seed,
};

/// Lifetime of an issued access token.
const SESSION_TTL_SECS: i64 = 3600;

/// In-memory backend. Cloning shares the same state.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    state: Arc<Mutex<MemoryState>>,
    selects: Arc<AtomicUsize>,
}

#[derive(Default)]
struct MemoryState {
    tables: HashMap<String, Table>,
    buckets: HashMap<String, HashMap<String, StoredObject>>,
    users: Vec<StoredUser>,
    sessions: HashMap<String, IssuedToken>,
    last_stamp: Option<DateTime<Utc>>,
}

#[derive(Default)]
struct Table {
    next_id: i64,
    rows: Vec<Record>,
}

struct StoredObject {
    bytes: Vec<u8>,
    content_type: String,
}

struct StoredUser {
    user: AuthUser,
    password_hash: Option<String>,
}

struct IssuedToken {
    user_id: Uuid,
    expires_at: i64,
}

impl MemoryBackend {
    /// An empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A backend preloaded with the demo catalog.
    #[must_use]
    pub fn with_demo_catalog() -> Self {
        let backend = Self::new();
        if let Ok(mut state) = backend.state.lock() {
            state.load_table("products", seed::demo_products());
            state.load_table("categories", seed::demo_categories());
        }
        backend
    }

    /// Replace a table's rows. Row ids are kept; new inserts continue after
    /// the highest one.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Unavailable`] if the state lock is poisoned.
    pub fn load_table(&self, table: &str, rows: Vec<Record>) -> Result<(), GatewayError> {
        self.lock()?.load_table(table, rows);
        Ok(())
    }

    /// Number of selects served so far.
    #[must_use]
    pub fn select_calls(&self) -> usize {
        self.selects.load(AtomicOrdering::SeqCst)
    }

    /// Bytes and content type of a stored object.
    #[must_use]
    pub fn object(&self, bucket: &str, path: &str) -> Option<(Vec<u8>, String)> {
        let state = self.state.lock().ok()?;
        state
            .buckets
            .get(bucket)?
            .get(path)
            .map(|object| (object.bytes.clone(), object.content_type.clone()))
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>, GatewayError> {
        self.state
            .lock()
            .map_err(|_| GatewayError::Unavailable("Lock poisoned".to_string()))
    }
}

impl MemoryState {
    fn load_table(&mut self, table: &str, rows: Vec<Record>) {
        let max_id = rows
            .iter()
            .filter_map(|row| row.get("id").and_then(Value::as_i64))
            .max()
            .unwrap_or(0);
        self.tables.insert(
            table.to_string(),
            Table {
                next_id: max_id + 1,
                rows,
            },
        );
    }

    /// Strictly increasing timestamps so "newest first" is well defined.
    fn stamp(&mut self) -> String {
        let mut now = Utc::now();
        if let Some(last) = self.last_stamp.filter(|last| now <= *last) {
            now = last + Duration::microseconds(1);
        }
        self.last_stamp = Some(now);
        now.to_rfc3339_opts(SecondsFormat::Micros, true)
    }

    fn user_by_email(&self, email: &str) -> Option<&StoredUser> {
        let email = email.trim().to_lowercase();
        self.users
            .iter()
            .find(|stored| stored.user.email.as_deref() == Some(email.as_str()))
    }

    fn user_mut(&mut self, id: Uuid) -> Result<&mut StoredUser, GatewayError> {
        self.users
            .iter_mut()
            .find(|stored| stored.user.id == id)
            .ok_or_else(|| GatewayError::NotFound(format!("user {id}")))
    }
}

// =============================================================================
// Row matching
// =============================================================================

fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::String(a), Value::String(b)) => a == b,
        (Value::String(s), other) | (other, Value::String(s)) => *s == other.to_string(),
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        _ => left == right,
    }
}

fn key_matches(row: &Record, key: &Equals) -> bool {
    row.get(&key.column)
        .is_some_and(|value| values_equal(value, &key.value))
}

fn filter_matches(row: &Record, filter: &Filter) -> bool {
    match filter {
        Filter::Equals(key) => key_matches(row, key),
        Filter::ILikeAny { columns, text } => {
            let needle = text.to_lowercase();
            columns.iter().any(|column| {
                row.get(column)
                    .and_then(Value::as_str)
                    .is_some_and(|value| value.to_lowercase().contains(&needle))
            })
        }
    }
}

/// Column ordering with nulls last.
fn compare_values(left: Option<&Value>, right: Option<&Value>) -> Ordering {
    match (left, right) {
        (None | Some(Value::Null), None | Some(Value::Null)) => Ordering::Equal,
        (None | Some(Value::Null), _) => Ordering::Greater,
        (_, None | Some(Value::Null)) => Ordering::Less,
        (Some(Value::Number(a)), Some(Value::Number(b))) => a
            .as_f64()
            .partial_cmp(&b.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(a)), Some(Value::String(b))) => a.cmp(b),
        (Some(Value::Bool(a)), Some(Value::Bool(b))) => a.cmp(b),
        (Some(a), Some(b)) => a.to_string().cmp(&b.to_string()),
    }
}

fn project(row: &Record, columns: &[String]) -> Record {
    if columns.is_empty() {
        return row.clone();
    }
    columns
        .iter()
        .filter_map(|column| row.get(column).map(|value| (column.clone(), value.clone())))
        .collect()
}

// =============================================================================
// Tables
// =============================================================================

#[async_trait]
impl DataGateway for MemoryBackend {
    #[instrument(skip(self), fields(table = %query.table_name()))]
    async fn select(&self, query: &Select) -> Result<Vec<Record>, GatewayError> {
        self.selects.fetch_add(1, AtomicOrdering::SeqCst);
        let state = self.lock()?;
        let Some(table) = state.tables.get(query.table_name()) else {
            return Ok(Vec::new());
        };

        let mut rows: Vec<&Record> = table
            .rows
            .iter()
            .filter(|row| query.filters().iter().all(|f| filter_matches(row, f)))
            .collect();

        if let Some((column, direction)) = query.ordering() {
            rows.sort_by(|a, b| {
                let ordering = compare_values(a.get(column), b.get(column));
                match direction {
                    super::Direction::Ascending => ordering,
                    super::Direction::Descending => ordering.reverse(),
                }
            });
        }

        let limit = query.limit_value().unwrap_or(usize::MAX);
        let rows: Vec<Record> = rows
            .into_iter()
            .take(limit)
            .map(|row| project(row, query.column_names()))
            .collect();
        debug!(rows = rows.len(), "select completed");
        Ok(rows)
    }

    #[instrument(skip(self, record))]
    async fn insert(&self, table: &str, mut record: Record) -> Result<Record, GatewayError> {
        let mut state = self.lock()?;
        let stamp = state.stamp();
        let entry = state.tables.entry(table.to_string()).or_insert_with(|| Table {
            next_id: 1,
            rows: Vec::new(),
        });

        let id = match record.get("id").and_then(Value::as_i64) {
            Some(id) => {
                if entry.rows.iter().any(|row| key_matches(row, &Equals::new("id", id))) {
                    return Err(GatewayError::Conflict(format!(
                        "duplicate key value: {table}.id = {id}"
                    )));
                }
                id
            }
            None => entry.next_id,
        };
        entry.next_id = entry.next_id.max(id + 1);

        record.insert("id".to_string(), Value::from(id));
        for column in ["created_at", "updated_at"] {
            if record.get(column).is_none_or(Value::is_null) {
                record.insert(column.to_string(), Value::from(stamp.clone()));
            }
        }

        entry.rows.push(record.clone());
        Ok(record)
    }

    #[instrument(skip(self, patch))]
    async fn update(
        &self,
        table: &str,
        key: &Equals,
        patch: Record,
    ) -> Result<Vec<Record>, GatewayError> {
        let mut state = self.lock()?;
        let Some(entry) = state.tables.get_mut(table) else {
            return Ok(Vec::new());
        };

        let mut updated = Vec::new();
        for row in entry.rows.iter_mut().filter(|row| key_matches(row, key)) {
            for (column, value) in &patch {
                row.insert(column.clone(), value.clone());
            }
            updated.push(row.clone());
        }
        Ok(updated)
    }

    #[instrument(skip(self))]
    async fn delete(&self, table: &str, key: &Equals) -> Result<(), GatewayError> {
        let mut state = self.lock()?;
        if let Some(entry) = state.tables.get_mut(table) {
            entry.rows.retain(|row| !key_matches(row, key));
        }
        Ok(())
    }
}

// =============================================================================
// Storage
// =============================================================================

#[async_trait]
impl StorageGateway for MemoryBackend {
    #[instrument(skip(self, bytes, options), fields(size = bytes.len()))]
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        options: &UploadOptions,
    ) -> Result<(), GatewayError> {
        let mut state = self.lock()?;
        let objects = state.buckets.entry(bucket.to_string()).or_default();
        if objects.contains_key(path) && !options.upsert {
            return Err(GatewayError::Conflict(format!(
                "The resource already exists: {bucket}/{path}"
            )));
        }
        objects.insert(
            path.to_string(),
            StoredObject {
                bytes,
                content_type: options.content_type.clone(),
            },
        );
        Ok(())
    }

    #[instrument(skip(self))]
    async fn remove(&self, bucket: &str, paths: &[String]) -> Result<(), GatewayError> {
        let mut state = self.lock()?;
        if let Some(objects) = state.buckets.get_mut(bucket) {
            for path in paths {
                objects.remove(path);
            }
        }
        Ok(())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("memory://{bucket}/{path}")
    }
}

// =============================================================================
// Auth
// =============================================================================

fn hash_password(password: &str) -> Result<String, GatewayError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| GatewayError::Invalid(format!("password hashing failed: {e}")))
}

fn verify_password(password: &str, hash: &str) -> bool {
    PasswordHash::new(hash).is_ok_and(|parsed| {
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    })
}

/// Merge `patch` into `metadata`; `null` values remove the key.
fn merge_metadata(metadata: &mut Record, patch: &Record) {
    for (key, value) in patch {
        if value.is_null() {
            metadata.remove(key);
        } else {
            metadata.insert(key.clone(), value.clone());
        }
    }
}

fn invalid_credentials() -> GatewayError {
    GatewayError::Unauthorized("Invalid login credentials".to_string())
}

impl MemoryBackend {
    fn insert_user(
        &self,
        email: &str,
        password_hash: Option<String>,
        metadata: Record,
    ) -> Result<AuthUser, GatewayError> {
        let email = email.trim().to_lowercase();
        if email.is_empty() {
            return Err(GatewayError::Invalid("email is required".to_string()));
        }

        let mut state = self.lock()?;
        if state.user_by_email(&email).is_some() {
            return Err(GatewayError::Conflict(format!(
                "A user with this email address has already been registered: {email}"
            )));
        }

        let now = Utc::now();
        let user = AuthUser {
            id: Uuid::new_v4(),
            email: Some(email),
            user_metadata: metadata,
            created_at: now,
            updated_at: Some(now),
            last_sign_in_at: None,
        };
        state.users.push(StoredUser {
            user: user.clone(),
            password_hash,
        });
        Ok(user)
    }
}

#[async_trait]
impl AuthGateway for MemoryBackend {
    #[instrument(skip(self, password))]
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, GatewayError> {
        let (user_id, hash) = {
            let state = self.lock()?;
            let stored = state.user_by_email(email).ok_or_else(invalid_credentials)?;
            (stored.user.id, stored.password_hash.clone())
        };

        // Verify outside the lock; argon2 is deliberately slow.
        if !hash.is_some_and(|hash| verify_password(password, &hash)) {
            return Err(invalid_credentials());
        }

        let mut state = self.lock()?;
        let now = Utc::now();
        let stored = state.user_mut(user_id)?;
        stored.user.last_sign_in_at = Some(now);
        let user = stored.user.clone();

        let access_token = Uuid::new_v4().simple().to_string();
        let expires_at = now.timestamp() + SESSION_TTL_SECS;
        state.sessions.insert(
            access_token.clone(),
            IssuedToken {
                user_id,
                expires_at,
            },
        );

        Ok(Session {
            access_token,
            refresh_token: None,
            expires_at: Some(expires_at),
            user,
        })
    }

    #[instrument(skip(self, password))]
    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthUser, GatewayError> {
        let hash = hash_password(password)?;
        self.insert_user(email, Some(hash), Record::new())
    }

    #[instrument(skip(self, access_token))]
    async fn sign_out(&self, access_token: &str) -> Result<(), GatewayError> {
        let mut state = self.lock()?;
        state
            .sessions
            .remove(access_token)
            .map(|_| ())
            .ok_or_else(|| GatewayError::Unauthorized("invalid token".to_string()))
    }

    #[instrument(skip(self))]
    async fn reset_password(&self, email: &str) -> Result<(), GatewayError> {
        // Unknown addresses succeed too, so callers cannot probe for accounts.
        let known = self.lock()?.user_by_email(email).is_some();
        debug!(known, "password reset requested");
        Ok(())
    }

    #[instrument(skip(self, access_token))]
    async fn current_user(&self, access_token: &str) -> Result<AuthUser, GatewayError> {
        let mut state = self.lock()?;
        let token = state
            .sessions
            .get(access_token)
            .map(|token| (token.user_id, token.expires_at));

        match token {
            Some((_, expires_at)) if Utc::now().timestamp() >= expires_at => {
                state.sessions.remove(access_token);
                Err(GatewayError::Unauthorized("token has expired".to_string()))
            }
            Some((user_id, _)) => Ok(state.user_mut(user_id)?.user.clone()),
            None => Err(GatewayError::Unauthorized("invalid token".to_string())),
        }
    }

    #[instrument(skip(self))]
    async fn list_users(&self) -> Result<Vec<AuthUser>, GatewayError> {
        let state = self.lock()?;
        Ok(state.users.iter().map(|stored| stored.user.clone()).collect())
    }

    #[instrument(skip(self))]
    async fn get_user(&self, id: Uuid) -> Result<AuthUser, GatewayError> {
        let mut state = self.lock()?;
        Ok(state.user_mut(id)?.user.clone())
    }

    #[instrument(skip(self, attributes))]
    async fn create_user(&self, attributes: &UserAttributes) -> Result<AuthUser, GatewayError> {
        let email = attributes
            .email
            .as_deref()
            .ok_or_else(|| GatewayError::Invalid("email is required".to_string()))?;
        let hash = attributes
            .password
            .as_deref()
            .map(hash_password)
            .transpose()?;

        let mut metadata = Record::new();
        if let Some(patch) = &attributes.user_metadata {
            merge_metadata(&mut metadata, patch);
        }
        self.insert_user(email, hash, metadata)
    }

    #[instrument(skip(self, attributes))]
    async fn update_user(
        &self,
        id: Uuid,
        attributes: &UserAttributes,
    ) -> Result<AuthUser, GatewayError> {
        let hash = attributes
            .password
            .as_deref()
            .map(hash_password)
            .transpose()?;

        let mut state = self.lock()?;
        if let Some(email) = &attributes.email {
            let email = email.trim().to_lowercase();
            if state
                .user_by_email(&email)
                .is_some_and(|other| other.user.id != id)
            {
                return Err(GatewayError::Conflict(format!(
                    "email already in use: {email}"
                )));
            }
            state.user_mut(id)?.user.email = Some(email);
        }

        let stored = state.user_mut(id)?;
        if let Some(hash) = hash {
            stored.password_hash = Some(hash);
        }
        if let Some(patch) = &attributes.user_metadata {
            merge_metadata(&mut stored.user.user_metadata, patch);
        }
        stored.user.updated_at = Some(Utc::now());
        Ok(stored.user.clone())
    }

    #[instrument(skip(self))]
    async fn delete_user(&self, id: Uuid) -> Result<(), GatewayError> {
        let mut state = self.lock()?;
        let before = state.users.len();
        state.users.retain(|stored| stored.user.id != id);
        if state.users.len() == before {
            return Err(GatewayError::NotFound(format!("user {id}")));
        }
        state.sessions.retain(|_, token| token.user_id != id);
        Ok(())
    }
}
