//! Supabase adapter: `PostgREST` tables, Storage buckets and `GoTrue` auth.
//!
//! Every request carries the project's `apikey` header and a bearer token.
//! The service-role key is used when configured (required for the admin
//! user surface); otherwise the anon key. Endpoints that act on behalf of a
//! signed-in user (`/logout`, `/user`) send the user's access token instead.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, instrument};
use uuid::Uuid;

use super::{
    AuthGateway, AuthUser, DataGateway, Equals, GatewayError, Record, Select, Session,
    StorageGateway, UploadOptions, UserAttributes,
};
use crate::config::SupabaseConfig;

/// Page size used when walking the admin user listing.
const ADMIN_USERS_PER_PAGE: usize = 1000;

/// HTTP client for a Supabase project.
#[derive(Clone)]
pub struct SupabaseClient {
    inner: Arc<SupabaseClientInner>,
}

struct SupabaseClientInner {
    client: reqwest::Client,
    /// Project URL without trailing slash.
    base_url: String,
}

impl SupabaseClient {
    /// Create a client for the configured project.
    ///
    /// # Errors
    ///
    /// Returns error if a key is not a valid header value or the HTTP client
    /// fails to build.
    pub fn new(config: &SupabaseConfig) -> Result<Self, GatewayError> {
        let bearer = config
            .service_role_key
            .as_ref()
            .unwrap_or(&config.anon_key)
            .expose_secret()
            .to_string();

        let mut headers = HeaderMap::new();
        headers.insert(
            "apikey",
            HeaderValue::from_str(config.anon_key.expose_secret())
                .map_err(|e| GatewayError::Invalid(format!("Invalid anon key format: {e}")))?,
        );
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {bearer}"))
                .map_err(|e| GatewayError::Invalid(format!("Invalid API key format: {e}")))?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            inner: Arc::new(SupabaseClientInner {
                client,
                base_url: config.url.trim_end_matches('/').to_string(),
            }),
        })
    }

    /// Build an endpoint URL with unencoded query pairs.
    fn url(&self, path: &str, pairs: &[(String, String)]) -> Result<url::Url, GatewayError> {
        let mut url = url::Url::parse(&format!("{}{path}", self.inner.base_url))
            .map_err(|e| GatewayError::Invalid(format!("Invalid URL for {path}: {e}")))?;
        if !pairs.is_empty() {
            let mut query = url.query_pairs_mut();
            for (key, value) in pairs {
                query.append_pair(key, value);
            }
        }
        Ok(url)
    }

    fn table_url(&self, table: &str, pairs: &[(String, String)]) -> Result<url::Url, GatewayError> {
        self.url(&format!("/rest/v1/{}", urlencoding::encode(table)), pairs)
    }

    fn object_path(bucket: &str, path: &str) -> String {
        let encoded = path
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect::<Vec<_>>()
            .join("/");
        format!("{}/{encoded}", urlencoding::encode(bucket))
    }
}

/// Map a non-success response to a [`GatewayError`].
async fn check(response: reqwest::Response) -> Result<reqwest::Response, GatewayError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response.text().await.unwrap_or_default();
    Err(match status.as_u16() {
        401 | 403 => GatewayError::Unauthorized(message),
        404 => GatewayError::NotFound(message),
        409 => GatewayError::Conflict(message),
        code => GatewayError::Api {
            status: code,
            message,
        },
    })
}

// =============================================================================
// PostgREST
// =============================================================================

#[async_trait]
impl DataGateway for SupabaseClient {
    #[instrument(skip(self), fields(table = %query.table_name()))]
    async fn select(&self, query: &Select) -> Result<Vec<Record>, GatewayError> {
        let url = self.table_url(query.table_name(), &query.to_query_pairs())?;
        let response = check(self.inner.client.get(url).send().await?).await?;
        let rows: Vec<Record> = response.json().await?;
        debug!(rows = rows.len(), "select completed");
        Ok(rows)
    }

    #[instrument(skip(self, record))]
    async fn insert(&self, table: &str, record: Record) -> Result<Record, GatewayError> {
        let url = self.table_url(table, &[])?;
        let response = self
            .inner
            .client
            .post(url)
            .header("Prefer", "return=representation")
            .json(&record)
            .send()
            .await?;
        let rows: Vec<Record> = check(response).await?.json().await?;
        rows.into_iter().next().ok_or_else(|| GatewayError::Api {
            status: 201,
            message: format!("insert into {table} returned no row"),
        })
    }

    #[instrument(skip(self, patch))]
    async fn update(
        &self,
        table: &str,
        key: &Equals,
        patch: Record,
    ) -> Result<Vec<Record>, GatewayError> {
        let url = self.table_url(table, &[key.to_query_pair()])?;
        let response = self
            .inner
            .client
            .patch(url)
            .header("Prefer", "return=representation")
            .json(&patch)
            .send()
            .await?;
        Ok(check(response).await?.json().await?)
    }

    #[instrument(skip(self))]
    async fn delete(&self, table: &str, key: &Equals) -> Result<(), GatewayError> {
        let url = self.table_url(table, &[key.to_query_pair()])?;
        check(self.inner.client.delete(url).send().await?).await?;
        Ok(())
    }
}

// =============================================================================
// Storage
// =============================================================================

#[async_trait]
impl StorageGateway for SupabaseClient {
    #[instrument(skip(self, bytes, options), fields(size = bytes.len()))]
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        options: &UploadOptions,
    ) -> Result<(), GatewayError> {
        let url = self.url(
            &format!("/storage/v1/object/{}", Self::object_path(bucket, path)),
            &[],
        )?;
        let response = self
            .inner
            .client
            .post(url)
            .header("Content-Type", &options.content_type)
            .header(
                "Cache-Control",
                format!("max-age={}", options.cache_control_secs),
            )
            .header("x-upsert", options.upsert.to_string())
            .body(bytes)
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn remove(&self, bucket: &str, paths: &[String]) -> Result<(), GatewayError> {
        let url = self.url(
            &format!("/storage/v1/object/{}", urlencoding::encode(bucket)),
            &[],
        )?;
        let response = self
            .inner
            .client
            .delete(url)
            .json(&json!({ "prefixes": paths }))
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}",
            self.inner.base_url,
            Self::object_path(bucket, path)
        )
    }
}

// =============================================================================
// GoTrue
// =============================================================================

#[derive(Deserialize)]
struct AdminUserPage {
    #[serde(default)]
    users: Vec<AuthUser>,
}

#[async_trait]
impl AuthGateway for SupabaseClient {
    #[instrument(skip(self, password))]
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, GatewayError> {
        let url = self.url(
            "/auth/v1/token",
            &[("grant_type".to_string(), "password".to_string())],
        )?;
        let response = self
            .inner
            .client
            .post(url)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;

        // GoTrue answers bad credentials with 400 invalid_grant.
        match check(response).await {
            Ok(response) => Ok(response.json().await?),
            Err(GatewayError::Api {
                status: 400,
                message,
            }) => Err(GatewayError::Unauthorized(message)),
            Err(e) => Err(e),
        }
    }

    #[instrument(skip(self, password))]
    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthUser, GatewayError> {
        let url = self.url("/auth/v1/signup", &[])?;
        let response = self
            .inner
            .client
            .post(url)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;
        let body: Value = check(response).await?.json().await?;

        // With auto-confirm the response is a session; otherwise the bare user.
        let user = match body {
            Value::Object(mut map) if map.contains_key("access_token") => {
                map.remove("user").unwrap_or(Value::Null)
            }
            other => other,
        };
        Ok(serde_json::from_value(user)?)
    }

    #[instrument(skip(self, access_token))]
    async fn sign_out(&self, access_token: &str) -> Result<(), GatewayError> {
        let url = self.url("/auth/v1/logout", &[])?;
        let response = self
            .inner
            .client
            .post(url)
            .bearer_auth(access_token)
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn reset_password(&self, email: &str) -> Result<(), GatewayError> {
        let url = self.url("/auth/v1/recover", &[])?;
        let response = self
            .inner
            .client
            .post(url)
            .json(&json!({ "email": email }))
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }

    #[instrument(skip(self, access_token))]
    async fn current_user(&self, access_token: &str) -> Result<AuthUser, GatewayError> {
        let url = self.url("/auth/v1/user", &[])?;
        let response = self
            .inner
            .client
            .get(url)
            .bearer_auth(access_token)
            .send()
            .await?;
        Ok(check(response).await?.json().await?)
    }

    #[instrument(skip(self))]
    async fn list_users(&self) -> Result<Vec<AuthUser>, GatewayError> {
        let mut users = Vec::new();
        let mut page = 1_usize;

        loop {
            let url = self.url(
                "/auth/v1/admin/users",
                &[
                    ("page".to_string(), page.to_string()),
                    ("per_page".to_string(), ADMIN_USERS_PER_PAGE.to_string()),
                ],
            )?;
            let response = check(self.inner.client.get(url).send().await?).await?;
            let batch: AdminUserPage = response.json().await?;
            let fetched = batch.users.len();
            users.extend(batch.users);

            if fetched < ADMIN_USERS_PER_PAGE {
                break;
            }
            page += 1;
        }

        debug!(count = users.len(), "listed users");
        Ok(users)
    }

    #[instrument(skip(self))]
    async fn get_user(&self, id: Uuid) -> Result<AuthUser, GatewayError> {
        let url = self.url(&format!("/auth/v1/admin/users/{id}"), &[])?;
        let response = check(self.inner.client.get(url).send().await?).await?;
        Ok(response.json().await?)
    }

    #[instrument(skip(self, attributes))]
    async fn create_user(&self, attributes: &UserAttributes) -> Result<AuthUser, GatewayError> {
        let url = self.url("/auth/v1/admin/users", &[])?;
        let response = self
            .inner
            .client
            .post(url)
            .json(attributes)
            .send()
            .await?;

        // GoTrue reports an existing email as 422.
        match check(response).await {
            Ok(response) => Ok(response.json().await?),
            Err(GatewayError::Api {
                status: 422,
                message,
            }) if message.contains("already") => Err(GatewayError::Conflict(message)),
            Err(e) => Err(e),
        }
    }

    #[instrument(skip(self, attributes))]
    async fn update_user(
        &self,
        id: Uuid,
        attributes: &UserAttributes,
    ) -> Result<AuthUser, GatewayError> {
        let url = self.url(&format!("/auth/v1/admin/users/{id}"), &[])?;
        let response = self
            .inner
            .client
            .put(url)
            .json(attributes)
            .send()
            .await?;
        Ok(check(response).await?.json().await?)
    }

    #[instrument(skip(self))]
    async fn delete_user(&self, id: Uuid) -> Result<(), GatewayError> {
        let url = self.url(&format!("/auth/v1/admin/users/{id}"), &[])?;
        check(self.inner.client.delete(url).send().await?).await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::SecretString;

    use super::*;

    fn client() -> SupabaseClient {
        SupabaseClient::new(&SupabaseConfig {
            url: "https://abcd.supabase.co/".to_string(),
            anon_key: SecretString::from("anon-key-value"),
            service_role_key: None,
        })
        .unwrap()
    }

    #[test]
    fn test_public_url() {
        let client = client();
        assert_eq!(
            client.public_url("product-images", "1700000000000-k3j9x.jpg"),
            "https://abcd.supabase.co/storage/v1/object/public/product-images/1700000000000-k3j9x.jpg"
        );
    }

    #[test]
    fn test_public_url_encodes_segments() {
        let client = client();
        assert_eq!(
            client.public_url("product-images", "looks/vestido azul.png"),
            "https://abcd.supabase.co/storage/v1/object/public/product-images/looks/vestido%20azul.png"
        );
    }

    #[test]
    fn test_table_url_encodes_filters() {
        let client = client();
        let query = Select::table("products")
            .ilike_any(["name"], "saia midi")
            .limit(10);
        let url = client
            .table_url(query.table_name(), &query.to_query_pairs())
            .unwrap();

        assert_eq!(url.path(), "/rest/v1/products");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(pairs, query.to_query_pairs());
    }
}
