//! Integration tests for Mary's Fashion.
//!
//! # Running Tests
//!
//! ```bash
//! # In-process tests against the memory backend
//! cargo test -p marys-fashion-integration-tests
//!
//! # Including the tests against a live storefront
//! STOREFRONT_BASE_URL=http://localhost:3000 \
//!     cargo test -p marys-fashion-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `storefront_api` - HTTP routes served in-process with `tower::ServiceExt`
//! - `search` - caching, autocomplete, debounce and the search input
//! - `back_office` - auth-gated product writes, users and image uploads
//! - `live_storefront` - ignored by default; needs a running server

use std::net::{IpAddr, Ipv4Addr};

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use marys_fashion_storefront::config::{
    BackendConfig, DEFAULT_WHATSAPP_NUMBER, SearchConfig, StorefrontConfig,
};
use marys_fashion_storefront::gateway::{Gateways, MemoryBackend, Session};
use marys_fashion_storefront::routes;
use marys_fashion_storefront::services::AuthService;
use marys_fashion_storefront::state::AppState;
use serde_json::Value;
use tower::ServiceExt;

/// Back-office account created by [`admin_session`].
pub const ADMIN_EMAIL: &str = "admin@marysfashion.com.br";
pub const ADMIN_PASSWORD: &str = "vitrine-2025!";

/// Configuration for an in-process storefront over the memory backend.
#[must_use]
pub fn test_config() -> StorefrontConfig {
    StorefrontConfig {
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: 0,
        backend: BackendConfig::Memory,
        search: SearchConfig::default(),
        whatsapp_number: DEFAULT_WHATSAPP_NUMBER.to_string(),
        sentry_dsn: None,
        sentry_environment: "test".to_string(),
    }
}

/// The storefront router over a fresh demo catalog.
///
/// The backend is returned too so tests can inspect or seed it.
#[must_use]
pub fn storefront() -> (MemoryBackend, Router) {
    let backend = MemoryBackend::with_demo_catalog();
    let gateways = Gateways::from_backend(backend.clone());
    let state = AppState::with_gateways(test_config(), &gateways);
    (backend, routes::routes().with_state(state))
}

/// Issue a GET and decode the JSON body.
///
/// # Panics
///
/// Panics if the request fails or the body is not JSON.
pub async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(uri)
                .body(Body::empty())
                .unwrap_or_else(|e| panic!("bad request {uri}: {e}")),
        )
        .await
        .unwrap_or_else(|e| panic!("request {uri} failed: {e}"));

    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap_or_else(|e| panic!("reading body of {uri} failed: {e}"));
    let body = serde_json::from_slice(&bytes)
        .unwrap_or_else(|e| panic!("body of {uri} is not JSON: {e}"));
    (status, body)
}

/// Create the back-office account on `backend` and sign in with it.
///
/// # Panics
///
/// Panics if sign-up or sign-in fails.
pub async fn admin_session(backend: &MemoryBackend) -> Session {
    let auth = AuthService::new(std::sync::Arc::new(backend.clone()));
    auth.sign_up(ADMIN_EMAIL, ADMIN_PASSWORD)
        .await
        .unwrap_or_else(|e| panic!("sign-up failed: {e}"));
    auth.sign_in(ADMIN_EMAIL, ADMIN_PASSWORD)
        .await
        .unwrap_or_else(|e| panic!("sign-in failed: {e}"))
}

/// `id` fields of a JSON array of products, in order.
#[must_use]
pub fn ids(products: &Value) -> Vec<i64> {
    products
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.get("id").and_then(Value::as_i64))
                .collect()
        })
        .unwrap_or_default()
}
