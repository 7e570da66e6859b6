//! HTTP route handlers for the storefront API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Health check
//!
//! # Search
//! GET  /api/search?q=          - Products matching a term (cached)
//! GET  /api/search/suggest?q=  - Autocomplete suggestions (cached)
//!
//! # Products
//! GET  /api/products           - Catalog view (?q=&category=&sort=&page=)
//! GET  /api/products/featured  - Featured products
//! GET  /api/products/{id}      - Product detail with its WhatsApp order link
//! GET  /api/products/{id}/related - Same-category products (up to 3)
//!
//! # Categories
//! GET  /api/categories         - Category listing
//! GET  /api/categories/{id}    - Category detail
//! ```

pub mod categories;
pub mod products;
pub mod search;

use axum::{Router, routing::get};

use crate::state::AppState;

/// Liveness probe.
pub async fn health() -> &'static str {
    "ok"
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .nest("/api/search", search::router())
        .nest("/api/products", products::router())
        .nest("/api/categories", categories::router())
}
