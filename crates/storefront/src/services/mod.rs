//! Catalog and back-office services.
//!
//! Thin wrappers over the gateway ports. Each service receives its port at
//! construction and is cheap to clone.
//!
//! # Services
//!
//! - [`ProductService`] - product reads for the storefront, session-gated writes
//! - [`CategoryService`] - category CRUD; the only service that returns errors
//! - [`UserService`] - account administration through the auth provider
//! - [`ImageUploads`] - product images in object storage
//! - [`AuthService`] - sign-in, sign-up and session handling
//! - [`catalog`] - filtering, sorting and "load more" paging of a product list
//! - [`whatsapp_order_link`] - the chat link a product page orders through
//!
//! # Error policy
//!
//! Apart from categories and auth, a backend failure is logged at `error`
//! and answered with an empty list, `None` or `false`. Callers cannot tell
//! "nothing there" from "lookup failed".

pub mod auth;
pub mod catalog;
mod categories;
mod orders;
mod products;
mod uploads;
mod users;

pub use auth::{AuthError, AuthService};
pub use catalog::{CatalogPage, CatalogQuery, CatalogSort};
pub use categories::CategoryService;
pub use orders::whatsapp_order_link;
pub use products::{ProductService, RELATED_LIMIT};
pub use uploads::{DEFAULT_BUCKET, ImageUploads, UploadResult, unique_file_name};
pub use users::{UserService, user_from_auth};

use tracing::warn;

use crate::gateway::Session;

/// Whether `session` may perform `action`. Logs the refusal.
fn session_is_live(session: Option<&Session>, action: &str) -> bool {
    match session {
        Some(session) if !session.is_expired() => true,
        Some(_) => {
            warn!(action, "Refusing write: session expired");
            false
        }
        None => {
            warn!(action, "Refusing write: not authenticated");
            false
        }
    }
}
