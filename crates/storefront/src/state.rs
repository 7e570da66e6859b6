//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::StorefrontConfig;
use crate::gateway::{GatewayError, Gateways};
use crate::search::ProductSearch;
use crate::services::{CategoryService, ProductService};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// the catalog services and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    search: ProductSearch,
    products: ProductService,
    categories: CategoryService,
}

impl AppState {
    /// Create application state over the configured backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend client cannot be built.
    pub fn new(config: StorefrontConfig) -> Result<Self, GatewayError> {
        let gateways = Gateways::connect(&config.backend)?;
        Ok(Self::with_gateways(config, &gateways))
    }

    /// Create application state over already-built gateways.
    #[must_use]
    pub fn with_gateways(config: StorefrontConfig, gateways: &Gateways) -> Self {
        let search = ProductSearch::new(gateways.data.clone(), &config.search);
        let products = ProductService::new(gateways.data.clone());
        let categories = CategoryService::new(gateways.data.clone());

        Self {
            inner: Arc::new(AppStateInner {
                config,
                search,
                products,
                categories,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Cached product search and autocomplete.
    #[must_use]
    pub fn search(&self) -> &ProductSearch {
        &self.inner.search
    }

    #[must_use]
    pub fn products(&self) -> &ProductService {
        &self.inner.products
    }

    #[must_use]
    pub fn categories(&self) -> &CategoryService {
        &self.inner.categories
    }
}
