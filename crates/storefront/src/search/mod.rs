//! Product search and autocomplete.
//!
//! [`ProductSearch`] runs substring queries against the `products` table and
//! keeps two bounded caches keyed by the exact query string:
//!
//! - search results (up to 50 products, newest first)
//! - autocomplete suggestions (derived from up to 10 rows, name order)
//!
//! Remote and decode failures are logged and answered with an empty result,
//! which is never cached. Cached entries are not invalidated when the catalog
//! changes; they expire by TTL or via the `clear_*` methods.

mod debounce;
pub mod input;
pub mod suggest;

pub use debounce::debounced_suggestions;
pub use suggest::{AutocompleteSuggestion, ProductSummary, SuggestionKind, highlight};

use std::sync::Arc;

use marys_fashion_core::{Product, ProductId};
use moka::future::Cache;
use tracing::{debug, error, instrument};

use crate::config::SearchConfig;
use crate::gateway::{DataGateway, Direction, GatewayError, Select, decode_row, decode_rows};
use suggest::{MAX_SUGGESTIONS, SUMMARY_COLUMNS, derive_suggestions};

/// Maximum products returned by [`ProductSearch::search_by_name`].
pub const SEARCH_RESULT_LIMIT: usize = 50;

/// Queries shorter than this (after trimming) get no suggestions.
pub const MIN_SUGGESTION_QUERY_CHARS: usize = 2;

const PRODUCTS_TABLE: &str = "products";
const SEARCH_COLUMNS: [&str; 3] = ["name", "description", "category"];
const SUGGESTION_COLUMNS: [&str; 3] = ["name", "category", "description"];

/// Cached product search.
///
/// Cloning is cheap; clones share the gateway and both caches.
#[derive(Clone)]
pub struct ProductSearch {
    inner: Arc<ProductSearchInner>,
}

struct ProductSearchInner {
    gateway: Arc<dyn DataGateway>,
    results: Cache<String, Arc<Vec<Product>>>,
    suggestions: Cache<String, Arc<Vec<AutocompleteSuggestion>>>,
}

impl ProductSearch {
    /// Create a search service over `gateway` with caches sized by `config`.
    #[must_use]
    pub fn new(gateway: Arc<dyn DataGateway>, config: &SearchConfig) -> Self {
        let results = Cache::builder()
            .max_capacity(config.cache_capacity)
            .time_to_live(config.cache_ttl)
            .build();
        let suggestions = Cache::builder()
            .max_capacity(config.cache_capacity)
            .time_to_live(config.cache_ttl)
            .build();

        Self {
            inner: Arc::new(ProductSearchInner {
                gateway,
                results,
                suggestions,
            }),
        }
    }

    /// Products whose name, description or category contains `text`
    /// (case-insensitive), newest first, at most 50.
    ///
    /// Returns an empty list if the lookup fails.
    #[instrument(skip(self))]
    pub async fn search_by_name(&self, text: &str) -> Vec<Product> {
        if let Some(cached) = self.inner.results.get(text).await {
            debug!("search cache hit");
            return cached.as_ref().clone();
        }

        match self.fetch_search(text).await {
            Ok(products) => {
                let products = Arc::new(products);
                self.inner
                    .results
                    .insert(text.to_string(), Arc::clone(&products))
                    .await;
                products.as_ref().clone()
            }
            Err(e) => {
                error!(error = %e, "Failed to search products by name");
                Vec::new()
            }
        }
    }

    async fn fetch_search(&self, text: &str) -> Result<Vec<Product>, GatewayError> {
        let query = Select::table(PRODUCTS_TABLE)
            .ilike_any(SEARCH_COLUMNS, text)
            .order_by("created_at", Direction::Descending)
            .limit(SEARCH_RESULT_LIMIT);
        decode_rows(self.inner.gateway.select(&query).await?)
    }

    /// A single product by id, or `None` if missing or the lookup fails.
    #[instrument(skip(self))]
    pub async fn get_by_id(&self, id: ProductId) -> Option<Product> {
        let query = Select::table(PRODUCTS_TABLE).filter_eq("id", id.as_i32());
        let result = match self.inner.gateway.select_single(&query).await {
            Ok(row) => decode_row(row),
            Err(e) => Err(e),
        };

        match result {
            Ok(product) => Some(product),
            Err(GatewayError::NotFound(_)) => None,
            Err(e) => {
                error!(error = %e, "Failed to fetch product by id");
                None
            }
        }
    }

    /// Autocomplete suggestions for `query`, at most 10.
    ///
    /// Queries shorter than two characters after trimming return an empty
    /// list without touching the backend.
    #[instrument(skip(self))]
    pub async fn autocomplete_suggestions(&self, query: &str) -> Vec<AutocompleteSuggestion> {
        if query.trim().chars().count() < MIN_SUGGESTION_QUERY_CHARS {
            return Vec::new();
        }

        if let Some(cached) = self.inner.suggestions.get(query).await {
            debug!("suggestion cache hit");
            return cached.as_ref().clone();
        }

        match self.fetch_suggestions(query).await {
            Ok(suggestions) => {
                let suggestions = Arc::new(suggestions);
                self.inner
                    .suggestions
                    .insert(query.to_string(), Arc::clone(&suggestions))
                    .await;
                suggestions.as_ref().clone()
            }
            Err(e) => {
                error!(error = %e, "Failed to fetch autocomplete suggestions");
                Vec::new()
            }
        }
    }

    async fn fetch_suggestions(
        &self,
        query: &str,
    ) -> Result<Vec<AutocompleteSuggestion>, GatewayError> {
        let select = Select::table(PRODUCTS_TABLE)
            .columns(SUMMARY_COLUMNS)
            .ilike_any(SUGGESTION_COLUMNS, query)
            .order_by("name", Direction::Ascending)
            .limit(MAX_SUGGESTIONS);
        let products: Vec<ProductSummary> =
            decode_rows(self.inner.gateway.select(&select).await?)?;
        Ok(derive_suggestions(query, &products))
    }

    /// Drop every cached search result.
    pub fn clear_search_cache(&self) {
        self.inner.results.invalidate_all();
    }

    /// Drop every cached suggestion list.
    pub fn clear_suggestions_cache(&self) {
        self.inner.suggestions.invalidate_all();
    }

    /// Drop both caches.
    pub fn clear_all_caches(&self) {
        self.clear_search_cache();
        self.clear_suggestions_cache();
    }
}
