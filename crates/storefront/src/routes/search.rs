//! Search route handlers.

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use marys_fashion_core::Product;
use serde::Deserialize;
use tracing::instrument;

use crate::error::add_breadcrumb;
use crate::search::AutocompleteSuggestion;
use crate::state::AppState;

/// Search query parameters.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

/// Products matching the term. A blank term returns nothing.
#[instrument(skip(state))]
pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Json<Vec<Product>> {
    let term = query.q.trim();
    if term.is_empty() {
        return Json(Vec::new());
    }

    add_breadcrumb("search", "Searched catalog", Some(&[("query", term)]));
    Json(state.search().search_by_name(term).await)
}

/// Autocomplete suggestions for a partially typed term.
#[instrument(skip(state))]
pub async fn suggest(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Json<Vec<AutocompleteSuggestion>> {
    Json(state.search().autocomplete_suggestions(&query.q).await)
}

/// Create the search routes router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(search))
        .route("/suggest", get(suggest))
}
