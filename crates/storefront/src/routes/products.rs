//! Product route handlers.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use marys_fashion_core::{Product, ProductId};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::services::{
    CatalogPage, CatalogQuery, CatalogSort, RELATED_LIMIT, whatsapp_order_link,
};
use crate::state::AppState;

/// Catalog query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct CatalogParams {
    pub q: Option<String>,
    pub category: Option<String>,
    pub sort: Option<String>,
    pub page: Option<usize>,
}

impl From<CatalogParams> for CatalogQuery {
    fn from(params: CatalogParams) -> Self {
        Self {
            search: params.q,
            category: params.category,
            sort: params
                .sort
                .as_deref()
                .map(CatalogSort::parse)
                .unwrap_or_default(),
            page: params.page.unwrap_or(1),
            ..Self::default()
        }
    }
}

/// Catalog view: filtered, sorted, "load more" paged.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(params): Query<CatalogParams>,
) -> Json<CatalogPage> {
    let products = state.products().list().await;
    Json(CatalogQuery::from(params).apply(products))
}

/// Products flagged for the home page.
#[instrument(skip(state))]
pub async fn featured(State(state): State<AppState>) -> Json<Vec<Product>> {
    Json(state.products().featured().await)
}

/// A product with the link that orders it.
#[derive(Debug, Serialize)]
pub struct ProductDetail {
    #[serde(flatten)]
    pub product: Product,
    pub order_url: String,
}

/// Product detail.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ProductDetail>> {
    let product = find(&state, &id).await?;
    let order_url = whatsapp_order_link(&state.config().whatsapp_number, &product);
    Ok(Json(ProductDetail { product, order_url }))
}

/// Up to three other products from the same category.
#[instrument(skip(state))]
pub async fn related(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Product>>> {
    let product = find(&state, &id).await?;
    Ok(Json(state.products().related(&product, RELATED_LIMIT).await))
}

async fn find(state: &AppState, raw_id: &str) -> Result<Product> {
    let id: ProductId = raw_id
        .parse()
        .map_err(|_| AppError::BadRequest(format!("invalid product id: {raw_id}")))?;

    state
        .search()
        .get_by_id(id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))
}

/// Create the product routes router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/featured", get(featured))
        .route("/{id}", get(show))
        .route("/{id}/related", get(related))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_default_to_first_page_by_name() {
        let query = CatalogQuery::from(CatalogParams::default());
        assert_eq!(query.page, 1);
        assert_eq!(query.sort, CatalogSort::Name);
        assert!(query.search.is_none());
    }

    #[test]
    fn test_params_parse_sort() {
        let query = CatalogQuery::from(CatalogParams {
            sort: Some("price-desc".to_string()),
            page: Some(3),
            ..Default::default()
        });
        assert_eq!(query.sort, CatalogSort::PriceDesc);
        assert_eq!(query.page, 3);
    }
}
