//! Category route handlers.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use marys_fashion_core::{Category, CategoryId};
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::state::AppState;

/// Category listing, by name.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<Category>>> {
    Ok(Json(state.categories().list().await?))
}

/// Category detail.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Category>> {
    let id: CategoryId = id
        .parse()
        .map_err(|_| AppError::BadRequest(format!("invalid category id: {id}")))?;

    state
        .categories()
        .get(id)
        .await
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("category {id}")))
}

/// Create the category routes router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/{id}", get(show))
}
