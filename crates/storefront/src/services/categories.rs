//! Category CRUD.
//!
//! Unlike the other services, writes and listing surface [`GatewayError`]
//! so admin tooling can report the failure.

use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use marys_fashion_core::{Category, CategoryId, CategoryPatch, NewCategory};
use serde_json::Value;
use tracing::{error, info, instrument};

use crate::gateway::{
    DataGateway, Direction, Equals, GatewayError, Select, decode_row, decode_rows, encode_row,
};

const TABLE: &str = "categories";

/// Category access over a [`DataGateway`].
#[derive(Clone)]
pub struct CategoryService {
    gateway: Arc<dyn DataGateway>,
}

impl CategoryService {
    #[must_use]
    pub fn new(gateway: Arc<dyn DataGateway>) -> Self {
        Self { gateway }
    }

    /// Every category, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns the gateway error if the select or decoding fails.
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<Category>, GatewayError> {
        let query = Select::table(TABLE).order_by("name", Direction::Ascending);
        let rows = self.gateway.select(&query).await.inspect_err(|e| {
            error!(error = %e, "Failed to list categories");
        })?;
        decode_rows(rows)
    }

    /// A single category, `None` when missing or on failure.
    #[instrument(skip(self))]
    pub async fn get(&self, id: CategoryId) -> Option<Category> {
        self.find(Select::table(TABLE).filter_eq("id", id.as_i32()))
            .await
    }

    /// The category with exactly this name.
    #[instrument(skip(self))]
    pub async fn by_name(&self, name: &str) -> Option<Category> {
        self.find(Select::table(TABLE).filter_eq("name", name)).await
    }

    /// Insert a category, stamping both timestamps.
    ///
    /// # Errors
    ///
    /// Returns the gateway error if the insert fails (e.g. a duplicate name).
    #[instrument(skip(self, category), fields(name = %category.name))]
    pub async fn create(&self, category: &NewCategory) -> Result<Category, GatewayError> {
        let mut row = encode_row(category)?;
        let now = Value::String(timestamp());
        row.insert("created_at".to_string(), now.clone());
        row.insert("updated_at".to_string(), now);

        let created: Category = decode_row(self.gateway.insert(TABLE, row).await?)?;
        info!(id = %created.id, "Created category");
        Ok(created)
    }

    /// Apply `patch`, stamping `updated_at`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::NotFound`] if no category has this id, or the
    /// gateway error if the update fails.
    #[instrument(skip(self, patch))]
    pub async fn update(
        &self,
        id: CategoryId,
        patch: &CategoryPatch,
    ) -> Result<Category, GatewayError> {
        let mut row = encode_row(patch)?;
        row.insert("updated_at".to_string(), Value::String(timestamp()));

        self.gateway
            .update(TABLE, &Equals::new("id", id.as_i32()), row)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| GatewayError::NotFound(format!("category {id}")))
            .and_then(decode_row)
    }

    /// Delete a category. Products keep their category label.
    ///
    /// # Errors
    ///
    /// Returns the gateway error if the delete fails.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: CategoryId) -> Result<(), GatewayError> {
        self.gateway
            .delete(TABLE, &Equals::new("id", id.as_i32()))
            .await?;
        info!("Deleted category");
        Ok(())
    }

    async fn find(&self, query: Select) -> Option<Category> {
        let result = match self.gateway.select_single(&query).await {
            Ok(row) => decode_row(row),
            Err(e) => Err(e),
        };

        match result {
            Ok(category) => Some(category),
            Err(GatewayError::NotFound(_)) => None,
            Err(e) => {
                error!(error = %e, "Failed to fetch category");
                None
            }
        }
    }
}

fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::gateway::MemoryBackend;

    fn service() -> CategoryService {
        CategoryService::new(Arc::new(MemoryBackend::with_demo_catalog()))
    }

    #[tokio::test]
    async fn test_list_ordered_by_name() {
        let names: Vec<_> = service()
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
        assert_eq!(names.len(), 6);
    }

    #[tokio::test]
    async fn test_lookup_by_name_and_id() {
        let categories = service();
        let saias = categories.by_name("Saias").await.unwrap();
        assert_eq!(categories.get(saias.id).await.unwrap().name, "Saias");
        assert!(categories.by_name("saias").await.is_none());
        assert!(categories.get(CategoryId::new(999)).await.is_none());
    }

    #[tokio::test]
    async fn test_create_update_delete() {
        let categories = service();

        let created = categories
            .create(&NewCategory {
                name: "Acessórios".to_string(),
                description: Some("Bolsas e cintos".to_string()),
                image: None,
            })
            .await
            .unwrap();
        assert_eq!(created.created_at, created.updated_at);

        let updated = categories
            .update(
                created.id,
                &CategoryPatch {
                    description: Some("Bolsas, cintos e lenços".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Acessórios");
        assert!(updated.updated_at >= created.updated_at);

        categories.delete(created.id).await.unwrap();
        assert!(categories.get(created.id).await.is_none());
    }

    #[tokio::test]
    async fn test_update_missing_category() {
        let result = service()
            .update(CategoryId::new(999), &CategoryPatch::default())
            .await;
        assert!(matches!(result, Err(GatewayError::NotFound(_))));
    }
}
