//! Product reads and writes.

use std::sync::Arc;

use marys_fashion_core::{NewProduct, Product, ProductId, ProductPatch};
use tracing::{error, instrument, warn};

use super::session_is_live;
use crate::gateway::{
    DataGateway, Direction, Equals, GatewayError, Select, Session, decode_row, decode_rows,
    encode_row,
};

const TABLE: &str = "products";

/// Products shown alongside a product detail.
pub const RELATED_LIMIT: usize = 3;

/// Product access over a [`DataGateway`].
#[derive(Clone)]
pub struct ProductService {
    gateway: Arc<dyn DataGateway>,
}

impl ProductService {
    #[must_use]
    pub fn new(gateway: Arc<dyn DataGateway>) -> Self {
        Self { gateway }
    }

    /// Every product, newest first.
    #[instrument(skip(self))]
    pub async fn list(&self) -> Vec<Product> {
        let query = Select::table(TABLE).order_by("created_at", Direction::Descending);
        self.fetch_many(&query, "Failed to list products").await
    }

    /// A single product.
    #[instrument(skip(self))]
    pub async fn get(&self, id: ProductId) -> Option<Product> {
        let query = Select::table(TABLE).filter_eq("id", id.as_i32());
        let result = match self.gateway.select_single(&query).await {
            Ok(row) => decode_row(row),
            Err(e) => Err(e),
        };

        match result {
            Ok(product) => Some(product),
            Err(GatewayError::NotFound(_)) => None,
            Err(e) => {
                error!(error = %e, "Failed to fetch product");
                None
            }
        }
    }

    /// Products whose `category` label equals `category`, newest first.
    #[instrument(skip(self))]
    pub async fn by_category(&self, category: &str) -> Vec<Product> {
        let query = Select::table(TABLE)
            .filter_eq("category", category)
            .order_by("created_at", Direction::Descending);
        self.fetch_many(&query, "Failed to list products by category")
            .await
    }

    /// Other products in the same category as `product`, newest first, at
    /// most `limit` of them.
    #[instrument(skip(self, product), fields(id = %product.id))]
    pub async fn related(&self, product: &Product, limit: usize) -> Vec<Product> {
        self.by_category(&product.category)
            .await
            .into_iter()
            .filter(|other| other.id != product.id)
            .take(limit)
            .collect()
    }

    /// Products flagged for the home page, newest first.
    #[instrument(skip(self))]
    pub async fn featured(&self) -> Vec<Product> {
        let query = Select::table(TABLE)
            .filter_eq("featured", true)
            .order_by("created_at", Direction::Descending);
        self.fetch_many(&query, "Failed to list featured products")
            .await
    }

    /// Substring search over name, description and category, newest first,
    /// without a result cap or cache.
    #[instrument(skip(self))]
    pub async fn search(&self, text: &str) -> Vec<Product> {
        let query = Select::table(TABLE)
            .ilike_any(["name", "description", "category"], text)
            .order_by("created_at", Direction::Descending);
        self.fetch_many(&query, "Failed to search products").await
    }

    /// Insert a product. Requires a live session.
    #[instrument(skip(self, session, product), fields(name = %product.name))]
    pub async fn create(&self, session: Option<&Session>, product: &NewProduct) -> Option<Product> {
        if !session_is_live(session, "create product") {
            return None;
        }

        let result = match encode_row(product) {
            Ok(row) => self.gateway.insert(TABLE, row).await.and_then(decode_row),
            Err(e) => Err(e),
        };

        result
            .map_err(|e| error!(error = %e, "Failed to create product"))
            .ok()
    }

    /// Apply `patch` to a product. Requires a live session.
    ///
    /// Returns `None` if the product does not exist.
    #[instrument(skip(self, session, patch))]
    pub async fn update(
        &self,
        session: Option<&Session>,
        id: ProductId,
        patch: &ProductPatch,
    ) -> Option<Product> {
        if !session_is_live(session, "update product") {
            return None;
        }
        if patch.is_empty() {
            return self.get(id).await;
        }

        let key = Equals::new("id", id.as_i32());
        let result = match encode_row(patch) {
            Ok(row) => self.gateway.update(TABLE, &key, row).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(rows) => match rows.into_iter().next().map(decode_row) {
                Some(Ok(product)) => Some(product),
                Some(Err(e)) => {
                    error!(error = %e, "Failed to decode updated product");
                    None
                }
                None => {
                    warn!("No product to update");
                    None
                }
            },
            Err(e) => {
                error!(error = %e, "Failed to update product");
                None
            }
        }
    }

    /// Delete a product. Requires a live session.
    #[instrument(skip(self, session))]
    pub async fn delete(&self, session: Option<&Session>, id: ProductId) -> bool {
        if !session_is_live(session, "delete product") {
            return false;
        }

        match self
            .gateway
            .delete(TABLE, &Equals::new("id", id.as_i32()))
            .await
        {
            Ok(()) => true,
            Err(e) => {
                error!(error = %e, "Failed to delete product");
                false
            }
        }
    }

    async fn fetch_many(&self, query: &Select, failure: &str) -> Vec<Product> {
        let result = match self.gateway.select(query).await {
            Ok(rows) => decode_rows(rows),
            Err(e) => Err(e),
        };

        result.unwrap_or_else(|e| {
            error!(error = %e, "{failure}");
            Vec::new()
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use marys_fashion_core::Price;
    use uuid::Uuid;

    use super::*;
    use crate::gateway::{AuthUser, MemoryBackend, Record};

    fn service() -> (MemoryBackend, ProductService) {
        let backend = MemoryBackend::with_demo_catalog();
        (backend.clone(), ProductService::new(Arc::new(backend)))
    }

    fn session(expires_at: i64) -> Session {
        Session {
            access_token: "token".to_string(),
            refresh_token: None,
            expires_at: Some(expires_at),
            user: AuthUser {
                id: Uuid::new_v4(),
                email: Some("admin@marysfashion.com.br".to_string()),
                user_metadata: Record::new(),
                created_at: Utc::now(),
                updated_at: None,
                last_sign_in_at: None,
            },
        }
    }

    fn live() -> Session {
        session(Utc::now().timestamp() + 3600)
    }

    fn new_product() -> NewProduct {
        NewProduct {
            name: "Macacão Linho".to_string(),
            description: "Macacão de linho com cinto".to_string(),
            price: Price::from_cents(15990).unwrap(),
            category: "vestidos".to_string(),
            images: Vec::new(),
            sizes: vec!["P".to_string(), "M".to_string()],
            colors: vec!["Areia".to_string()],
            in_stock: true,
            featured: None,
        }
    }

    #[tokio::test]
    async fn test_reads() {
        let (_, products) = service();

        let all = products.list().await;
        assert_eq!(all.len(), 6);
        assert_eq!(all[0].id, ProductId::new(6));

        assert_eq!(products.featured().await.len(), 2);
        assert_eq!(products.by_category("saias").await.len(), 1);
        assert!(products.by_category("Saias").await.is_empty());
        assert_eq!(products.search("AZUL").await.len(), 0);
        assert_eq!(products.search("confort").await.len(), 4);
        assert!(products.get(ProductId::new(99)).await.is_none());
    }

    #[tokio::test]
    async fn test_writes_require_session() {
        let (backend, products) = service();

        assert!(products.create(None, &new_product()).await.is_none());
        let expired = session(0);
        assert!(products.create(Some(&expired), &new_product()).await.is_none());
        assert!(!products.delete(None, ProductId::new(1)).await);
        assert_eq!(backend.select_calls(), 0);
        assert_eq!(products.list().await.len(), 6);
    }

    #[tokio::test]
    async fn test_create_update_delete() {
        let (_, products) = service();
        let session = live();

        let created = products
            .create(Some(&session), &new_product())
            .await
            .unwrap();
        assert_eq!(created.id, ProductId::new(7));
        assert!(created.created_at.is_some());

        let patch = ProductPatch {
            in_stock: Some(false),
            featured: Some(true),
            ..Default::default()
        };
        let updated = products
            .update(Some(&session), created.id, &patch)
            .await
            .unwrap();
        assert!(!updated.in_stock);
        assert!(updated.is_featured());
        assert_eq!(updated.name, "Macacão Linho");

        assert!(products.delete(Some(&session), created.id).await);
        assert!(products.get(created.id).await.is_none());
    }

    #[tokio::test]
    async fn test_related_excludes_product_and_caps() {
        let (_, products) = service();
        let session = live();
        let floral = products.get(ProductId::new(1)).await.unwrap();

        assert!(products.related(&floral, RELATED_LIMIT).await.is_empty());

        let mut created = Vec::new();
        for _ in 0..4 {
            created.push(products.create(Some(&session), &new_product()).await.unwrap());
        }

        let related = products.related(&floral, RELATED_LIMIT).await;
        let ids: Vec<_> = related.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![created[3].id, created[2].id, created[1].id]);

        let others = products.related(&created[0], 10).await;
        assert_eq!(others.len(), 4);
        assert!(others.iter().all(|p| p.id != created[0].id));
    }

    #[tokio::test]
    async fn test_update_missing_product() {
        let (_, products) = service();
        let patch = ProductPatch {
            name: Some("Nada".to_string()),
            ..Default::default()
        };
        assert!(
            products
                .update(Some(&live()), ProductId::new(404), &patch)
                .await
                .is_none()
        );
    }
}
