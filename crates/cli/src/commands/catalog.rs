//! Product and category commands.
//!
//! # Usage
//!
//! ```bash
//! mf-cli products list --featured
//! mf-cli products create --file vestido.json
//! mf-cli products update 7 --file patch.json
//! mf-cli categories create --file acessorios.json
//! ```

use std::path::Path;

use marys_fashion_core::{CategoryId, CategoryPatch, NewCategory, NewProduct, ProductId, ProductPatch};
use marys_fashion_storefront::services::{CategoryService, ProductService};

use super::{CliError, Context, ensure, print_json, read_json, require};

/// Which products to list.
#[derive(Debug, Default)]
pub struct ProductFilter {
    pub category: Option<String>,
    pub featured: bool,
    pub search: Option<String>,
}

pub async fn list_products(ctx: &Context, filter: &ProductFilter) -> Result<(), CliError> {
    let products = ProductService::new(ctx.gateways.data.clone());
    let found = if let Some(text) = &filter.search {
        products.search(text).await
    } else if let Some(category) = &filter.category {
        products.by_category(category).await
    } else if filter.featured {
        products.featured().await
    } else {
        products.list().await
    };

    tracing::info!("{} product(s)", found.len());
    print_json(&found)
}

pub async fn get_product(ctx: &Context, id: ProductId) -> Result<(), CliError> {
    let product = ProductService::new(ctx.gateways.data.clone())
        .get(id)
        .await
        .ok_or_else(|| CliError::NotFound(format!("product {id}")))?;
    print_json(&product)
}

pub async fn create_product(ctx: &Context, file: &Path) -> Result<(), CliError> {
    let payload: NewProduct = read_json(file)?;
    let session = ctx.admin_session().await?;

    let created = ProductService::new(ctx.gateways.data.clone())
        .create(Some(&session), &payload)
        .await;
    print_json(&require(created, "product create")?)
}

pub async fn update_product(ctx: &Context, id: ProductId, file: &Path) -> Result<(), CliError> {
    let patch: ProductPatch = read_json(file)?;
    let session = ctx.admin_session().await?;

    let updated = ProductService::new(ctx.gateways.data.clone())
        .update(Some(&session), id, &patch)
        .await;
    print_json(&require(updated, "product update")?)
}

pub async fn delete_product(ctx: &Context, id: ProductId) -> Result<(), CliError> {
    let session = ctx.admin_session().await?;
    let deleted = ProductService::new(ctx.gateways.data.clone())
        .delete(Some(&session), id)
        .await;
    ensure(deleted, "product delete")?;
    tracing::info!("Deleted product {}", id);
    Ok(())
}

pub async fn list_categories(ctx: &Context) -> Result<(), CliError> {
    let categories = CategoryService::new(ctx.gateways.data.clone())
        .list()
        .await?;
    print_json(&categories)
}

pub async fn create_category(ctx: &Context, file: &Path) -> Result<(), CliError> {
    let payload: NewCategory = read_json(file)?;
    let created = CategoryService::new(ctx.gateways.data.clone())
        .create(&payload)
        .await?;
    print_json(&created)
}

pub async fn update_category(ctx: &Context, id: CategoryId, file: &Path) -> Result<(), CliError> {
    let patch: CategoryPatch = read_json(file)?;
    let updated = CategoryService::new(ctx.gateways.data.clone())
        .update(id, &patch)
        .await?;
    print_json(&updated)
}

pub async fn delete_category(ctx: &Context, id: CategoryId) -> Result<(), CliError> {
    CategoryService::new(ctx.gateways.data.clone())
        .delete(id)
        .await?;
    tracing::info!("Deleted category {}", id);
    Ok(())
}
