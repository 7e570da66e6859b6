//! Integration tests for the storefront HTTP API.
//!
//! The router is served in-process over the demo catalog; no network or
//! backend credentials are needed.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use axum::http::StatusCode;
use marys_fashion_core::{NewProduct, Price};
use marys_fashion_integration_tests::{admin_session, get_json, ids, storefront};
use marys_fashion_storefront::services::ProductService;
use serde_json::Value;

// ============================================================================
// Health
// ============================================================================

#[tokio::test]
async fn test_health() {
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use tower::ServiceExt;

    let (_, app) = storefront();
    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = to_bytes(response.into_body(), 64).await.unwrap();
    assert_eq!(&body[..], b"ok");
}

// ============================================================================
// Search
// ============================================================================

#[tokio::test]
async fn test_search_returns_newest_first() {
    let (_, app) = storefront();

    let (status, body) = get_json(&app, "/api/search?q=elegante").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body), vec![5, 4, 2, 1]);
}

#[tokio::test]
async fn test_search_blank_query_is_empty() {
    let (backend, app) = storefront();

    let (status, body) = get_json(&app, "/api/search?q=%20%20").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::Array(Vec::new()));
    assert_eq!(backend.select_calls(), 0);
}

#[tokio::test]
async fn test_suggest_shapes_suggestions() {
    let (_, app) = storefront();

    let (status, body) = get_json(&app, "/api/search/suggest?q=sai").await;
    assert_eq!(status, StatusCode::OK);

    let first = &body[0];
    assert_eq!(first["id"], "5");
    assert_eq!(first["text"], "Saia Midi Plissada");
    assert_eq!(first["type"], "name");
    assert_eq!(first["highlight"], "<strong>Sai</strong>a Midi Plissada");

    let kinds: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|s| s["type"].as_str())
        .collect();
    assert!(kinds.contains(&"category"));
}

#[tokio::test]
async fn test_suggest_short_query_skips_backend() {
    let (backend, app) = storefront();

    let (status, body) = get_json(&app, "/api/search/suggest?q=s").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::Array(Vec::new()));
    assert_eq!(backend.select_calls(), 0);
}

// ============================================================================
// Products
// ============================================================================

#[tokio::test]
async fn test_catalog_defaults() {
    let (_, app) = storefront();

    let (status, body) = get_json(&app, "/api/products").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 6);
    assert_eq!(body["page"], 1);
    assert_eq!(body["has_more"], false);
    assert_eq!(body["products"][0]["name"], "Blazer Feminino Clássico");
    assert_eq!(body["products"][0]["inStock"], true);
}

#[tokio::test]
async fn test_catalog_filters_and_sorts() {
    let (_, app) = storefront();

    let (_, body) = get_json(&app, "/api/products?q=confort&sort=price-asc").await;
    assert_eq!(ids(&body["products"]), vec![3, 1, 6, 2]);

    let (_, body) = get_json(&app, "/api/products?category=blusas").await;
    assert_eq!(ids(&body["products"]), vec![4]);

    let (_, body) = get_json(&app, "/api/products?sort=featured").await;
    assert_eq!(ids(&body["products"])[..2], [1, 2]);
}

#[tokio::test]
async fn test_featured_products() {
    let (_, app) = storefront();

    let (status, body) = get_json(&app, "/api/products/featured").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body), vec![2, 1]);
}

#[tokio::test]
async fn test_product_detail() {
    let (_, app) = storefront();

    let (status, body) = get_json(&app, "/api/products/3").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Calça Jeans Skinny");
    assert_eq!(body["price"], 79.9);
    assert_eq!(
        body["order_url"],
        "https://wa.me/5563992345422?text=Ol%C3%A1!%20Gostaria%20de%20fazer%20um%20pedido%20do%20produto%3A%20Cal%C3%A7a%20Jeans%20Skinny%20-%20R%24%2079%2C90"
    );

    let (status, body) = get_json(&app, "/api/products/404").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());

    let (status, _) = get_json(&app, "/api/products/vestido").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_related_products() {
    let (backend, app) = storefront();
    let products = ProductService::new(Arc::new(backend.clone()));
    let session = admin_session(&backend).await;

    let (status, body) = get_json(&app, "/api/products/3/related").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::Array(Vec::new()));

    let mut created = Vec::new();
    for name in ["Calça Pantalona", "Calça Cargo", "Calça Alfaiataria", "Calça Wide Leg"] {
        let product = NewProduct {
            name: name.to_string(),
            description: String::new(),
            price: Price::from_cents(11990).unwrap(),
            category: "calcas".to_string(),
            images: Vec::new(),
            sizes: Vec::new(),
            colors: Vec::new(),
            in_stock: true,
            featured: None,
        };
        let product = products.create(Some(&session), &product).await.unwrap();
        created.push(i64::from(product.id.as_i32()));
    }

    let (_, body) = get_json(&app, "/api/products/3/related").await;
    assert_eq!(ids(&body), vec![created[3], created[2], created[1]]);

    let (status, _) = get_json(&app, "/api/products/404/related").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ============================================================================
// Categories
// ============================================================================

#[tokio::test]
async fn test_categories() {
    let (_, app) = storefront();

    let (status, body) = get_json(&app, "/api/categories").await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|c| c["name"].as_str())
        .collect();
    assert_eq!(names.len(), 6);
    assert_eq!(names[0], "Blazers");

    let (status, body) = get_json(&app, "/api/categories/5").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Saias");

    let (status, _) = get_json(&app, "/api/categories/99").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
