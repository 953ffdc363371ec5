//! Integration tests for the HTTP surface: health checks, the public catalog,
//! request validation and error bodies.

#![allow(clippy::unwrap_used)]

use axum::http::{Method, StatusCode};
use serde_json::json;

use grocer_integration_tests::{TestApp, catalog, cod_checkout, shopper};

#[tokio::test]
async fn test_health() {
    let app = TestApp::new(catalog());

    let res = app.get("/health", None).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body, "ok");
}

#[tokio::test]
async fn test_readiness_follows_order_store() {
    let app = TestApp::new(catalog());

    let res = app.get("/health/ready", None).await;
    assert_eq!(res.status, StatusCode::OK);

    app.stores.orders.set_unavailable(true);
    let res = app.get("/health/ready", None).await;
    assert_eq!(res.status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_catalog_hides_inactive_products() {
    let app = TestApp::new(catalog());

    let res = app.get("/products", None).await;

    assert_eq!(res.status, StatusCode::OK);
    let products = res.body.as_array().unwrap();
    assert_eq!(products.len(), 2);
    assert!(products.iter().all(|p| p["is_active"] == true));
    assert_eq!(products[1]["category"], "dairy");
    assert_eq!(products[1]["unit_price"], "27.00");
}

#[tokio::test]
async fn test_catalog_outage_is_unavailable() {
    let app = TestApp::new(catalog());
    app.stores.inventory.set_unavailable(true);

    let res = app.get("/products", None).await;

    assert_eq!(res.status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(res.error_code(), Some("unavailable"));
    assert!(res.body["message"].is_string());
}

#[tokio::test]
async fn test_malformed_order_id_is_bad_request() {
    let app = TestApp::new(catalog());
    let cookie = app.sign_in(&shopper(1)).await;

    let res = app.get("/orders/not-a-uuid", Some(&cookie)).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_payment_method_is_rejected() {
    let app = TestApp::new(catalog());
    let cookie = app.sign_in(&shopper(1)).await;
    app.post("/cart/add", Some(&cookie), json!({ "product_id": 1 }))
        .await;

    let body = json!({ "payment": { "method": "barter" } });
    let res = app.post("/checkout", Some(&cookie), body).await;
    assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY);

    let cart = app.get("/cart", Some(&cookie)).await;
    assert_eq!(cart.body["item_count"], 1);
}

#[tokio::test]
async fn test_checkout_is_rate_limited() {
    let app = TestApp::new(catalog());
    let cookie = app.sign_in(&shopper(1)).await;

    // Empty-cart attempts still count against the limit
    let mut statuses = Vec::new();
    for _ in 0..6 {
        let res = app.post("/checkout", Some(&cookie), cod_checkout(None)).await;
        statuses.push(res.status);
    }

    assert!(statuses.iter().take(5).all(|s| *s == StatusCode::BAD_REQUEST));
    assert_eq!(statuses.last(), Some(&StatusCode::TOO_MANY_REQUESTS));
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let app = TestApp::new(catalog());

    let res = app.request(Method::DELETE, "/cart", None, None).await;
    assert_eq!(res.status, StatusCode::METHOD_NOT_ALLOWED);

    let res = app.get("/nowhere", None).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
}
