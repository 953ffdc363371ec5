//! Integration tests for the cart API.
//!
//! Carts belong to accounts, not sessions: they survive sign-out, follow the
//! account into a new session, and never bleed into another account.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use serde_json::json;

use grocer_integration_tests::{TestApp, catalog, shopper};

// =============================================================================
// Mutations
// =============================================================================

#[tokio::test]
async fn test_add_update_remove_clear() {
    let app = TestApp::new(catalog());
    let cookie = app.sign_in(&shopper(1)).await;
    let cookie = Some(cookie.as_str());

    let res = app.post("/cart/add", cookie, json!({ "product_id": 1 })).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["item_count"], 1);
    assert_eq!(res.body["total"], "120.00");

    app.post("/cart/add", cookie, json!({ "product_id": 2 })).await;
    let res = app
        .post("/cart/update", cookie, json!({ "product_id": 1, "delta": 2 }))
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["item_count"], 4);
    assert_eq!(res.body["items"][0]["quantity"], 3);
    assert_eq!(res.body["items"][0]["line_total"], "360.00");
    assert_eq!(res.body["total"], "387.00");

    let res = app
        .post("/cart/remove", cookie, json!({ "product_id": 1 }))
        .await;
    assert_eq!(res.body["items"].as_array().unwrap().len(), 1);
    assert_eq!(res.body["items"][0]["product_id"], 2);

    let res = app.post("/cart/clear", cookie, json!({})).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["item_count"], 0);
    assert_eq!(res.body["total"], "0");
}

#[tokio::test]
async fn test_decrement_to_zero_removes_line() {
    let app = TestApp::new(catalog());
    let cookie = app.sign_in(&shopper(1)).await;
    let cookie = Some(cookie.as_str());

    app.post("/cart/add", cookie, json!({ "product_id": 1 })).await;
    let res = app
        .post("/cart/update", cookie, json!({ "product_id": 1, "delta": -5 }))
        .await;

    assert_eq!(res.status, StatusCode::OK);
    assert!(res.body["items"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_unknown_and_inactive_products_rejected() {
    let app = TestApp::new(catalog());
    let cookie = app.sign_in(&shopper(1)).await;
    let cookie = Some(cookie.as_str());

    let res = app.post("/cart/add", cookie, json!({ "product_id": 99 })).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(res.error_code(), Some("not_found"));

    // Product 3 exists but is not listed
    let res = app.post("/cart/add", cookie, json!({ "product_id": 3 })).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);

    let res = app.get("/cart", cookie).await;
    assert_eq!(res.body["item_count"], 0);
}

// =============================================================================
// Persistence
// =============================================================================

#[tokio::test]
async fn test_cart_follows_account_into_new_session() {
    let app = TestApp::new(catalog());

    let first = app.sign_in(&shopper(1)).await;
    app.post("/cart/add", Some(&first), json!({ "product_id": 1 }))
        .await;
    app.post("/cart/add", Some(&first), json!({ "product_id": 1 }))
        .await;

    let second = app.sign_in(&shopper(1)).await;
    assert_ne!(first, second);

    let res = app.get("/cart", Some(&second)).await;
    assert_eq!(res.body["item_count"], 2);
}

#[tokio::test]
async fn test_accounts_never_share_lines() {
    let app = TestApp::new(catalog());
    let alice = app.sign_in(&shopper(1)).await;
    let bob = app.sign_in(&shopper(2)).await;

    app.post("/cart/add", Some(&alice), json!({ "product_id": 1 }))
        .await;
    app.post("/cart/add", Some(&bob), json!({ "product_id": 2 }))
        .await;

    let alice_cart = app.get("/cart", Some(&alice)).await;
    let bob_cart = app.get("/cart", Some(&bob)).await;

    assert_eq!(alice_cart.body["items"].as_array().unwrap().len(), 1);
    assert_eq!(alice_cart.body["items"][0]["product_id"], 1);
    assert_eq!(bob_cart.body["items"].as_array().unwrap().len(), 1);
    assert_eq!(bob_cart.body["items"][0]["product_id"], 2);
}

#[tokio::test]
async fn test_logout_keeps_persisted_cart() {
    let app = TestApp::new(catalog());
    let cookie = app.sign_in(&shopper(1)).await;
    app.post("/cart/add", Some(&cookie), json!({ "product_id": 2 }))
        .await;

    let res = app.post("/auth/logout", Some(&cookie), json!({})).await;
    assert_eq!(res.status, StatusCode::NO_CONTENT);

    let res = app.get("/cart", Some(&cookie)).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);

    let again = app.sign_in(&shopper(1)).await;
    let res = app.get("/cart", Some(&again)).await;
    assert_eq!(res.body["item_count"], 1);
}

#[tokio::test]
async fn test_corrupt_persisted_cart_reads_as_empty() {
    let app = TestApp::new(catalog());
    app.stores.carts.put_raw("cart_1", "{ not a cart").await;

    let cookie = app.sign_in(&shopper(1)).await;
    let res = app.get("/cart", Some(&cookie)).await;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["item_count"], 0);

    // The next write replaces the corrupt copy
    app.post("/cart/add", Some(&cookie), json!({ "product_id": 1 }))
        .await;
    let raw = app.stores.carts.get_raw("cart_1").await.unwrap();
    assert!(raw.contains("Apples"));
}

#[tokio::test]
async fn test_storage_outage_surfaces_and_keeps_cart() {
    let app = TestApp::new(catalog());
    let cookie = app.sign_in(&shopper(1)).await;
    let cookie = Some(cookie.as_str());
    app.post("/cart/add", cookie, json!({ "product_id": 1 })).await;

    app.stores.carts.set_unavailable(true);
    let res = app.post("/cart/add", cookie, json!({ "product_id": 2 })).await;
    assert_eq!(res.status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(res.error_code(), Some("unavailable"));

    app.stores.carts.set_unavailable(false);
    let res = app.get("/cart", cookie).await;
    assert_eq!(res.body["item_count"], 1);
    assert_eq!(res.body["items"][0]["product_id"], 1);
}

#[tokio::test]
async fn test_cart_requires_sign_in() {
    let app = TestApp::new(catalog());

    let res = app.get("/cart", None).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.error_code(), Some("unauthorized"));

    let res = app.post("/cart/add", None, json!({ "product_id": 1 })).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
}
