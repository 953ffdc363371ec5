//! Integration tests for the admin console.
//!
//! Covers the order status lifecycle, revenue, the dashboard and product
//! edits, plus the role checks in front of all of them.

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use axum::http::StatusCode;
use serde_json::{Value, json};

use grocer_integration_tests::{TestApp, admin, catalog, cod_checkout, shopper};
use grocer_storefront::config::OrdersConfig;

/// Place a cash-on-delivery order of `product_id` for `account_id`.
async fn place_order(app: &TestApp, account_id: i32, product_id: i32) -> String {
    let cookie = app.sign_in(&shopper(account_id)).await;
    app.post("/cart/add", Some(&cookie), json!({ "product_id": product_id }))
        .await;
    let res = app.post("/checkout", Some(&cookie), cod_checkout(None)).await;
    assert_eq!(res.status, StatusCode::CREATED);
    res.body["order_id"].as_str().unwrap().to_string()
}

fn status_path(order_id: &str) -> String {
    format!("/admin/orders/{order_id}/status")
}

// =============================================================================
// Status Lifecycle
// =============================================================================

#[tokio::test]
async fn test_order_lifecycle_and_revenue() {
    let app = TestApp::new(catalog());
    let order_id = place_order(&app, 1, 1).await;
    let staff = app.sign_in(&admin(100)).await;

    let res = app.get("/admin/revenue", Some(&staff)).await;
    assert_eq!(res.body["delivered_revenue"], "0");

    let res = app
        .post(&status_path(&order_id), Some(&staff), json!({ "status": "confirmed" }))
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["status"], "confirmed");

    let res = app
        .post(&status_path(&order_id), Some(&staff), json!({ "status": "delivered" }))
        .await;
    assert_eq!(res.body["status"], "delivered");

    let res = app.get("/admin/revenue", Some(&staff)).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["delivered_revenue"], "120.00");

    // The customer sees the new status too
    let customer = app.sign_in(&shopper(1)).await;
    let res = app.get(&format!("/orders/{order_id}"), Some(&customer)).await;
    assert_eq!(res.body["status"], "delivered");
}

#[tokio::test]
async fn test_illegal_transitions_rejected() {
    let app = TestApp::new(catalog());
    let order_id = place_order(&app, 1, 1).await;
    let staff = app.sign_in(&admin(100)).await;

    let res = app
        .post(&status_path(&order_id), Some(&staff), json!({ "status": "delivered" }))
        .await;
    assert_eq!(res.status, StatusCode::CONFLICT);
    assert_eq!(res.error_code(), Some("illegal_transition"));

    let res = app
        .post(&status_path(&order_id), Some(&staff), json!({ "status": "cancelled" }))
        .await;
    assert_eq!(res.status, StatusCode::OK);

    // Cancelled is terminal
    let res = app
        .post(&status_path(&order_id), Some(&staff), json!({ "status": "confirmed" }))
        .await;
    assert_eq!(res.status, StatusCode::CONFLICT);

    let res = app.get("/admin/orders", Some(&staff)).await;
    assert_eq!(res.body[0]["status"], "cancelled");
}

#[tokio::test]
async fn test_same_status_is_a_noop() {
    let app = TestApp::new(catalog());
    let order_id = place_order(&app, 1, 1).await;
    let staff = app.sign_in(&admin(100)).await;

    let res = app
        .post(&status_path(&order_id), Some(&staff), json!({ "status": "pending" }))
        .await;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["status"], "pending");
    assert_eq!(res.body["created_at"], res.body["updated_at"]);
}

#[tokio::test]
async fn test_bad_status_and_unknown_order() {
    let app = TestApp::new(catalog());
    let order_id = place_order(&app, 1, 1).await;
    let staff = app.sign_in(&admin(100)).await;

    let res = app
        .post(&status_path(&order_id), Some(&staff), json!({ "status": "shipped" }))
        .await;
    assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(res.error_code(), Some("invalid_status"));

    let missing = uuid::Uuid::new_v4().to_string();
    let res = app
        .post(&status_path(&missing), Some(&staff), json!({ "status": "confirmed" }))
        .await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(res.error_code(), Some("unknown_order"));
    assert_eq!(res.body["order_id"], Value::String(missing));
}

// =============================================================================
// Listing
// =============================================================================

#[tokio::test]
async fn test_listing_is_newest_first_and_sees_new_orders() {
    let config = OrdersConfig {
        listing_cache_ttl: Duration::from_secs(3600),
        ..OrdersConfig::default()
    };
    let app = TestApp::with_config(catalog(), &config);
    let staff = app.sign_in(&admin(100)).await;

    let first = place_order(&app, 1, 1).await;
    let res = app.get("/admin/orders", Some(&staff)).await;
    assert_eq!(res.body.as_array().unwrap().len(), 1);

    // A cached listing must not hide an order placed afterwards
    tokio::time::sleep(Duration::from_millis(5)).await;
    let second = place_order(&app, 2, 2).await;
    let res = app.get("/admin/orders", Some(&staff)).await;
    let listing = res.body.as_array().unwrap();
    assert_eq!(listing.len(), 2);
    assert_eq!(listing[0]["id"], Value::String(second));
    assert_eq!(listing[1]["id"], Value::String(first.clone()));

    // Nor a status change
    app.post(&status_path(&first), Some(&staff), json!({ "status": "confirmed" }))
        .await;
    let res = app.get("/admin/orders", Some(&staff)).await;
    assert_eq!(res.body[1]["status"], "confirmed");
}

#[tokio::test]
async fn test_failed_update_leaves_listing_alone() {
    let app = TestApp::new(catalog());
    let order_id = place_order(&app, 1, 1).await;
    let staff = app.sign_in(&admin(100)).await;
    app.get("/admin/orders", Some(&staff)).await;

    app.stores.orders.set_unavailable(true);
    let res = app
        .post(&status_path(&order_id), Some(&staff), json!({ "status": "confirmed" }))
        .await;
    assert_eq!(res.status, StatusCode::SERVICE_UNAVAILABLE);

    app.stores.orders.set_unavailable(false);
    let res = app.get("/admin/orders", Some(&staff)).await;
    assert_eq!(res.body[0]["status"], "pending");
}

// =============================================================================
// Dashboard and Products
// =============================================================================

#[tokio::test]
async fn test_dashboard() {
    let app = TestApp::new(catalog());
    place_order(&app, 1, 1).await;
    place_order(&app, 2, 2).await;
    let staff = app.sign_in(&admin(100)).await;

    let res = app.get("/admin/dashboard", Some(&staff)).await;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["total_orders"], 2);
    assert_eq!(res.body["delivered_revenue"], "0");
    assert_eq!(res.body["product_count"], 3);
    assert_eq!(res.body["low_stock_threshold"], 20);

    // Milk (5) and the delisted mangoes (0) are under the threshold
    let low: Vec<i64> = res.body["low_stock"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["id"].as_i64().unwrap())
        .collect();
    assert_eq!(low, vec![2, 3]);
}

#[tokio::test]
async fn test_update_product() {
    let app = TestApp::new(catalog());
    let staff = app.sign_in(&admin(100)).await;

    let res = app
        .patch("/admin/products/2", Some(&staff), json!({ "stock": 40, "price": "29.50" }))
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["stock"], 40);
    assert_eq!(res.body["unit_price"], "29.50");

    let res = app
        .patch("/admin/products/1", Some(&staff), json!({ "stock": 0 }))
        .await;
    assert_eq!(res.body["stock"], 0);
    assert_eq!(res.body["unit_price"], "120.00");

    let res = app.get("/products", None).await;
    let milk = res
        .body
        .as_array()
        .unwrap()
        .iter()
        .find(|p| p["id"] == 2)
        .unwrap()
        .clone();
    assert_eq!(milk["stock"], 40);
}

#[tokio::test]
async fn test_update_product_rejections() {
    let app = TestApp::new(catalog());
    let staff = app.sign_in(&admin(100)).await;

    let res = app.patch("/admin/products/2", Some(&staff), json!({})).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let res = app
        .patch("/admin/products/99", Some(&staff), json!({ "stock": 1 }))
        .await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(res.error_code(), Some("unknown_product"));

    let res = app
        .patch("/admin/products/2", Some(&staff), json!({ "price": "-3.00" }))
        .await;
    assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY);

    let res = app
        .patch("/admin/products/2", Some(&staff), json!({ "stock": -1 }))
        .await;
    assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_out_of_range_product_values_rejected() {
    let app = TestApp::new(catalog());
    let staff = app.sign_in(&admin(100)).await;

    let res = app
        .patch("/admin/products/2", Some(&staff), json!({ "stock": 3_000_000_000_u32 }))
        .await;
    assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(res.error_code(), Some("invalid_value"));

    let res = app
        .patch("/admin/products/2", Some(&staff), json!({ "price": "100000000.00" }))
        .await;
    assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(res.error_code(), Some("invalid_value"));

    // Nothing was written
    let res = app.get("/products", None).await;
    let milk = res
        .body
        .as_array()
        .unwrap()
        .iter()
        .find(|p| p["id"] == 2)
        .unwrap()
        .clone();
    assert_eq!(milk["stock"], 5);
    assert_eq!(milk["unit_price"], "27.00");
}

// =============================================================================
// Access Control
// =============================================================================

#[tokio::test]
async fn test_admin_routes_require_admin_role() {
    let app = TestApp::new(catalog());
    let order_id = place_order(&app, 1, 1).await;
    let customer = app.sign_in(&shopper(1)).await;

    for path in ["/admin/orders", "/admin/revenue", "/admin/dashboard"] {
        let res = app.get(path, Some(&customer)).await;
        assert_eq!(res.status, StatusCode::FORBIDDEN, "{path}");
        assert_eq!(res.error_code(), Some("forbidden"));

        let res = app.get(path, None).await;
        assert_eq!(res.status, StatusCode::UNAUTHORIZED, "{path}");
    }

    let res = app
        .post(&status_path(&order_id), Some(&customer), json!({ "status": "confirmed" }))
        .await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);

    let res = app
        .patch("/admin/products/1", Some(&customer), json!({ "stock": 0 }))
        .await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);

    let order = app.get(&format!("/orders/{order_id}"), Some(&customer)).await;
    assert_eq!(order.body["status"], "pending");
}

#[tokio::test]
async fn test_customers_see_only_their_own_orders() {
    let app = TestApp::new(catalog());
    let order_id = place_order(&app, 1, 1).await;
    place_order(&app, 2, 2).await;

    let other = app.sign_in(&shopper(2)).await;
    let res = app.get(&format!("/orders/{order_id}"), Some(&other)).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);

    let res = app.get("/orders", Some(&other)).await;
    assert_eq!(res.body.as_array().unwrap().len(), 1);
    assert_eq!(res.body[0]["customer_id"], 2);

    let staff = app.sign_in(&admin(100)).await;
    let res = app.get(&format!("/orders/{order_id}"), Some(&staff)).await;
    assert_eq!(res.status, StatusCode::OK);
}
