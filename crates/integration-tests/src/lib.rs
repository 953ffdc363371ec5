//! Integration tests for Grocer.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p grocer-integration-tests
//! ```
//!
//! The storefront router runs against the in-memory stores and an in-memory
//! session store, so no database is needed. Requests are driven with
//! `tower::ServiceExt::oneshot`.
//!
//! # Test Categories
//!
//! - `cart_lifecycle` - Cart persistence across sessions and accounts
//! - `checkout` - Order placement through the HTTP API
//! - `order_admin` - Status transitions, revenue and the dashboard
//! - `http_api` - Health, auth guards and error bodies

use std::sync::Arc;

use axum::{
    Json, Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
    routing::post,
};
use serde_json::Value;
use tower::ServiceExt;
use tower_sessions::{MemoryStore, Session};

use grocer_core::{AccountId, AccountRole, Category, Money, Phone, Product, ProductId};
use grocer_storefront::config::OrdersConfig;
use grocer_storefront::db::{MemoryCartStorage, MemoryInventory, MemoryOrders};
use grocer_storefront::middleware::{session_layer, sign_in};
use grocer_storefront::models::CurrentAccount;
use grocer_storefront::routes;
use grocer_storefront::state::{AppState, Stores};

/// Path of the test-only sign-in route.
pub const SIGN_IN_PATH: &str = "/test/sign-in";

/// Peer address reported to the checkout rate limiter.
const CLIENT_IP: &str = "203.0.113.7";

/// Concrete handles on the stores behind a [`TestApp`].
#[derive(Clone)]
pub struct TestStores {
    pub carts: Arc<MemoryCartStorage>,
    pub orders: Arc<MemoryOrders>,
    pub inventory: Arc<MemoryInventory>,
}

/// A decoded response.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
    pub set_cookie: Option<String>,
}

impl TestResponse {
    /// The `error` code of a JSON error body.
    #[must_use]
    pub fn error_code(&self) -> Option<&str> {
        self.body.get("error").and_then(Value::as_str)
    }
}

/// The storefront router wired to in-memory stores.
pub struct TestApp {
    router: Router,
    pub stores: TestStores,
}

impl TestApp {
    /// Build an app whose catalog holds `products`.
    #[must_use]
    pub fn new(products: impl IntoIterator<Item = Product>) -> Self {
        Self::with_config(products, &OrdersConfig::default())
    }

    #[must_use]
    pub fn with_config(products: impl IntoIterator<Item = Product>, config: &OrdersConfig) -> Self {
        let stores = TestStores {
            carts: Arc::new(MemoryCartStorage::new()),
            orders: Arc::new(MemoryOrders::new()),
            inventory: Arc::new(MemoryInventory::with_products(products)),
        };

        let state = AppState::with_orders_config(
            config,
            Stores {
                carts: stores.carts.clone(),
                orders: stores.orders.clone(),
                inventory: stores.inventory.clone(),
            },
        );

        let router = Router::new()
            .merge(routes::routes())
            .route(SIGN_IN_PATH, post(test_sign_in))
            .layer(session_layer(MemoryStore::default(), false))
            .with_state(state);

        Self { router, stores }
    }

    /// Sign `account` in and return the session cookie.
    ///
    /// # Panics
    ///
    /// Panics if the sign-in route does not issue a cookie.
    #[allow(clippy::expect_used)]
    pub async fn sign_in(&self, account: &CurrentAccount) -> String {
        let body = serde_json::to_value(account).expect("account serializes");
        let response = self
            .request(Method::POST, SIGN_IN_PATH, None, Some(body))
            .await;
        assert_eq!(response.status, StatusCode::NO_CONTENT);
        response.set_cookie.expect("sign-in sets a session cookie")
    }

    pub async fn get(&self, path: &str, cookie: Option<&str>) -> TestResponse {
        self.request(Method::GET, path, cookie, None).await
    }

    pub async fn post(&self, path: &str, cookie: Option<&str>, body: Value) -> TestResponse {
        self.request(Method::POST, path, cookie, Some(body)).await
    }

    pub async fn patch(&self, path: &str, cookie: Option<&str>, body: Value) -> TestResponse {
        self.request(Method::PATCH, path, cookie, Some(body)).await
    }

    /// Send one request through the router.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be built or the body cannot be read.
    #[allow(clippy::expect_used)]
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        cookie: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder()
            .method(method)
            .uri(path)
            .header("x-forwarded-for", CLIENT_IP);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }

        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("valid request");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");

        let status = response.status();
        let set_cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .map(str::to_string);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("readable body");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };

        TestResponse {
            status,
            body,
            set_cookie,
        }
    }
}

async fn test_sign_in(session: Session, Json(account): Json<CurrentAccount>) -> StatusCode {
    match sign_in(&session, &account).await {
        Ok(()) => StatusCode::NO_CONTENT,
        Err(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

// =============================================================================
// Fixtures
// =============================================================================

/// A shopper account.
///
/// # Panics
///
/// Never; the phone number is a valid literal.
#[must_use]
#[allow(clippy::expect_used)]
pub fn shopper(id: i32) -> CurrentAccount {
    CurrentAccount {
        id: AccountId::new(id),
        name: format!("Shopper {id}"),
        phone: Phone::parse("98765 43210").expect("valid phone"),
        role: AccountRole::User,
    }
}

/// An admin account.
#[must_use]
pub fn admin(id: i32) -> CurrentAccount {
    CurrentAccount {
        role: AccountRole::Admin,
        name: format!("Admin {id}"),
        ..shopper(id)
    }
}

/// An active product priced in paise.
#[must_use]
pub fn product(id: i32, name: &str, price_minor: u32, stock: u32) -> Product {
    Product {
        id: ProductId::new(id),
        name: name.to_string(),
        category: Category::Fruits,
        unit_price: Money::from_minor(price_minor),
        unit: "1 kg".to_string(),
        glyph: "🍎".to_string(),
        stock,
        is_active: true,
    }
}

/// A small catalog: apples (₹120, 30 left), milk (₹27, 5 left) and an
/// inactive seasonal product.
#[must_use]
pub fn catalog() -> Vec<Product> {
    vec![
        product(1, "Apples", 12_000, 30),
        Product {
            category: Category::Dairy,
            unit: "500 ml".to_string(),
            glyph: "🥛".to_string(),
            ..product(2, "Toned Milk", 2_700, 5)
        },
        Product {
            is_active: false,
            ..product(3, "Mangoes", 25_000, 0)
        },
    ]
}

/// A cash-on-delivery checkout body.
#[must_use]
pub fn cod_checkout(idempotency_key: Option<uuid::Uuid>) -> Value {
    let mut body = serde_json::json!({ "payment": { "method": "cod" } });
    if let Some(key) = idempotency_key {
        body["idempotency_key"] = Value::String(key.to_string());
    }
    body
}
