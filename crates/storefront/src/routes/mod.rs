//! HTTP route handlers for the storefront JSON API.
//!
//! # Route Structure
//!
//! ```text
//! GET   /health                    - Liveness check
//! GET   /health/ready              - Readiness check (order store ping)
//!
//! # Catalog
//! GET   /products                  - Active products with stock
//!
//! # Cart (requires sign-in)
//! GET   /cart                      - Current cart
//! POST  /cart/add                  - Add one unit {product_id}
//! POST  /cart/update               - Change quantity {product_id, delta}
//! POST  /cart/remove               - Remove a line {product_id}
//! POST  /cart/clear                - Empty the cart
//!
//! # Checkout (requires sign-in, rate limited)
//! POST  /checkout                  - Place an order {payment, idempotency_key?}
//!
//! # Orders (requires sign-in)
//! GET   /orders                    - Own orders, newest first
//! GET   /orders/{id}               - One own order
//!
//! # Auth
//! POST  /auth/logout               - Sign out
//!
//! # Admin (requires admin role)
//! GET   /admin/orders              - All orders
//! POST  /admin/orders/{id}/status  - Change status {status}
//! GET   /admin/revenue             - Delivered revenue
//! GET   /admin/dashboard           - Dashboard stats
//! PATCH /admin/products/{id}       - Edit stock or price {stock?, price?}
//! ```
//!
//! Sign-in is owned by the account service in front of the storefront; it
//! calls [`crate::middleware::sign_in`] to attach an account to the session.

pub mod admin;
pub mod auth;
pub mod cart;
pub mod checkout;
pub mod health;
pub mod orders;
pub mod products;

use axum::{
    Router,
    routing::{get, patch, post},
};

use crate::middleware::checkout_rate_limiter;
use crate::state::AppState;

/// Create the health check router.
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(health::health))
        .route("/ready", get(health::readiness))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/clear", post(cart::clear))
}

/// Create the checkout router with its rate limiter.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(checkout::place_order))
        .layer(checkout_rate_limiter())
}

/// Create the order history router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::index))
        .route("/{id}", get(orders::show))
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new().route("/logout", post(auth::logout))
}

/// Create the admin console router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/orders", get(admin::orders))
        .route("/orders/{id}/status", post(admin::set_status))
        .route("/revenue", get(admin::revenue))
        .route("/dashboard", get(admin::dashboard))
        .route("/products/{id}", patch(admin::update_product))
}

/// Create all routes for the storefront.
///
/// Handlers that need a signed-in account read it from the session, so the
/// caller must add a session layer.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/health", health_routes())
        .route("/products", get(products::index))
        .nest("/cart", cart_routes())
        .nest("/checkout", checkout_routes())
        .nest("/orders", order_routes())
        .nest("/auth", auth_routes())
        .nest("/admin", admin_routes())
}
