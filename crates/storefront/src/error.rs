//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server errors to Sentry
//! before responding to the client. All route handlers return
//! `Result<T, AppError>`.
//!
//! Errors are rendered as JSON:
//!
//! ```json
//! { "error": "invalid_payment_details", "message": "...", "field": "cvv" }
//! ```

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use grocer_core::{OrderId, ProductId};

use crate::db::RepositoryError;
use crate::services::{CartError, CheckoutError, OrderAdminError};

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Cart operation failed.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// Checkout did not produce an order.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// Admin console or order history operation failed.
    #[error("Order error: {0}")]
    Orders(#[from] OrderAdminError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// User lacks the required role.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// A backing service (such as the session store) could not be reached.
    #[error("Unavailable: {0}")]
    Unavailable(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// JSON error body.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    field: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    product_id: Option<ProductId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    order_id: Option<OrderId>,
}

impl ErrorBody {
    fn new(error: &'static str, message: impl Into<String>) -> Self {
        Self {
            error,
            message: message.into(),
            field: None,
            product_id: None,
            order_id: None,
        }
    }
}

fn repository_parts(err: &RepositoryError) -> (StatusCode, ErrorBody) {
    match err {
        e if e.is_transient() => (
            StatusCode::SERVICE_UNAVAILABLE,
            ErrorBody::new("unavailable", "Service temporarily unavailable, please retry"),
        ),
        e if e.is_invalid_value() => (
            StatusCode::UNPROCESSABLE_ENTITY,
            ErrorBody::new("invalid_value", "A value is out of the accepted range"),
        ),
        RepositoryError::NotFound => (StatusCode::NOT_FOUND, ErrorBody::new("not_found", "Not found")),
        RepositoryError::Conflict(_) => (
            StatusCode::CONFLICT,
            ErrorBody::new("conflict", "Request conflicts with existing data"),
        ),
        _ => (
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorBody::new("internal", "Internal server error"),
        ),
    }
}

fn cart_parts(err: &CartError) -> (StatusCode, ErrorBody) {
    match err {
        CartError::SignedOut => (
            StatusCode::UNAUTHORIZED,
            ErrorBody::new("unauthorized", "Sign in to use the cart"),
        ),
        CartError::Storage(e) => repository_parts(e),
    }
}

fn checkout_parts(err: &CheckoutError) -> (StatusCode, ErrorBody) {
    match err {
        CheckoutError::EmptyCart => (
            StatusCode::BAD_REQUEST,
            ErrorBody::new("empty_cart", "Your cart is empty"),
        ),
        CheckoutError::InvalidPaymentDetails(e) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            ErrorBody {
                field: Some(e.field),
                ..ErrorBody::new("invalid_payment_details", e.to_string())
            },
        ),
        CheckoutError::StockUnavailable { product_id } => (
            StatusCode::CONFLICT,
            ErrorBody {
                product_id: Some(*product_id),
                ..ErrorBody::new("stock_unavailable", err.to_string())
            },
        ),
        CheckoutError::DuplicateSubmission { order_id } => (
            StatusCode::CONFLICT,
            ErrorBody {
                order_id: Some(*order_id),
                ..ErrorBody::new("duplicate_submission", "This order has already been placed")
            },
        ),
        CheckoutError::Unauthorized => (
            StatusCode::FORBIDDEN,
            ErrorBody::new("forbidden", "Cart does not belong to this account"),
        ),
        CheckoutError::Cart(e) => cart_parts(e),
        CheckoutError::Repository(e) => repository_parts(e),
    }
}

fn orders_parts(err: &OrderAdminError) -> (StatusCode, ErrorBody) {
    match err {
        OrderAdminError::Forbidden => (
            StatusCode::FORBIDDEN,
            ErrorBody::new("forbidden", "Admin role required"),
        ),
        OrderAdminError::UnknownOrder { order_id } => (
            StatusCode::NOT_FOUND,
            ErrorBody {
                order_id: Some(*order_id),
                ..ErrorBody::new("unknown_order", "Order not found")
            },
        ),
        OrderAdminError::InvalidStatus(e) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            ErrorBody::new("invalid_status", e.to_string()),
        ),
        OrderAdminError::IllegalTransition { .. } => (
            StatusCode::CONFLICT,
            ErrorBody::new("illegal_transition", err.to_string()),
        ),
        OrderAdminError::StatusConflict { order_id } => (
            StatusCode::CONFLICT,
            ErrorBody {
                order_id: Some(*order_id),
                ..ErrorBody::new("status_conflict", "Order was updated by someone else, reload and retry")
            },
        ),
        OrderAdminError::UnknownProduct { product_id } => (
            StatusCode::NOT_FOUND,
            ErrorBody {
                product_id: Some(*product_id),
                ..ErrorBody::new("unknown_product", "Product not found")
            },
        ),
        OrderAdminError::EmptyProductUpdate => (
            StatusCode::BAD_REQUEST,
            ErrorBody::new("bad_request", err.to_string()),
        ),
        OrderAdminError::Repository(e) => repository_parts(e),
    }
}

impl AppError {
    fn parts(&self) -> (StatusCode, ErrorBody) {
        match self {
            Self::Database(e) => repository_parts(e),
            Self::Cart(e) => cart_parts(e),
            Self::Checkout(e) => checkout_parts(e),
            Self::Orders(e) => orders_parts(e),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, ErrorBody::new("not_found", msg.clone())),
            Self::Unauthorized(msg) => (
                StatusCode::UNAUTHORIZED,
                ErrorBody::new("unauthorized", msg.clone()),
            ),
            Self::Forbidden(msg) => (StatusCode::FORBIDDEN, ErrorBody::new("forbidden", msg.clone())),
            Self::Unavailable(_) => (
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorBody::new("unavailable", "Service temporarily unavailable, please retry"),
            ),
            // Don't expose internal error details to clients
            Self::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorBody::new("internal", "Internal server error"),
            ),
        }
    }

    /// HTTP status this error maps to.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.parts().0
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = self.parts();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "Request rejected");
        }

        (status, Json(body)).into_response()
    }
}

/// Set the Sentry user context for a signed-in account.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(account_id: &impl ToString, name: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(account_id.to_string()),
            username: name.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added to cart", Some(&[("product_id", "12")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
