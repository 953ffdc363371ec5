//! Checkout route handler.

use axum::{Json, extract::State, http::StatusCode};
use tracing::instrument;

use crate::error::{AppError, add_breadcrumb};
use crate::middleware::RequireAccount;
use crate::models::CheckoutReceipt;
use crate::services::{CartStore, CheckoutRequest};
use crate::state::AppState;

/// Turn the signed-in account's cart into an order.
///
/// Responds `201 Created` with the confirmation receipt. A failed checkout
/// leaves the cart untouched.
#[instrument(skip(state, account, request), fields(account_id = %account.id))]
pub async fn place_order(
    State(state): State<AppState>,
    RequireAccount(account): RequireAccount,
    Json(request): Json<CheckoutRequest>,
) -> Result<(StatusCode, Json<CheckoutReceipt>), AppError> {
    let mut cart = CartStore::open(state.stores().carts.clone(), account.id).await;
    add_breadcrumb(
        "checkout",
        "Checkout started",
        Some(&[("payment_method", request.payment.method().as_str())]),
    );
    let receipt = state
        .checkout()
        .checkout(&account, &mut cart, request)
        .await?;

    Ok((StatusCode::CREATED, Json(receipt)))
}
