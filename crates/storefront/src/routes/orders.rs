//! Customer order history handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use tracing::instrument;

use grocer_core::OrderId;

use crate::error::AppError;
use crate::middleware::RequireAccount;
use crate::models::OrderRecord;
use crate::state::AppState;

/// The signed-in account's orders, most recent first.
#[instrument(skip(state, account), fields(account_id = %account.id))]
pub async fn index(
    State(state): State<AppState>,
    RequireAccount(account): RequireAccount,
) -> Result<Json<Vec<OrderRecord>>, AppError> {
    let orders = state.history().list(&account).await?;
    Ok(Json(orders))
}

/// One of the signed-in account's orders.
#[instrument(skip(state, account), fields(account_id = %account.0.id))]
pub async fn show(
    State(state): State<AppState>,
    account: RequireAccount,
    Path(id): Path<OrderId>,
) -> Result<Json<OrderRecord>, AppError> {
    let order = state.history().get(&account.0, id).await?;
    Ok(Json(order))
}
