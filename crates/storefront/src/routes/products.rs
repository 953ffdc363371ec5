//! Catalog route handlers.

use axum::{Json, extract::State};
use tracing::instrument;

use grocer_core::Product;

use crate::error::AppError;
use crate::state::AppState;

/// List the products shoppers can buy.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<Product>>, AppError> {
    let products = state
        .stores()
        .inventory
        .list()
        .await?
        .into_iter()
        .filter(|p| p.is_active)
        .collect();

    Ok(Json(products))
}
