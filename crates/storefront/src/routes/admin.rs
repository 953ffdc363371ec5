//! Admin console handlers.
//!
//! [`RequireAdmin`] turns away non-admins before any handler runs; the
//! console re-checks the role on every operation.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use grocer_core::{Money, OrderId, Product, ProductId};

use crate::db::ProductUpdate;
use crate::error::AppError;
use crate::middleware::RequireAdmin;
use crate::models::OrderRecord;
use crate::services::DashboardStats;
use crate::state::AppState;

/// Status change request.
#[derive(Debug, Deserialize)]
pub struct StatusChange {
    pub status: String,
}

/// Product edit request. Absent fields are left alone.
#[derive(Debug, Deserialize)]
pub struct ProductEdit {
    pub stock: Option<u32>,
    pub price: Option<Money>,
}

impl From<ProductEdit> for ProductUpdate {
    fn from(edit: ProductEdit) -> Self {
        Self {
            stock: edit.stock,
            unit_price: edit.price,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RevenueView {
    pub delivered_revenue: Money,
}

/// Every order, most recent first.
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn orders(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
) -> Result<Json<Vec<OrderRecord>>, AppError> {
    let listing = state.admin().list_all(&admin).await?;
    Ok(Json(listing.as_ref().clone()))
}

/// Move an order to a new status.
#[instrument(skip(state, admin, body), fields(admin_id = %admin.id, order_id = %id))]
pub async fn set_status(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<OrderId>,
    Json(body): Json<StatusChange>,
) -> Result<Json<OrderRecord>, AppError> {
    let order = state.admin().set_status(&admin, id, &body.status).await?;
    Ok(Json(order))
}

/// Revenue from delivered orders.
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn revenue(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
) -> Result<Json<RevenueView>, AppError> {
    let delivered_revenue = state.admin().compute_delivered_revenue(&admin).await?;
    Ok(Json(RevenueView { delivered_revenue }))
}

#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn dashboard(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
) -> Result<Json<DashboardStats>, AppError> {
    Ok(Json(state.admin().dashboard(&admin).await?))
}

/// Edit a product's stock or price.
#[instrument(skip(state, admin, edit), fields(admin_id = %admin.id, product_id = %id))]
pub async fn update_product(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<ProductId>,
    Json(edit): Json<ProductEdit>,
) -> Result<Json<Product>, AppError> {
    let product = state
        .admin()
        .update_product(&admin, id, edit.into())
        .await?;
    Ok(Json(product))
}
