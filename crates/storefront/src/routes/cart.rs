//! Cart route handlers.
//!
//! Every request opens the signed-in account's [`CartStore`] from storage and
//! returns the cart as it stands after the change.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use grocer_core::{Cart, Money, Product, ProductId};

use crate::error::{AppError, add_breadcrumb};
use crate::middleware::RequireAccount;
use crate::services::CartStore;
use crate::state::AppState;

// =============================================================================
// Request Types
// =============================================================================

/// Body naming a single product.
#[derive(Debug, Deserialize)]
pub struct ProductRef {
    pub product_id: ProductId,
}

/// Quantity change request.
#[derive(Debug, Deserialize)]
pub struct UpdateQuantity {
    pub product_id: ProductId,
    pub delta: i64,
}

// =============================================================================
// View Types
// =============================================================================

/// One cart line as shown to the shopper.
#[derive(Debug, Clone, Serialize)]
pub struct CartItemView {
    pub product_id: ProductId,
    pub name: String,
    pub glyph: String,
    pub unit: String,
    pub unit_price: Money,
    pub quantity: u32,
    pub line_total: Money,
}

/// The cart with its derived totals.
#[derive(Debug, Clone, Serialize)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub item_count: u32,
    pub total: Money,
}

impl From<&Cart> for CartView {
    fn from(cart: &Cart) -> Self {
        let items = cart
            .lines()
            .iter()
            .map(|line| CartItemView {
                product_id: line.product_id,
                name: line.name.clone(),
                glyph: line.glyph.clone(),
                unit: line.unit.clone(),
                unit_price: line.unit_price,
                quantity: line.quantity(),
                line_total: line.line_total(),
            })
            .collect();

        Self {
            items,
            item_count: cart.item_count(),
            total: cart.total(),
        }
    }
}

// =============================================================================
// Handlers
// =============================================================================

async fn open_cart(state: &AppState, account: &RequireAccount) -> CartStore {
    CartStore::open(state.stores().carts.clone(), account.0.id).await
}

/// Show the current cart.
#[instrument(skip(state, account), fields(account_id = %account.0.id))]
pub async fn show(State(state): State<AppState>, account: RequireAccount) -> Json<CartView> {
    let store = open_cart(&state, &account).await;
    Json(CartView::from(store.cart()))
}

/// Add one unit of a product.
#[instrument(skip(state, account, body), fields(account_id = %account.0.id, product_id = %body.product_id))]
pub async fn add(
    State(state): State<AppState>,
    account: RequireAccount,
    Json(body): Json<ProductRef>,
) -> Result<Json<CartView>, AppError> {
    let product = purchasable_product(&state, body.product_id).await?;

    let mut store = open_cart(&state, &account).await;
    store.add(&product).await?;
    let product_id = product.id.to_string();
    add_breadcrumb("cart", "Added to cart", Some(&[("product_id", product_id.as_str())]));

    Ok(Json(CartView::from(store.cart())))
}

/// Change a line's quantity; a result of zero or less removes the line.
#[instrument(skip(state, account, body), fields(account_id = %account.0.id, product_id = %body.product_id))]
pub async fn update(
    State(state): State<AppState>,
    account: RequireAccount,
    Json(body): Json<UpdateQuantity>,
) -> Result<Json<CartView>, AppError> {
    let mut store = open_cart(&state, &account).await;
    store.change_quantity(body.product_id, body.delta).await?;

    Ok(Json(CartView::from(store.cart())))
}

/// Remove a product's line.
#[instrument(skip(state, account, body), fields(account_id = %account.0.id, product_id = %body.product_id))]
pub async fn remove(
    State(state): State<AppState>,
    account: RequireAccount,
    Json(body): Json<ProductRef>,
) -> Result<Json<CartView>, AppError> {
    let mut store = open_cart(&state, &account).await;
    store.remove(body.product_id).await?;

    Ok(Json(CartView::from(store.cart())))
}

/// Empty the cart.
#[instrument(skip(state, account), fields(account_id = %account.0.id))]
pub async fn clear(
    State(state): State<AppState>,
    account: RequireAccount,
) -> Result<Json<CartView>, AppError> {
    let mut store = open_cart(&state, &account).await;
    store.clear().await?;

    Ok(Json(CartView::from(store.cart())))
}

/// Look up a product that is listed in the storefront.
///
/// Inactive products are reported as missing.
async fn purchasable_product(state: &AppState, id: ProductId) -> Result<Product, AppError> {
    state
        .stores()
        .inventory
        .get(id)
        .await?
        .filter(|p| p.is_active)
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))
}
