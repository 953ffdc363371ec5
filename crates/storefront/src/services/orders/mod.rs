//! Order administration and customer order history.
//!
//! Only admins may list every order, move orders through their lifecycle,
//! view revenue and edit inventory. Customers can read their own orders and
//! nothing else.

mod error;

pub use error::OrderAdminError;

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use grocer_core::{Money, OrderId, OrderStatus, Product, ProductId};

use crate::db::{InventoryLedger, OrderRepository, ProductUpdate, RepositoryError};
use crate::models::{CurrentAccount, OrderRecord};

// =============================================================================
// Cached Listing
// =============================================================================

/// Cached copy of the full order listing.
///
/// Shared between checkout (which invalidates it when an order is placed) and
/// the admin console (which patches it once a status write has succeeded).
///
/// Every change bumps a generation counter under the same lock that guards
/// cache writes. A load only stores its result if no change happened while
/// it was reading, so a slow load never puts a stale listing back.
#[derive(Clone)]
pub struct OrderListing {
    cache: Cache<(), Arc<Vec<OrderRecord>>>,
    generation: Arc<Mutex<u64>>,
}

impl OrderListing {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        let cache = Cache::builder().max_capacity(1).time_to_live(ttl).build();
        Self {
            cache,
            generation: Arc::new(Mutex::new(0)),
        }
    }

    /// The listing, loading it from `orders` on a miss.
    ///
    /// # Errors
    ///
    /// Returns the repository error if the listing had to be loaded and the
    /// load failed.
    pub async fn get_or_load(
        &self,
        orders: &dyn OrderRepository,
    ) -> Result<Arc<Vec<OrderRecord>>, RepositoryError> {
        if let Some(listing) = self.cache.get(&()).await {
            debug!("Cache hit for order listing");
            return Ok(listing);
        }

        let seen = self.generation().await;
        let listing = Arc::new(orders.list_all().await?);
        self.store_if_current(seen, Arc::clone(&listing)).await;
        Ok(listing)
    }

    /// Current generation, to be handed back to [`Self::store_if_current`].
    async fn generation(&self) -> u64 {
        *self.generation.lock().await
    }

    /// Cache `listing` unless the listing changed since `seen` was read.
    ///
    /// Returns whether the listing was stored.
    async fn store_if_current(&self, seen: u64, listing: Arc<Vec<OrderRecord>>) -> bool {
        let generation = self.generation.lock().await;
        if *generation != seen {
            debug!("Order listing changed during load, not caching");
            return false;
        }
        self.cache.insert((), listing).await;
        true
    }

    /// Swap in an updated order, if the listing is cached.
    pub async fn replace(&self, updated: &OrderRecord) {
        let mut generation = self.generation.lock().await;
        *generation += 1;

        let Some(current) = self.cache.get(&()).await else {
            return;
        };

        let mut next = current.as_ref().clone();
        if let Some(slot) = next.iter_mut().find(|order| order.id == updated.id) {
            *slot = updated.clone();
            self.cache.insert((), Arc::new(next)).await;
        } else {
            self.cache.invalidate(&()).await;
        }
    }

    /// Drop the cached listing.
    pub async fn invalidate(&self) {
        let mut generation = self.generation.lock().await;
        *generation += 1;
        self.cache.invalidate(&()).await;
    }
}

// =============================================================================
// Admin Console
// =============================================================================

/// A product whose stock is under the low-stock threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LowStockProduct {
    pub id: ProductId,
    pub name: String,
    pub glyph: String,
    pub stock: u32,
}

/// Headline numbers for the admin dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    pub total_orders: u64,
    pub delivered_revenue: Money,
    pub product_count: usize,
    pub low_stock_threshold: u32,
    pub low_stock: Vec<LowStockProduct>,
}

/// Administrative view over every order and the inventory.
#[derive(Clone)]
pub struct OrderAdminConsole {
    orders: Arc<dyn OrderRepository>,
    inventory: Arc<dyn InventoryLedger>,
    listing: OrderListing,
    low_stock_threshold: u32,
}

impl OrderAdminConsole {
    #[must_use]
    pub fn new(
        orders: Arc<dyn OrderRepository>,
        inventory: Arc<dyn InventoryLedger>,
        listing: OrderListing,
        low_stock_threshold: u32,
    ) -> Self {
        Self {
            orders,
            inventory,
            listing,
            low_stock_threshold,
        }
    }

    /// Every order, most recent first.
    ///
    /// # Errors
    ///
    /// Returns `OrderAdminError::Forbidden` for non-admins.
    pub async fn list_all(
        &self,
        actor: &CurrentAccount,
    ) -> Result<Arc<Vec<OrderRecord>>, OrderAdminError> {
        require_admin(actor)?;
        Ok(self.listing.get_or_load(self.orders.as_ref()).await?)
    }

    /// Move an order to `new_status`.
    ///
    /// Requesting the order's current status is accepted and changes
    /// nothing. The cached listing is only touched once the write has
    /// succeeded.
    ///
    /// # Errors
    ///
    /// - `OrderAdminError::Forbidden` for non-admins
    /// - `OrderAdminError::InvalidStatus` if `new_status` is not a status
    /// - `OrderAdminError::UnknownOrder` if the order does not exist
    /// - `OrderAdminError::IllegalTransition` if the lifecycle forbids the move
    /// - `OrderAdminError::StatusConflict` if the status changed underneath us
    #[instrument(skip(self, actor), fields(admin_id = %actor.id))]
    pub async fn set_status(
        &self,
        actor: &CurrentAccount,
        order_id: OrderId,
        new_status: &str,
    ) -> Result<OrderRecord, OrderAdminError> {
        require_admin(actor)?;
        let to: OrderStatus = new_status.parse()?;

        let current = self
            .orders
            .get(order_id)
            .await?
            .ok_or(OrderAdminError::UnknownOrder { order_id })?;

        let from = current.status;
        if from == to {
            debug!(status = %to, "Status unchanged");
            return Ok(current);
        }
        if !from.can_transition_to(to) {
            return Err(OrderAdminError::IllegalTransition { from, to });
        }

        let Some(updated) = self.orders.update_status(order_id, from, to).await? else {
            warn!(%from, %to, "Order status changed concurrently");
            return Err(OrderAdminError::StatusConflict { order_id });
        };

        self.listing.replace(&updated).await;
        info!(%from, %to, "Order status updated");
        Ok(updated)
    }

    /// Sum of totals over delivered orders, computed on demand.
    ///
    /// # Errors
    ///
    /// Returns `OrderAdminError::Forbidden` for non-admins.
    pub async fn compute_delivered_revenue(
        &self,
        actor: &CurrentAccount,
    ) -> Result<Money, OrderAdminError> {
        require_admin(actor)?;
        Ok(self.orders.delivered_revenue().await?)
    }

    /// Dashboard numbers: order count, revenue, catalog size, low stock.
    ///
    /// # Errors
    ///
    /// Returns `OrderAdminError::Forbidden` for non-admins.
    pub async fn dashboard(&self, actor: &CurrentAccount) -> Result<DashboardStats, OrderAdminError> {
        require_admin(actor)?;

        let total_orders = self.orders.count().await?;
        let delivered_revenue = self.orders.delivered_revenue().await?;
        let products = self.inventory.list().await?;

        let low_stock = products
            .iter()
            .filter(|product| product.stock < self.low_stock_threshold)
            .map(|product| LowStockProduct {
                id: product.id,
                name: product.name.clone(),
                glyph: product.glyph.clone(),
                stock: product.stock,
            })
            .collect();

        Ok(DashboardStats {
            total_orders,
            delivered_revenue,
            product_count: products.len(),
            low_stock_threshold: self.low_stock_threshold,
            low_stock,
        })
    }

    /// Set a product's stock and/or price.
    ///
    /// # Errors
    ///
    /// - `OrderAdminError::Forbidden` for non-admins
    /// - `OrderAdminError::EmptyProductUpdate` if nothing would change
    /// - `OrderAdminError::UnknownProduct` if the product does not exist
    #[instrument(skip(self, actor), fields(admin_id = %actor.id))]
    pub async fn update_product(
        &self,
        actor: &CurrentAccount,
        product_id: ProductId,
        update: ProductUpdate,
    ) -> Result<Product, OrderAdminError> {
        require_admin(actor)?;
        if update.is_empty() {
            return Err(OrderAdminError::EmptyProductUpdate);
        }

        let product = self
            .inventory
            .update(product_id, update)
            .await?
            .ok_or(OrderAdminError::UnknownProduct { product_id })?;

        info!(stock = product.stock, price = %product.unit_price, "Product updated");
        Ok(product)
    }
}

fn require_admin(actor: &CurrentAccount) -> Result<(), OrderAdminError> {
    if actor.is_admin() {
        Ok(())
    } else {
        Err(OrderAdminError::Forbidden)
    }
}

// =============================================================================
// Customer History
// =============================================================================

/// Read-only access to a customer's own orders.
#[derive(Clone)]
pub struct OrderHistory {
    orders: Arc<dyn OrderRepository>,
}

impl OrderHistory {
    #[must_use]
    pub fn new(orders: Arc<dyn OrderRepository>) -> Self {
        Self { orders }
    }

    /// The actor's orders, most recent first.
    ///
    /// # Errors
    ///
    /// Returns `OrderAdminError::Repository` if the store fails.
    pub async fn list(&self, actor: &CurrentAccount) -> Result<Vec<OrderRecord>, OrderAdminError> {
        Ok(self.orders.list_for_customer(actor.id).await?)
    }

    /// One order, if it belongs to the actor. Admins may read any order.
    ///
    /// # Errors
    ///
    /// Returns `OrderAdminError::UnknownOrder` for missing orders and for
    /// other customers' orders alike.
    pub async fn get(
        &self,
        actor: &CurrentAccount,
        order_id: OrderId,
    ) -> Result<OrderRecord, OrderAdminError> {
        self.orders
            .get(order_id)
            .await?
            .filter(|order| order.customer_id == actor.id || actor.is_admin())
            .ok_or(OrderAdminError::UnknownOrder { order_id })
    }
}
