//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::{OrdersConfig, StorefrontConfig};
use crate::db::{
    CartStorage, InventoryLedger, OrderRepository, PgCartStorage, PgInventoryLedger,
    PgOrderRepository,
};
use crate::services::{CheckoutCoordinator, OrderAdminConsole, OrderHistory, OrderListing};

/// The stores backing the storefront.
#[derive(Clone)]
pub struct Stores {
    pub carts: Arc<dyn CartStorage>,
    pub orders: Arc<dyn OrderRepository>,
    pub inventory: Arc<dyn InventoryLedger>,
}

impl Stores {
    /// `PostgreSQL` stores sharing one pool.
    #[must_use]
    pub fn postgres(pool: &PgPool) -> Self {
        Self {
            carts: Arc::new(PgCartStorage::new(pool.clone())),
            orders: Arc::new(PgOrderRepository::new(pool.clone())),
            inventory: Arc::new(PgInventoryLedger::new(pool.clone())),
        }
    }
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// the stores and services.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    stores: Stores,
    checkout: CheckoutCoordinator,
    admin: OrderAdminConsole,
    history: OrderHistory,
}

impl AppState {
    /// Create the application state from configuration and stores.
    #[must_use]
    pub fn new(config: &StorefrontConfig, stores: Stores) -> Self {
        Self::with_orders_config(&config.orders, stores)
    }

    /// Create the application state without a full storefront configuration.
    #[must_use]
    pub fn with_orders_config(config: &OrdersConfig, stores: Stores) -> Self {
        let listing = OrderListing::new(config.listing_cache_ttl);
        let checkout = CheckoutCoordinator::new(
            Arc::clone(&stores.orders),
            Arc::clone(&stores.inventory),
            listing.clone(),
            config.idempotency_ttl,
        );
        let admin = OrderAdminConsole::new(
            Arc::clone(&stores.orders),
            Arc::clone(&stores.inventory),
            listing,
            config.low_stock_threshold,
        );
        let history = OrderHistory::new(Arc::clone(&stores.orders));

        Self {
            inner: Arc::new(AppStateInner {
                stores,
                checkout,
                admin,
                history,
            }),
        }
    }

    /// Get a reference to the stores.
    #[must_use]
    pub fn stores(&self) -> &Stores {
        &self.inner.stores
    }

    #[must_use]
    pub fn checkout(&self) -> &CheckoutCoordinator {
        &self.inner.checkout
    }

    #[must_use]
    pub fn admin(&self) -> &OrderAdminConsole {
        &self.inner.admin
    }

    #[must_use]
    pub fn history(&self) -> &OrderHistory {
        &self.inner.history
    }
}
