//! In-memory stores.
//!
//! Used by tests and local demos. Each store can be switched into an
//! unavailable state with `set_unavailable(true)`, after which every call
//! fails with [`RepositoryError::Unavailable`].

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use grocer_core::{AccountId, Cart, Money, OrderId, OrderStatus, Product, ProductId};

use super::RepositoryError;
use super::carts::{CartStorage, storage_key};
use super::orders::OrderRepository;
use super::products::{InventoryLedger, ProductUpdate, price_column, stock_column};
use crate::models::{NewOrder, OrderRecord};

/// Shared failure switch.
#[derive(Debug, Default)]
struct Availability(AtomicBool);

impl Availability {
    fn set(&self, unavailable: bool) {
        self.0.store(unavailable, Ordering::SeqCst);
    }

    fn check(&self, store: &str) -> Result<(), RepositoryError> {
        if self.0.load(Ordering::SeqCst) {
            return Err(RepositoryError::Unavailable(format!("{store} is offline")));
        }
        Ok(())
    }
}

// =============================================================================
// Carts
// =============================================================================

/// Key-value cart storage holding serialized JSON, like a browser's local
/// storage.
#[derive(Debug, Default)]
pub struct MemoryCartStorage {
    entries: RwLock<HashMap<String, String>>,
    availability: Availability,
}

impl MemoryCartStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail (or succeed again).
    pub fn set_unavailable(&self, unavailable: bool) {
        self.availability.set(unavailable);
    }

    /// Store a raw value under `key`, bypassing serialization.
    pub async fn put_raw(&self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.write().await.insert(key.into(), value.into());
    }

    /// The raw stored value under `key`.
    pub async fn get_raw(&self, key: &str) -> Option<String> {
        self.entries.read().await.get(key).cloned()
    }
}

#[async_trait]
impl CartStorage for MemoryCartStorage {
    async fn load(&self, account: AccountId) -> Result<Option<Cart>, RepositoryError> {
        self.availability.check("cart storage")?;

        let entries = self.entries.read().await;
        entries
            .get(&storage_key(account))
            .map(|raw| {
                serde_json::from_str(raw).map_err(|e| {
                    RepositoryError::DataCorruption(format!("unreadable cart for {account}: {e}"))
                })
            })
            .transpose()
    }

    async fn save(&self, account: AccountId, cart: &Cart) -> Result<(), RepositoryError> {
        self.availability.check("cart storage")?;

        let raw = serde_json::to_string(cart)
            .map_err(|e| RepositoryError::DataCorruption(format!("unserializable cart: {e}")))?;
        self.entries.write().await.insert(storage_key(account), raw);
        Ok(())
    }
}

// =============================================================================
// Orders
// =============================================================================

/// In-memory order repository.
#[derive(Debug, Default)]
pub struct MemoryOrders {
    orders: RwLock<Vec<OrderRecord>>,
    availability: Availability,
}

impl MemoryOrders {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail (or succeed again).
    pub fn set_unavailable(&self, unavailable: bool) {
        self.availability.set(unavailable);
    }

    fn newest_first(mut orders: Vec<OrderRecord>) -> Vec<OrderRecord> {
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        orders
    }
}

#[async_trait]
impl OrderRepository for MemoryOrders {
    async fn create(&self, order: NewOrder) -> Result<OrderRecord, RepositoryError> {
        self.availability.check("order store")?;

        let mut orders = self.orders.write().await;
        if let Some(key) = order.idempotency_key
            && orders.iter().any(|o| o.idempotency_key == Some(key))
        {
            return Err(RepositoryError::Conflict(
                "order for this checkout attempt already exists".to_string(),
            ));
        }
        if orders.iter().any(|o| o.id == order.id) {
            return Err(RepositoryError::Conflict(format!(
                "order {} already exists",
                order.id
            )));
        }

        let record = order.into_record(Utc::now());
        // Newest first, so repeated inserts within one clock tick still list
        // in reverse insertion order.
        orders.insert(0, record.clone());
        Ok(record)
    }

    async fn get(&self, id: OrderId) -> Result<Option<OrderRecord>, RepositoryError> {
        self.availability.check("order store")?;
        Ok(self.orders.read().await.iter().find(|o| o.id == id).cloned())
    }

    async fn find_by_idempotency_key(
        &self,
        key: Uuid,
    ) -> Result<Option<OrderRecord>, RepositoryError> {
        self.availability.check("order store")?;
        Ok(self
            .orders
            .read()
            .await
            .iter()
            .find(|o| o.idempotency_key == Some(key))
            .cloned())
    }

    async fn list_all(&self) -> Result<Vec<OrderRecord>, RepositoryError> {
        self.availability.check("order store")?;
        Ok(Self::newest_first(self.orders.read().await.clone()))
    }

    async fn list_for_customer(
        &self,
        customer: AccountId,
    ) -> Result<Vec<OrderRecord>, RepositoryError> {
        self.availability.check("order store")?;
        let own = self
            .orders
            .read()
            .await
            .iter()
            .filter(|o| o.customer_id == customer)
            .cloned()
            .collect();
        Ok(Self::newest_first(own))
    }

    async fn update_status(
        &self,
        id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<Option<OrderRecord>, RepositoryError> {
        self.availability.check("order store")?;

        let mut orders = self.orders.write().await;
        let Some(order) = orders.iter_mut().find(|o| o.id == id && o.status == from) else {
            return Ok(None);
        };
        order.status = to;
        order.updated_at = Utc::now();
        Ok(Some(order.clone()))
    }

    async fn delivered_revenue(&self) -> Result<Money, RepositoryError> {
        self.availability.check("order store")?;
        Ok(self
            .orders
            .read()
            .await
            .iter()
            .filter(|o| o.status == OrderStatus::Delivered)
            .map(|o| o.total)
            .sum())
    }

    async fn count(&self) -> Result<u64, RepositoryError> {
        self.availability.check("order store")?;
        let len = self.orders.read().await.len();
        Ok(u64::try_from(len).unwrap_or(u64::MAX))
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        self.availability.check("order store")
    }
}

// =============================================================================
// Inventory
// =============================================================================

/// In-memory inventory ledger.
#[derive(Debug, Default)]
pub struct MemoryInventory {
    products: RwLock<BTreeMap<ProductId, Product>>,
    availability: Availability,
}

impl MemoryInventory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A ledger pre-filled with `products`.
    #[must_use]
    pub fn with_products(products: impl IntoIterator<Item = Product>) -> Self {
        let products = products.into_iter().map(|p| (p.id, p)).collect();
        Self {
            products: RwLock::new(products),
            availability: Availability::default(),
        }
    }

    /// Make every subsequent call fail (or succeed again).
    pub fn set_unavailable(&self, unavailable: bool) {
        self.availability.set(unavailable);
    }
}

#[async_trait]
impl InventoryLedger for MemoryInventory {
    async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        self.availability.check("inventory")?;
        Ok(self.products.read().await.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<Product>, RepositoryError> {
        self.availability.check("inventory")?;
        Ok(self.products.read().await.values().cloned().collect())
    }

    async fn update(
        &self,
        id: ProductId,
        update: ProductUpdate,
    ) -> Result<Option<Product>, RepositoryError> {
        self.availability.check("inventory")?;
        update.stock.map(stock_column).transpose()?;
        update.unit_price.map(price_column).transpose()?;

        let mut products = self.products.write().await;
        Ok(products.get_mut(&id).map(|product| {
            update.apply(product);
            product.clone()
        }))
    }

    async fn upsert(&self, product: &Product) -> Result<(), RepositoryError> {
        self.availability.check("inventory")?;
        stock_column(product.stock)?;
        price_column(product.unit_price)?;
        self.products
            .write()
            .await
            .insert(product.id, product.clone());
        Ok(())
    }
}
