//! Per-account cart state.
//!
//! A [`CartStore`] holds the cart of exactly one signed-in account. Every
//! mutation is applied to a copy, written to [`CartStorage`], and only then
//! committed, so a failed write never leaves the in-memory cart ahead of the
//! persisted one.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, instrument, warn};

use grocer_core::{AccountId, Cart, Money, Product, ProductId};

use crate::db::{CartStorage, RepositoryError};

/// Errors from cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// No account is signed in.
    #[error("no account is signed in")]
    SignedOut,

    /// The cart could not be persisted. The in-memory cart is unchanged.
    #[error("cart storage error: {0}")]
    Storage(#[from] RepositoryError),
}

/// The authoritative cart for the signed-in account.
pub struct CartStore {
    storage: Arc<dyn CartStorage>,
    account: Option<AccountId>,
    cart: Cart,
}

impl CartStore {
    /// Open the store for `account`, restoring its persisted cart.
    ///
    /// A cart that cannot be read is replaced by an empty one.
    pub async fn open(storage: Arc<dyn CartStorage>, account: AccountId) -> Self {
        let cart = rehydrate(storage.as_ref(), account).await;
        Self {
            storage,
            account: Some(account),
            cart,
        }
    }

    /// The signed-in account, or `None` after [`sign_out`](Self::sign_out).
    #[must_use]
    pub const fn account(&self) -> Option<AccountId> {
        self.account
    }

    #[must_use]
    pub const fn cart(&self) -> &Cart {
        &self.cart
    }

    #[must_use]
    pub fn total(&self) -> Money {
        self.cart.total()
    }

    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.cart.item_count()
    }

    /// Add one unit of `product`.
    ///
    /// # Errors
    ///
    /// Returns `CartError::SignedOut` without an account, or
    /// `CartError::Storage` if the new cart could not be persisted.
    pub async fn add(&mut self, product: &Product) -> Result<(), CartError> {
        self.mutate(|cart| cart.add(product)).await
    }

    /// Change a line's quantity by `delta`; zero or below removes the line.
    ///
    /// # Errors
    ///
    /// See [`add`](Self::add).
    pub async fn change_quantity(
        &mut self,
        product_id: ProductId,
        delta: i64,
    ) -> Result<(), CartError> {
        self.mutate(|cart| cart.change_quantity(product_id, delta))
            .await
    }

    /// Remove a product's line.
    ///
    /// # Errors
    ///
    /// See [`add`](Self::add).
    pub async fn remove(&mut self, product_id: ProductId) -> Result<(), CartError> {
        self.mutate(|cart| cart.remove(product_id)).await
    }

    /// Empty the cart.
    ///
    /// # Errors
    ///
    /// See [`add`](Self::add).
    pub async fn clear(&mut self) -> Result<(), CartError> {
        self.mutate(Cart::clear).await
    }

    /// Empty the cart after its order has been placed.
    ///
    /// The order already exists at this point, so a failed write is logged
    /// and the in-memory cart is cleared regardless.
    pub async fn clear_after_checkout(&mut self) {
        let Some(account) = self.account else {
            self.cart.clear();
            return;
        };

        if let Err(e) = self.storage.save(account, &Cart::new()).await {
            tracing::error!(
                account_id = %account,
                error = %e,
                "Failed to clear persisted cart after checkout"
            );
        }
        self.cart.clear();
    }

    /// Replace the in-memory cart with `account`'s persisted cart.
    ///
    /// The previous account's cart is never carried over.
    #[instrument(skip(self), fields(account_id = %account))]
    pub async fn switch_account(&mut self, account: AccountId) {
        self.cart = rehydrate(self.storage.as_ref(), account).await;
        self.account = Some(account);
    }

    /// Forget the signed-in account and discard the in-memory cart.
    ///
    /// The persisted copy is left in place for the next sign-in.
    pub fn sign_out(&mut self) {
        self.account = None;
        self.cart = Cart::new();
    }

    async fn mutate(&mut self, apply: impl FnOnce(&mut Cart)) -> Result<(), CartError> {
        let account = self.account.ok_or(CartError::SignedOut)?;

        let mut next = self.cart.clone();
        apply(&mut next);
        if next == self.cart {
            return Ok(());
        }

        self.storage.save(account, &next).await?;
        self.cart = next;
        debug!(account_id = %account, items = self.cart.item_count(), "Cart updated");
        Ok(())
    }
}

async fn rehydrate(storage: &dyn CartStorage, account: AccountId) -> Cart {
    match storage.load(account).await {
        Ok(cart) => cart.unwrap_or_default(),
        Err(e) => {
            warn!(account_id = %account, error = %e, "Could not restore cart, starting empty");
            Cart::new()
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::MemoryCartStorage;
    use grocer_core::Category;

    fn product(id: i32) -> Product {
        Product {
            id: ProductId::new(id),
            name: format!("Product {id}"),
            category: Category::Fruits,
            unit_price: Money::from_minor(12_000),
            unit: "1 dozen".to_string(),
            glyph: "🍌".to_string(),
            stock: 30,
            is_active: true,
        }
    }

    #[tokio::test]
    async fn test_mutations_are_persisted() {
        let storage = Arc::new(MemoryCartStorage::new());
        let mut store = CartStore::open(storage.clone(), AccountId::new(1)).await;

        store.add(&product(1)).await.unwrap();
        store.add(&product(1)).await.unwrap();

        let persisted = storage.load(AccountId::new(1)).await.unwrap().unwrap();
        assert_eq!(&persisted, store.cart());
        assert_eq!(store.item_count(), 2);
    }

    #[tokio::test]
    async fn test_failed_write_leaves_cart_unchanged() {
        let storage = Arc::new(MemoryCartStorage::new());
        let mut store = CartStore::open(storage.clone(), AccountId::new(1)).await;
        store.add(&product(1)).await.unwrap();
        let before = store.cart().clone();

        storage.set_unavailable(true);
        let err = store.add(&product(2)).await.unwrap_err();

        assert!(matches!(err, CartError::Storage(_)));
        assert_eq!(store.cart(), &before);
    }

    #[tokio::test]
    async fn test_unreadable_cart_rehydrates_empty() {
        let storage = Arc::new(MemoryCartStorage::new());
        storage.put_raw("cart_1", "definitely not json").await;

        let store = CartStore::open(storage, AccountId::new(1)).await;
        assert!(store.cart().is_empty());
    }

    #[tokio::test]
    async fn test_unavailable_storage_rehydrates_empty() {
        let storage = Arc::new(MemoryCartStorage::new());
        storage.set_unavailable(true);

        let store = CartStore::open(storage, AccountId::new(1)).await;
        assert!(store.cart().is_empty());
        assert_eq!(store.account(), Some(AccountId::new(1)));
    }

    #[tokio::test]
    async fn test_switch_account_never_leaks_lines() {
        let storage = Arc::new(MemoryCartStorage::new());
        let mut store = CartStore::open(storage.clone(), AccountId::new(1)).await;
        store.add(&product(1)).await.unwrap();

        store.switch_account(AccountId::new(2)).await;
        assert!(store.cart().is_empty());
        store.add(&product(2)).await.unwrap();

        store.switch_account(AccountId::new(1)).await;
        assert_eq!(store.cart().lines().len(), 1);
        assert!(store.cart().line(ProductId::new(1)).is_some());
        assert!(store.cart().line(ProductId::new(2)).is_none());
    }

    #[tokio::test]
    async fn test_sign_out_keeps_persisted_copy() {
        let storage = Arc::new(MemoryCartStorage::new());
        let mut store = CartStore::open(storage.clone(), AccountId::new(1)).await;
        store.add(&product(1)).await.unwrap();

        store.sign_out();
        assert!(store.cart().is_empty());
        assert!(matches!(
            store.add(&product(1)).await,
            Err(CartError::SignedOut)
        ));

        let reopened = CartStore::open(storage, AccountId::new(1)).await;
        assert_eq!(reopened.item_count(), 1);
    }

    #[tokio::test]
    async fn test_noop_mutation_skips_write() {
        let storage = Arc::new(MemoryCartStorage::new());
        let mut store = CartStore::open(storage.clone(), AccountId::new(1)).await;

        storage.set_unavailable(true);
        store.remove(ProductId::new(42)).await.unwrap();
        store.change_quantity(ProductId::new(42), 3).await.unwrap();
    }

    #[tokio::test]
    async fn test_clear_after_checkout_survives_storage_failure() {
        let storage = Arc::new(MemoryCartStorage::new());
        let mut store = CartStore::open(storage.clone(), AccountId::new(1)).await;
        store.add(&product(1)).await.unwrap();

        storage.set_unavailable(true);
        store.clear_after_checkout().await;
        assert!(store.cart().is_empty());
    }
}
