//! Checkout: turning a cart into an order.
//!
//! A checkout either creates exactly one order and empties the cart, or
//! fails and leaves both the cart and the inventory untouched.
//!
//! # Idempotency
//!
//! Clients may tag a submission with a UUID token. Tokens are remembered for
//! a configurable window in a `moka` cache so a double-clicked "Place order"
//! is answered without touching the database; the order store also keeps a
//! unique index on the token, which catches concurrent duplicates and any
//! that arrive after the cache entry has expired.

mod error;

pub use error::CheckoutError;

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use serde::Deserialize;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use grocer_core::{OrderId, PaymentSelection};

use crate::db::{InventoryLedger, OrderRepository, RepositoryError};
use crate::models::{CheckoutReceipt, CurrentAccount, NewOrder};
use crate::services::cart::{CartError, CartStore};
use crate::services::orders::OrderListing;

/// Upper bound on remembered tokens.
const MAX_REMEMBERED_TOKENS: u64 = 100_000;

/// A checkout submission.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutRequest {
    pub payment: PaymentSelection,
    /// Client-generated token identifying this attempt.
    #[serde(default)]
    pub idempotency_key: Option<Uuid>,
}

/// Converts carts into orders.
#[derive(Clone)]
pub struct CheckoutCoordinator {
    orders: Arc<dyn OrderRepository>,
    inventory: Arc<dyn InventoryLedger>,
    listing: OrderListing,
    recent_tokens: Cache<Uuid, OrderId>,
}

impl CheckoutCoordinator {
    /// Create a coordinator remembering idempotency tokens for `token_ttl`.
    #[must_use]
    pub fn new(
        orders: Arc<dyn OrderRepository>,
        inventory: Arc<dyn InventoryLedger>,
        listing: OrderListing,
        token_ttl: Duration,
    ) -> Self {
        let recent_tokens = Cache::builder()
            .max_capacity(MAX_REMEMBERED_TOKENS)
            .time_to_live(token_ttl)
            .build();

        Self {
            orders,
            inventory,
            listing,
            recent_tokens,
        }
    }

    /// Place an order for everything in `cart`.
    ///
    /// On success the cart is emptied and a summary of the new order is
    /// returned.
    ///
    /// # Errors
    ///
    /// - `CheckoutError::DuplicateSubmission` if the token was already used,
    ///   whatever the cart now holds
    /// - `CheckoutError::EmptyCart` if there is nothing to order
    /// - `CheckoutError::InvalidPaymentDetails` naming the first missing field
    /// - `CheckoutError::StockUnavailable` for a missing, inactive or
    ///   under-stocked product
    /// - `CheckoutError::Repository` if the order could not be stored
    #[instrument(
        skip(self, account, cart, request),
        fields(account_id = %account.id, order_id = tracing::field::Empty)
    )]
    pub async fn checkout(
        &self,
        account: &CurrentAccount,
        cart: &mut CartStore,
        request: CheckoutRequest,
    ) -> Result<CheckoutReceipt, CheckoutError> {
        match cart.account() {
            None => return Err(CartError::SignedOut.into()),
            Some(owner) if owner != account.id => return Err(CheckoutError::Unauthorized),
            Some(_) => {}
        }

        // Before the cart: a resubmitted checkout finds its cart emptied.
        if let Some(key) = request.idempotency_key
            && let Some(order_id) = self.order_for_token(key).await?
        {
            warn!(%order_id, "Duplicate checkout submission");
            return Err(CheckoutError::DuplicateSubmission { order_id });
        }

        let snapshot = cart.cart().clone();
        if snapshot.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let payment_method = request.payment.validate()?;

        for line in snapshot.lines() {
            let available = self
                .inventory
                .get(line.product_id)
                .await?
                .is_some_and(|product| product.can_fulfil(line.quantity()));
            if !available {
                return Err(CheckoutError::StockUnavailable {
                    product_id: line.product_id,
                });
            }
        }

        let new_order = NewOrder {
            id: OrderId::generate(),
            customer_id: account.id,
            customer_name: account.name.clone(),
            customer_phone: account.phone.clone(),
            total: snapshot.total(),
            items: snapshot.lines().to_vec(),
            payment_method,
            idempotency_key: request.idempotency_key,
        };

        let order = match self.orders.create(new_order).await {
            Ok(order) => order,
            Err(RepositoryError::Conflict(reason)) => {
                return Err(self.resolve_conflict(request.idempotency_key, reason).await);
            }
            Err(e) => return Err(e.into()),
        };

        tracing::Span::current().record("order_id", tracing::field::display(order.id));

        if let Some(key) = order.idempotency_key {
            self.recent_tokens.insert(key, order.id).await;
        }
        self.listing.invalidate().await;
        cart.clear_after_checkout().await;

        info!(
            reference = %order.reference(),
            total = %order.total,
            payment_method = %order.payment_method,
            "Order placed"
        );

        Ok(CheckoutReceipt::from(&order))
    }

    /// The order already placed with `key`, if any.
    ///
    /// Checks the token cache, then the order store for tokens that have
    /// expired from the cache or were used before a restart.
    async fn order_for_token(&self, key: Uuid) -> Result<Option<OrderId>, RepositoryError> {
        if let Some(order_id) = self.recent_tokens.get(&key).await {
            return Ok(Some(order_id));
        }

        let Some(existing) = self.orders.find_by_idempotency_key(key).await? else {
            return Ok(None);
        };
        self.recent_tokens.insert(key, existing.id).await;
        Ok(Some(existing.id))
    }

    /// Map an insert conflict to the order that already owns the token.
    async fn resolve_conflict(&self, key: Option<Uuid>, reason: String) -> CheckoutError {
        let Some(key) = key else {
            return RepositoryError::Conflict(reason).into();
        };

        match self.orders.find_by_idempotency_key(key).await {
            Ok(Some(existing)) => {
                self.recent_tokens.insert(key, existing.id).await;
                warn!(order_id = %existing.id, "Duplicate checkout submission");
                CheckoutError::DuplicateSubmission {
                    order_id: existing.id,
                }
            }
            Ok(None) => RepositoryError::Conflict(reason).into(),
            Err(e) => e.into(),
        }
    }
}
