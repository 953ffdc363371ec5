//! Checkout error types.

use thiserror::Error;

use grocer_core::{OrderId, PaymentDetailsError, ProductId};

use crate::db::RepositoryError;
use crate::services::cart::CartError;

/// Reasons a checkout did not produce an order.
///
/// In every case the cart is left as it was and no order exists.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The cart has no lines.
    #[error("cart is empty")]
    EmptyCart,

    /// The selected payment method is missing a required detail.
    #[error("invalid payment details: {0}")]
    InvalidPaymentDetails(#[from] PaymentDetailsError),

    /// A line cannot be fulfilled from current stock.
    #[error("product {product_id} is not available in the requested quantity")]
    StockUnavailable { product_id: ProductId },

    /// This checkout attempt already produced an order.
    #[error("checkout already submitted as order {order_id}")]
    DuplicateSubmission { order_id: OrderId },

    /// The cart does not belong to the account checking out.
    #[error("cart does not belong to the signed-in account")]
    Unauthorized,

    /// Cart store failure.
    #[error(transparent)]
    Cart(#[from] CartError),

    /// Order store or inventory failure.
    #[error("checkout storage error: {0}")]
    Repository(#[from] RepositoryError),
}
