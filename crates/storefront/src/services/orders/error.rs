//! Order administration error types.

use thiserror::Error;

use grocer_core::{InvalidStatus, OrderId, OrderStatus, ProductId};

use crate::db::RepositoryError;

/// Errors from the admin console and customer order reads.
#[derive(Debug, Error)]
pub enum OrderAdminError {
    /// The actor's role does not allow this operation.
    #[error("admin role required")]
    Forbidden,

    /// No such order (or not visible to the actor).
    #[error("order {order_id} not found")]
    UnknownOrder { order_id: OrderId },

    /// The requested status is not one of the four order statuses.
    #[error(transparent)]
    InvalidStatus(#[from] InvalidStatus),

    /// The lifecycle does not allow this move.
    #[error("cannot move order from {from} to {to}")]
    IllegalTransition { from: OrderStatus, to: OrderStatus },

    /// Another admin changed the order's status first.
    #[error("order {order_id} was updated concurrently")]
    StatusConflict { order_id: OrderId },

    /// No such product.
    #[error("product {product_id} not found")]
    UnknownProduct { product_id: ProductId },

    /// A product edit with neither stock nor price.
    #[error("product update must set stock or price")]
    EmptyProductUpdate,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}
