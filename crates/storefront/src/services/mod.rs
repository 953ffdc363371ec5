//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `cart` - Per-account cart state with write-through persistence
//! - `checkout` - Cart to order conversion, payment validation, idempotency
//! - `orders` - Admin console (listing, status transitions, revenue,
//!   dashboard, inventory edits) and customer order history

pub mod cart;
pub mod checkout;
pub mod orders;

pub use cart::{CartError, CartStore};
pub use checkout::{CheckoutCoordinator, CheckoutError, CheckoutRequest};
pub use orders::{
    DashboardStats, LowStockProduct, OrderAdminConsole, OrderAdminError, OrderHistory,
    OrderListing,
};
