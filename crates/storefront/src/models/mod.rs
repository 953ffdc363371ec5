//! Domain models for the storefront.
//!
//! Catalog and cart types live in `grocer-core`; the types here only exist
//! on the server side.

pub mod order;
pub mod session;

pub use order::{CheckoutReceipt, DELIVERY_ESTIMATE, NewOrder, OrderRecord, ReceiptLine};
pub use session::{CurrentAccount, keys as session_keys};
