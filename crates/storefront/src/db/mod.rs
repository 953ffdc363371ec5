//! Persistence for the storefront.
//!
//! # Database: `grocer`
//!
//! ## Tables
//!
//! - `products` - Catalog with stock counters (the inventory ledger)
//! - `carts` - Persisted carts keyed by `cart_<account id>`
//! - `orders` - Placed orders with line snapshots and status
//! - `tower_sessions.session` - Session storage
//!
//! Every store is a trait object so the services can run against either the
//! `PostgreSQL` implementations or the in-memory ones in [`memory`].
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p grocer-cli -- migrate
//! ```

pub mod carts;
pub mod memory;
pub mod orders;
pub mod products;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use carts::{CartStorage, PgCartStorage, storage_key};
pub use memory::{MemoryCartStorage, MemoryInventory, MemoryOrders};
pub use orders::{OrderRepository, PgOrderRepository};
pub use products::{InventoryLedger, PgInventoryLedger, ProductUpdate};

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., reused idempotency key).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// A value does not fit the column it is written to.
    #[error("invalid value: {0}")]
    InvalidValue(String),

    /// The backing store could not be reached.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl RepositoryError {
    /// Whether retrying the same operation later might succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Unavailable(_) => true,
            Self::Database(e) => is_transient_sqlx(e),
            _ => false,
        }
    }

    /// Whether the caller supplied a value the store cannot hold.
    #[must_use]
    pub fn is_invalid_value(&self) -> bool {
        match self {
            Self::InvalidValue(_) => true,
            Self::Database(sqlx::Error::Database(db_err)) => db_err
                .code()
                .is_some_and(|code| is_invalid_value_sqlstate(&code)),
            _ => false,
        }
    }
}

fn is_transient_sqlx(e: &sqlx::Error) -> bool {
    match e {
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::Protocol(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => true,
        sqlx::Error::Database(db_err) => db_err
            .code()
            .is_some_and(|code| is_transient_sqlstate(&code)),
        _ => false,
    }
}

/// Connection exceptions, serialization failures, deadlocks, resource
/// exhaustion and server shutdown.
fn is_transient_sqlstate(code: &str) -> bool {
    code.starts_with("08")
        || code.starts_with("53")
        || code.starts_with("57P")
        || code == "40001"
        || code == "40P01"
}

/// Data exceptions (overflow, bad input syntax) and CHECK violations.
fn is_invalid_value_sqlstate(code: &str) -> bool {
    code.starts_with("22") || code == "23514"
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Map a unique-constraint violation to [`RepositoryError::Conflict`].
pub(crate) fn conflict_on_unique(e: sqlx::Error, what: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(format!("{what} already exists"));
    }
    RepositoryError::Database(e)
}
