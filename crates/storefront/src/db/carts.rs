//! Persisted carts.
//!
//! Carts are stored as a JSON array of lines under the key `cart_<account id>`,
//! one row per account. Loading goes through `Cart`'s deserializer, which
//! normalizes whatever was stored.

use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::types::Json;

use grocer_core::{AccountId, Cart};

use super::RepositoryError;

/// Storage key for an account's cart.
#[must_use]
pub fn storage_key(account: AccountId) -> String {
    format!("cart_{account}")
}

/// Durable per-account cart storage.
#[async_trait]
pub trait CartStorage: Send + Sync {
    /// Load the persisted cart for `account`, if one was ever saved.
    async fn load(&self, account: AccountId) -> Result<Option<Cart>, RepositoryError>;

    /// Replace the persisted cart for `account`.
    async fn save(&self, account: AccountId, cart: &Cart) -> Result<(), RepositoryError>;
}

/// `PostgreSQL`-backed cart storage.
#[derive(Clone)]
pub struct PgCartStorage {
    pool: PgPool,
}

impl PgCartStorage {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CartStorage for PgCartStorage {
    async fn load(&self, account: AccountId) -> Result<Option<Cart>, RepositoryError> {
        let row: Option<(Json<Cart>,)> = sqlx::query_as(
            r"
            SELECT lines
            FROM carts
            WHERE key = $1
            ",
        )
        .bind(storage_key(account))
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(Json(cart),)| cart))
    }

    async fn save(&self, account: AccountId, cart: &Cart) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO carts (key, lines, updated_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (key) DO UPDATE
            SET lines = EXCLUDED.lines, updated_at = NOW()
            ",
        )
        .bind(storage_key(account))
        .bind(Json(cart))
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
