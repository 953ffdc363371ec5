//! Order repository.
//!
//! Orders are inserted once and afterwards only their status moves. Status
//! updates are compare-and-set on the current status so that two admins
//! acting on the same order cannot silently overwrite each other.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use sqlx::types::Json;
use uuid::Uuid;

use grocer_core::{AccountId, CartLine, Money, OrderId, OrderStatus, Phone};

use super::{RepositoryError, conflict_on_unique};
use crate::models::{NewOrder, OrderRecord};

/// Durable order storage.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Insert a new order in `pending` status.
    ///
    /// Returns [`RepositoryError::Conflict`] if the idempotency key has been
    /// used before.
    async fn create(&self, order: NewOrder) -> Result<OrderRecord, RepositoryError>;

    /// Fetch one order.
    async fn get(&self, id: OrderId) -> Result<Option<OrderRecord>, RepositoryError>;

    /// Fetch the order created by the checkout attempt carrying `key`.
    async fn find_by_idempotency_key(
        &self,
        key: Uuid,
    ) -> Result<Option<OrderRecord>, RepositoryError>;

    /// Every order, most recent first.
    async fn list_all(&self) -> Result<Vec<OrderRecord>, RepositoryError>;

    /// One customer's orders, most recent first.
    async fn list_for_customer(
        &self,
        customer: AccountId,
    ) -> Result<Vec<OrderRecord>, RepositoryError>;

    /// Move an order from `from` to `to`.
    ///
    /// Returns `None` when the order's current status is no longer `from`.
    async fn update_status(
        &self,
        id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<Option<OrderRecord>, RepositoryError>;

    /// Sum of totals over `delivered` orders.
    async fn delivered_revenue(&self) -> Result<Money, RepositoryError>;

    /// Number of orders placed.
    async fn count(&self) -> Result<u64, RepositoryError>;

    /// Check that the store is reachable.
    async fn ping(&self) -> Result<(), RepositoryError>;
}

/// `PostgreSQL` order repository.
#[derive(Clone)]
pub struct PgOrderRepository {
    pool: PgPool,
}

impl PgOrderRepository {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Columns selected for every order query.
const ORDER_COLUMNS: &str = "id, customer_id, customer_name, customer_phone, items, total, \
                             payment_method, status, created_at, updated_at, idempotency_key";

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    customer_id: i32,
    customer_name: String,
    customer_phone: String,
    items: Json<Vec<CartLine>>,
    total: Decimal,
    payment_method: String,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    idempotency_key: Option<Uuid>,
}

impl TryFrom<OrderRow> for OrderRecord {
    type Error = RepositoryError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let customer_phone = Phone::parse(&row.customer_phone).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid phone in database: {e}"))
        })?;
        let total = Money::new(row.total).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid order total in database: {e}"))
        })?;
        let payment_method = row
            .payment_method
            .parse()
            .map_err(RepositoryError::DataCorruption)?;
        let status = row.status.parse::<OrderStatus>().map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid status in database: {e}"))
        })?;

        Ok(Self {
            id: OrderId::from_uuid(row.id),
            customer_id: AccountId::new(row.customer_id),
            customer_name: row.customer_name,
            customer_phone,
            items: row.items.0,
            total,
            payment_method,
            status,
            created_at: row.created_at,
            updated_at: row.updated_at,
            idempotency_key: row.idempotency_key,
        })
    }
}

fn into_records(rows: Vec<OrderRow>) -> Result<Vec<OrderRecord>, RepositoryError> {
    rows.into_iter().map(OrderRecord::try_from).collect()
}

#[async_trait]
impl OrderRepository for PgOrderRepository {
    async fn create(&self, order: NewOrder) -> Result<OrderRecord, RepositoryError> {
        let row: OrderRow = sqlx::query_as(&format!(
            r"
            INSERT INTO orders (id, customer_id, customer_name, customer_phone, items,
                                total, payment_method, status, idempotency_key)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {ORDER_COLUMNS}
            "
        ))
        .bind(order.id.as_uuid())
        .bind(order.customer_id)
        .bind(&order.customer_name)
        .bind(order.customer_phone.as_str())
        .bind(Json(&order.items))
        .bind(order.total.amount())
        .bind(order.payment_method.as_str())
        .bind(OrderStatus::Pending.as_str())
        .bind(order.idempotency_key)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "order for this checkout attempt"))?;

        row.try_into()
    }

    async fn get(&self, id: OrderId) -> Result<Option<OrderRecord>, RepositoryError> {
        let row: Option<OrderRow> =
            sqlx::query_as(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"))
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await?;

        row.map(OrderRecord::try_from).transpose()
    }

    async fn find_by_idempotency_key(
        &self,
        key: Uuid,
    ) -> Result<Option<OrderRecord>, RepositoryError> {
        let row: Option<OrderRow> = sqlx::query_as(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE idempotency_key = $1"
        ))
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        row.map(OrderRecord::try_from).transpose()
    }

    async fn list_all(&self) -> Result<Vec<OrderRecord>, RepositoryError> {
        let rows: Vec<OrderRow> = sqlx::query_as(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_at DESC, id"
        ))
        .fetch_all(&self.pool)
        .await?;

        into_records(rows)
    }

    async fn list_for_customer(
        &self,
        customer: AccountId,
    ) -> Result<Vec<OrderRecord>, RepositoryError> {
        let rows: Vec<OrderRow> = sqlx::query_as(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE customer_id = $1 ORDER BY created_at DESC, id"
        ))
        .bind(customer)
        .fetch_all(&self.pool)
        .await?;

        into_records(rows)
    }

    async fn update_status(
        &self,
        id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<Option<OrderRecord>, RepositoryError> {
        let row: Option<OrderRow> = sqlx::query_as(&format!(
            r"
            UPDATE orders
            SET status = $3, updated_at = NOW()
            WHERE id = $1 AND status = $2
            RETURNING {ORDER_COLUMNS}
            "
        ))
        .bind(id.as_uuid())
        .bind(from.as_str())
        .bind(to.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(OrderRecord::try_from).transpose()
    }

    async fn delivered_revenue(&self) -> Result<Money, RepositoryError> {
        let (sum,): (Decimal,) =
            sqlx::query_as("SELECT COALESCE(SUM(total), 0) FROM orders WHERE status = $1")
                .bind(OrderStatus::Delivered.as_str())
                .fetch_one(&self.pool)
                .await?;

        Money::new(sum).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid revenue in database: {e}"))
        })
    }

    async fn count(&self) -> Result<u64, RepositoryError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM orders")
            .fetch_one(&self.pool)
            .await?;

        u64::try_from(count)
            .map_err(|_| RepositoryError::DataCorruption(format!("negative order count {count}")))
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
