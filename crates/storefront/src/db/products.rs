//! Catalog products and their stock counters.

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::PgPool;

use grocer_core::{Money, Product, ProductId};

use super::RepositoryError;

/// Admin edit to a product. `None` fields are left alone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProductUpdate {
    pub stock: Option<u32>,
    pub unit_price: Option<Money>,
}

impl ProductUpdate {
    /// Whether the update changes nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.stock.is_none() && self.unit_price.is_none()
    }

    /// Apply the edit to an in-memory product.
    pub const fn apply(&self, product: &mut Product) {
        if let Some(stock) = self.stock {
            product.stock = stock;
        }
        if let Some(price) = self.unit_price {
            product.unit_price = price;
        }
    }
}

/// Read/write access to the catalog's stock counters.
#[async_trait]
pub trait InventoryLedger: Send + Sync {
    /// Fetch one product, active or not.
    async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError>;

    /// Every product, ordered by ID.
    async fn list(&self) -> Result<Vec<Product>, RepositoryError>;

    /// Apply an admin edit. Returns `None` for an unknown product.
    async fn update(
        &self,
        id: ProductId,
        update: ProductUpdate,
    ) -> Result<Option<Product>, RepositoryError>;

    /// Insert or replace a product (catalog seeding).
    async fn upsert(&self, product: &Product) -> Result<(), RepositoryError>;
}

/// `PostgreSQL` inventory ledger.
#[derive(Clone)]
pub struct PgInventoryLedger {
    pool: PgPool,
}

impl PgInventoryLedger {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const PRODUCT_COLUMNS: &str = "id, name, category, unit_price, unit, glyph, stock, is_active";

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: i32,
    name: String,
    category: String,
    unit_price: Decimal,
    unit: String,
    glyph: String,
    stock: i32,
    is_active: bool,
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let category = row
            .category
            .parse()
            .map_err(RepositoryError::DataCorruption)?;
        let unit_price = Money::new(row.unit_price).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid price for product {}: {e}", row.id))
        })?;
        let stock = u32::try_from(row.stock).map_err(|_| {
            RepositoryError::DataCorruption(format!(
                "negative stock {} for product {}",
                row.stock, row.id
            ))
        })?;

        Ok(Self {
            id: ProductId::new(row.id),
            name: row.name,
            category,
            unit_price,
            unit: row.unit,
            glyph: row.glyph,
            stock,
            is_active: row.is_active,
        })
    }
}

/// Largest price the `NUMERIC(10, 2)` column holds, exclusive.
const PRICE_LIMIT: Decimal = Decimal::from_parts(100_000_000, 0, 0, false, 0);

/// Convert a stock count to the database column type.
pub(crate) fn stock_column(stock: u32) -> Result<i32, RepositoryError> {
    i32::try_from(stock).map_err(|_| {
        RepositoryError::InvalidValue(format!("stock {stock} exceeds the column range"))
    })
}

/// Convert a price to the database column type.
pub(crate) fn price_column(price: Money) -> Result<Decimal, RepositoryError> {
    let amount = price.amount();
    if amount >= PRICE_LIMIT {
        return Err(RepositoryError::InvalidValue(format!(
            "price {amount} exceeds the column range"
        )));
    }
    Ok(amount)
}

#[async_trait]
impl InventoryLedger for PgInventoryLedger {
    async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row: Option<ProductRow> =
            sqlx::query_as(&format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        row.map(Product::try_from).transpose()
    }

    async fn list(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows: Vec<ProductRow> =
            sqlx::query_as(&format!("SELECT {PRODUCT_COLUMNS} FROM products ORDER BY id"))
                .fetch_all(&self.pool)
                .await?;

        rows.into_iter().map(Product::try_from).collect()
    }

    async fn update(
        &self,
        id: ProductId,
        update: ProductUpdate,
    ) -> Result<Option<Product>, RepositoryError> {
        let stock = update.stock.map(stock_column).transpose()?;
        let unit_price = update.unit_price.map(price_column).transpose()?;

        let row: Option<ProductRow> = sqlx::query_as(&format!(
            r"
            UPDATE products
            SET stock = COALESCE($2, stock),
                unit_price = COALESCE($3, unit_price),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(id)
        .bind(stock)
        .bind(unit_price)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Product::try_from).transpose()
    }

    async fn upsert(&self, product: &Product) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO products (id, name, category, unit_price, unit, glyph, stock, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (id) DO UPDATE
            SET name = EXCLUDED.name,
                category = EXCLUDED.category,
                unit_price = EXCLUDED.unit_price,
                unit = EXCLUDED.unit,
                glyph = EXCLUDED.glyph,
                stock = EXCLUDED.stock,
                is_active = EXCLUDED.is_active,
                updated_at = NOW()
            ",
        )
        .bind(product.id)
        .bind(&product.name)
        .bind(product.category.as_str())
        .bind(price_column(product.unit_price)?)
        .bind(&product.unit)
        .bind(&product.glyph)
        .bind(stock_column(product.stock)?)
        .bind(product.is_active)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use grocer_core::Category;

    fn row(stock: i32, price: Decimal) -> ProductRow {
        ProductRow {
            id: 3,
            name: "Toor Dal".to_string(),
            category: "pulses".to_string(),
            unit_price: price,
            unit: "1 kg".to_string(),
            glyph: "🫘".to_string(),
            stock,
            is_active: true,
        }
    }

    #[test]
    fn test_row_conversion() {
        let product = Product::try_from(row(40, Decimal::new(14_500, 2))).unwrap();
        assert_eq!(product.category, Category::Pulses);
        assert_eq!(product.stock, 40);
        assert_eq!(product.unit_price, Money::from_minor(14_500));
    }

    #[test]
    fn test_row_with_negative_stock_is_corrupt() {
        let err = Product::try_from(row(-1, Decimal::ONE)).unwrap_err();
        assert!(matches!(err, RepositoryError::DataCorruption(_)));
    }

    #[test]
    fn test_row_with_unknown_category_is_corrupt() {
        let mut bad = row(1, Decimal::ONE);
        bad.category = "hardware".to_string();
        assert!(matches!(
            Product::try_from(bad),
            Err(RepositoryError::DataCorruption(_))
        ));
    }

    #[test]
    fn test_update_apply_only_touches_given_fields() {
        let mut product = Product::try_from(row(40, Decimal::ONE)).unwrap();
        ProductUpdate {
            stock: Some(5),
            unit_price: None,
        }
        .apply(&mut product);
        assert_eq!(product.stock, 5);
        assert_eq!(product.unit_price.amount(), Decimal::ONE);

        assert!(ProductUpdate::default().is_empty());
    }

    #[test]
    fn test_out_of_range_values_are_invalid() {
        assert_eq!(stock_column(40).unwrap(), 40);
        assert!(matches!(
            stock_column(u32::MAX),
            Err(RepositoryError::InvalidValue(_))
        ));

        let largest = Money::new(Decimal::new(9_999_999_999, 2)).unwrap();
        assert_eq!(price_column(largest).unwrap(), largest.amount());
        let too_large = Money::new(Decimal::new(100_000_000, 0)).unwrap();
        assert!(matches!(
            price_column(too_large),
            Err(RepositoryError::InvalidValue(_))
        ));
    }
}
