//! Seed the catalog from a YAML file.
//!
//! The whole file is parsed and validated before the database is touched.
//! Products are upserted by ID, so re-running a seed refreshes names,
//! prices and stock in place.

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;
use tracing::{error, info};

use grocer_core::{Category, Money, Product, ProductId};
use grocer_storefront::db::{self, InventoryLedger, PgInventoryLedger};

use super::database_url;

/// Top-level catalog file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CatalogFile {
    pub products: Vec<CatalogEntry>,
}

/// One product in the catalog file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CatalogEntry {
    pub id: i32,
    pub name: String,
    pub category: Category,
    pub price: Money,
    pub unit: String,
    #[serde(default)]
    pub glyph: String,
    pub stock: u32,
    #[serde(default = "default_active")]
    pub active: bool,
}

const fn default_active() -> bool {
    true
}

impl From<&CatalogEntry> for Product {
    fn from(entry: &CatalogEntry) -> Self {
        Self {
            id: ProductId::new(entry.id),
            name: entry.name.trim().to_string(),
            category: entry.category,
            unit_price: entry.price,
            unit: entry.unit.trim().to_string(),
            glyph: entry.glyph.clone(),
            stock: entry.stock,
            is_active: entry.active,
        }
    }
}

/// Check a parsed catalog, returning one message per problem.
#[must_use]
pub fn validate_catalog(catalog: &CatalogFile) -> Vec<String> {
    let mut errors = Vec::new();
    let mut seen = HashSet::new();

    if catalog.products.is_empty() {
        errors.push("catalog contains no products".to_string());
    }

    for entry in &catalog.products {
        if entry.id <= 0 {
            errors.push(format!("product id {} must be positive", entry.id));
        }
        if !seen.insert(entry.id) {
            errors.push(format!("product id {} appears more than once", entry.id));
        }
        if entry.name.trim().is_empty() {
            errors.push(format!("product {} has an empty name", entry.id));
        }
        if entry.unit.trim().is_empty() {
            errors.push(format!("product {} has an empty unit", entry.id));
        }
        if i32::try_from(entry.stock).is_err() {
            errors.push(format!("product {} stock {} is too large", entry.id, entry.stock));
        }
    }

    errors
}

/// Upsert every product in `file_path`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, fails validation,
/// or a database operation fails.
pub async fn catalog(file_path: &Path, dry_run: bool) -> Result<(), Box<dyn std::error::Error>> {
    if !file_path.exists() {
        return Err(format!("File not found: {}", file_path.display()).into());
    }

    info!(path = %file_path.display(), "Loading catalog from file");

    let content = tokio::fs::read_to_string(file_path).await?;
    let catalog: CatalogFile = serde_yaml::from_str(&content)?;

    info!(products = catalog.products.len(), "Parsed catalog");

    let errors = validate_catalog(&catalog);
    if !errors.is_empty() {
        error!("Catalog validation failed:");
        for err in &errors {
            error!("  - {err}");
        }
        return Err(format!("{} validation errors found", errors.len()).into());
    }

    info!("Catalog validated successfully");
    if dry_run {
        return Ok(());
    }

    let pool = db::create_pool(&database_url()?).await?;
    info!("Connected to database");

    let ledger = PgInventoryLedger::new(pool);
    for entry in &catalog.products {
        ledger.upsert(&Product::from(entry)).await?;
    }

    info!("Seeding complete!");
    info!("  Products upserted: {}", catalog.products.len());
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
products:
  - id: 1
    name: Bananas
    category: fruits
    price: "40.00"
    unit: 1 dozen
    glyph: "🍌"
    stock: 50
  - id: 2
    name: Paneer
    category: dairy
    price: "90.00"
    unit: 200 g
    stock: 8
    active: false
"#;

    #[test]
    fn test_parse_sample() {
        let catalog: CatalogFile = serde_yaml::from_str(SAMPLE).unwrap();
        assert_eq!(catalog.products.len(), 2);
        assert!(catalog.products[0].active);
        assert!(!catalog.products[1].active);
        assert!(validate_catalog(&catalog).is_empty());

        let paneer = Product::from(&catalog.products[1]);
        assert_eq!(paneer.category, Category::Dairy);
        assert_eq!(paneer.unit_price, Money::from_minor(9_000));
        assert_eq!(paneer.glyph, "");
    }

    #[test]
    fn test_negative_price_rejected_at_parse() {
        let yaml = SAMPLE.replace("\"40.00\"", "\"-1.00\"");
        assert!(serde_yaml::from_str::<CatalogFile>(&yaml).is_err());
    }

    #[test]
    fn test_unknown_category_rejected_at_parse() {
        let yaml = SAMPLE.replace("category: fruits", "category: toys");
        assert!(serde_yaml::from_str::<CatalogFile>(&yaml).is_err());
    }

    #[test]
    fn test_validation_reports_every_problem() {
        let yaml = SAMPLE
            .replace("id: 2", "id: 1")
            .replace("name: Paneer", "name: \"  \"");
        let catalog: CatalogFile = serde_yaml::from_str(&yaml).unwrap();

        let errors = validate_catalog(&catalog);
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().any(|e| e.contains("more than once")));
        assert!(errors.iter().any(|e| e.contains("empty name")));
    }

    #[test]
    fn test_empty_catalog_is_invalid() {
        let catalog = CatalogFile {
            products: Vec::new(),
        };
        assert_eq!(validate_catalog(&catalog).len(), 1);
    }
}
