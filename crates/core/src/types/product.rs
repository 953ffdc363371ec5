//! Catalog product as seen by the cart and checkout.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use super::id::ProductId;
use super::money::Money;

/// Catalog category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Fruits,
    Vegetables,
    Dairy,
    Flours,
    Pulses,
    Spices,
    Cooking,
    Snacks,
    Beverages,
    Personal,
    Bakery,
}

impl Category {
    /// Returns the wire/database representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Fruits => "fruits",
            Self::Vegetables => "vegetables",
            Self::Dairy => "dairy",
            Self::Flours => "flours",
            Self::Pulses => "pulses",
            Self::Spices => "spices",
            Self::Cooking => "cooking",
            Self::Snacks => "snacks",
            Self::Beverages => "beverages",
            Self::Personal => "personal",
            Self::Bakery => "bakery",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fruits" => Ok(Self::Fruits),
            "vegetables" => Ok(Self::Vegetables),
            "dairy" => Ok(Self::Dairy),
            "flours" => Ok(Self::Flours),
            "pulses" => Ok(Self::Pulses),
            "spices" => Ok(Self::Spices),
            "cooking" => Ok(Self::Cooking),
            "snacks" => Ok(Self::Snacks),
            "beverages" => Ok(Self::Beverages),
            "personal" => Ok(Self::Personal),
            "bakery" => Ok(Self::Bakery),
            _ => Err(format!("invalid category: {s}")),
        }
    }
}

/// A product supplied by the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub category: Category,
    pub unit_price: Money,
    /// Unit label, e.g. `1 kg` or `500 ml`.
    pub unit: String,
    /// Emoji shown next to the name.
    pub glyph: String,
    /// Units on hand.
    pub stock: u32,
    /// Inactive products are hidden from the storefront and cannot be bought.
    pub is_active: bool,
}

impl Product {
    /// Whether `quantity` units can currently be sold.
    #[must_use]
    pub const fn can_fulfil(&self, quantity: u32) -> bool {
        self.is_active && self.stock >= quantity
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn banana(stock: u32, is_active: bool) -> Product {
        Product {
            id: ProductId::new(1),
            name: "Banana".to_string(),
            category: Category::Fruits,
            unit_price: Money::from_minor(4_000),
            unit: "1 dozen".to_string(),
            glyph: "🍌".to_string(),
            stock,
            is_active,
        }
    }

    #[test]
    fn test_can_fulfil() {
        assert!(banana(5, true).can_fulfil(5));
        assert!(!banana(4, true).can_fulfil(5));
        assert!(!banana(50, false).can_fulfil(1));
    }

    #[test]
    fn test_category_roundtrip() {
        assert_eq!("pulses".parse::<Category>().unwrap(), Category::Pulses);
        assert_eq!(Category::Bakery.to_string(), "bakery");
        assert!("toys".parse::<Category>().is_err());
    }
}
