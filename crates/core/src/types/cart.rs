//! Shopping cart state.
//!
//! A [`Cart`] is an ordered list of [`CartLine`]s with two invariants:
//!
//! - at most one line per product
//! - every line has a quantity of at least 1
//!
//! All mutation goes through `Cart` methods, and deserialization normalizes
//! its input, so neither invariant can be broken from outside this module.

use serde::{Deserialize, Serialize};

use super::id::ProductId;
use super::money::Money;
use super::product::Product;

/// One product in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: ProductId,
    pub name: String,
    pub unit_price: Money,
    pub unit: String,
    pub glyph: String,
    quantity: u32,
}

impl CartLine {
    /// Start a line for `product` with a quantity of one.
    #[must_use]
    pub fn for_product(product: &Product) -> Self {
        Self {
            product_id: product.id,
            name: product.name.clone(),
            unit_price: product.unit_price,
            unit: product.unit.clone(),
            glyph: product.glyph.clone(),
            quantity: 1,
        }
    }

    /// Number of units, always at least 1.
    #[must_use]
    pub const fn quantity(&self) -> u32 {
        self.quantity
    }

    /// `unit_price × quantity`.
    #[must_use]
    pub fn line_total(&self) -> Money {
        self.unit_price.times(self.quantity)
    }
}

/// The signed-in account's in-progress selection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<CartLine>", into = "Vec<CartLine>")]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    /// An empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { lines: Vec::new() }
    }

    /// The lines, in the order they were first added.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// The line for `product_id`, if any.
    #[must_use]
    pub fn line(&self, product_id: ProductId) -> Option<&CartLine> {
        self.lines.iter().find(|line| line.product_id == product_id)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Add one unit of `product`.
    ///
    /// Increments the existing line or appends a new one. Stock is not
    /// consulted here; availability is checked at checkout.
    pub fn add(&mut self, product: &Product) {
        if let Some(line) = self.line_mut(product.id) {
            line.quantity = line.quantity.saturating_add(1);
        } else {
            self.lines.push(CartLine::for_product(product));
        }
    }

    /// Adjust a line's quantity by `delta`.
    ///
    /// A result of zero or less removes the line. Unknown products are
    /// ignored.
    pub fn change_quantity(&mut self, product_id: ProductId, delta: i64) {
        let Some(index) = self.position(product_id) else {
            return;
        };
        let Some(line) = self.lines.get_mut(index) else {
            return;
        };

        let next = i64::from(line.quantity).saturating_add(delta);
        if next <= 0 {
            self.lines.remove(index);
        } else {
            line.quantity = u32::try_from(next).unwrap_or(u32::MAX);
        }
    }

    /// Remove the line for `product_id`, if present.
    pub fn remove(&mut self, product_id: ProductId) {
        self.lines.retain(|line| line.product_id != product_id);
    }

    /// Remove every line.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Sum of every line total.
    #[must_use]
    pub fn total(&self) -> Money {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    /// Sum of every line quantity.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.lines
            .iter()
            .fold(0_u32, |count, line| count.saturating_add(line.quantity))
    }

    fn position(&self, product_id: ProductId) -> Option<usize> {
        self.lines
            .iter()
            .position(|line| line.product_id == product_id)
    }

    fn line_mut(&mut self, product_id: ProductId) -> Option<&mut CartLine> {
        self.lines
            .iter_mut()
            .find(|line| line.product_id == product_id)
    }
}

impl From<Vec<CartLine>> for Cart {
    /// Build a cart from raw lines, merging duplicate products and dropping
    /// zero-quantity lines.
    fn from(raw: Vec<CartLine>) -> Self {
        let mut cart = Self::new();
        for line in raw {
            if line.quantity == 0 {
                continue;
            }
            if let Some(existing) = cart.line_mut(line.product_id) {
                existing.quantity = existing.quantity.saturating_add(line.quantity);
            } else {
                cart.lines.push(line);
            }
        }
        cart
    }
}

impl From<Cart> for Vec<CartLine> {
    fn from(cart: Cart) -> Self {
        cart.lines
    }
}
