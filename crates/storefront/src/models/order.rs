//! Placed orders.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use grocer_core::{AccountId, CartLine, Money, OrderId, OrderStatus, PaymentMethod, Phone};

/// A durable order.
///
/// `items` and `total` are fixed at creation; only `status` and `updated_at`
/// ever change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub id: OrderId,
    pub customer_id: AccountId,
    pub customer_name: String,
    pub customer_phone: Phone,
    /// Snapshot of the cart lines at checkout.
    pub items: Vec<CartLine>,
    pub total: Money,
    pub payment_method: PaymentMethod,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Client token of the checkout attempt that created this order.
    #[serde(skip)]
    pub idempotency_key: Option<Uuid>,
}

impl OrderRecord {
    /// Customer-facing reference, e.g. `QM1A2B3C4D`.
    #[must_use]
    pub fn reference(&self) -> String {
        self.id.reference()
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items
            .iter()
            .fold(0_u32, |count, line| count.saturating_add(line.quantity()))
    }
}

/// Everything needed to create an order.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub id: OrderId,
    pub customer_id: AccountId,
    pub customer_name: String,
    pub customer_phone: Phone,
    pub items: Vec<CartLine>,
    pub total: Money,
    pub payment_method: PaymentMethod,
    pub idempotency_key: Option<Uuid>,
}

impl NewOrder {
    /// Materialize the record as stored, in `pending` status.
    #[must_use]
    pub fn into_record(self, now: DateTime<Utc>) -> OrderRecord {
        OrderRecord {
            id: self.id,
            customer_id: self.customer_id,
            customer_name: self.customer_name,
            customer_phone: self.customer_phone,
            items: self.items,
            total: self.total,
            payment_method: self.payment_method,
            status: OrderStatus::Pending,
            created_at: now,
            updated_at: now,
            idempotency_key: self.idempotency_key,
        }
    }
}

/// Number of lines shown in the checkout confirmation.
const RECEIPT_PREVIEW_LINES: usize = 3;

/// Delivery window promised on the confirmation.
pub const DELIVERY_ESTIMATE: &str = "10-15 minutes";

/// One line of the confirmation preview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReceiptLine {
    pub name: String,
    pub glyph: String,
    pub quantity: u32,
    pub line_total: Money,
}

/// Summary returned after a successful checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckoutReceipt {
    pub order_id: OrderId,
    pub reference: String,
    pub status: OrderStatus,
    pub total: Money,
    pub payment_method: PaymentMethod,
    pub payment_label: &'static str,
    pub item_count: u32,
    /// The first few lines of the order.
    pub items: Vec<ReceiptLine>,
    /// How many lines are not shown in `items`.
    pub more_items: usize,
    pub delivery_estimate: &'static str,
}

impl From<&OrderRecord> for CheckoutReceipt {
    fn from(order: &OrderRecord) -> Self {
        let items = order
            .items
            .iter()
            .take(RECEIPT_PREVIEW_LINES)
            .map(|line| ReceiptLine {
                name: line.name.clone(),
                glyph: line.glyph.clone(),
                quantity: line.quantity(),
                line_total: line.line_total(),
            })
            .collect();

        Self {
            order_id: order.id,
            reference: order.reference(),
            status: order.status,
            total: order.total,
            payment_method: order.payment_method,
            payment_label: order.payment_method.label(),
            item_count: order.item_count(),
            items,
            more_items: order.items.len().saturating_sub(RECEIPT_PREVIEW_LINES),
            delivery_estimate: DELIVERY_ESTIMATE,
        }
    }
}
