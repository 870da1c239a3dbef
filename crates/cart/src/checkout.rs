//! Order drafts handed to the order-submission step.
//!
//! A draft freezes the cart's lines and totals at checkout time. The
//! submitting side is still responsible for re-checking stock against the
//! live catalog.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use till_core::{Price, ProductId, TaxRate};
use uuid::Uuid;

use crate::line::CartLine;
use crate::summary::CartSummary;

/// One priced line of an order draft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderItem {
    pub product_id: ProductId,
    pub name: String,
    pub unit_price: Price,
    pub quantity: u32,
    pub line_total: Decimal,
}

impl From<&CartLine> for OrderItem {
    fn from(line: &CartLine) -> Self {
        Self {
            product_id: line.product.id.clone(),
            name: line.product.name.clone(),
            unit_price: line.product.price,
            quantity: line.quantity,
            line_total: line.line_total(),
        }
    }
}

/// Snapshot of a cart ready for submission.
#[derive(Debug, Clone, Serialize)]
pub struct OrderDraft {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub items: Vec<OrderItem>,
    pub subtotal: Decimal,
    pub tax_rate: TaxRate,
    pub tax: Decimal,
    pub total: Decimal,
}

impl OrderDraft {
    /// Price `lines` under `tax_rate`.
    #[must_use]
    pub fn from_lines(lines: &[CartLine], tax_rate: TaxRate) -> Self {
        let summary = CartSummary::from_lines(lines, tax_rate);
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            items: lines.iter().map(OrderItem::from).collect(),
            subtotal: summary.subtotal,
            tax_rate,
            tax: summary.tax,
            total: summary.total,
        }
    }

    /// Total units across all items.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity)).sum()
    }
}
