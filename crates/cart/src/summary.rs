//! Derived cart totals.

use rust_decimal::Decimal;
use serde::Serialize;
use till_core::TaxRate;

use crate::line::CartLine;

/// Aggregate values computed from the current lines. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CartSummary {
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
    /// Sum of quantities across all lines.
    pub item_count: u64,
    /// Number of distinct lines.
    pub unique_item_count: usize,
}

impl CartSummary {
    /// Compute the summary of `lines` under `tax_rate`.
    #[must_use]
    pub fn from_lines(lines: &[CartLine], tax_rate: TaxRate) -> Self {
        let subtotal: Decimal = lines.iter().map(CartLine::line_total).sum();
        let item_count = lines.iter().map(|line| u64::from(line.quantity)).sum();
        let tax = tax_rate.apply(subtotal);

        Self {
            subtotal,
            tax,
            total: subtotal + tax,
            item_count,
            unique_item_count: lines.len(),
        }
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.unique_item_count == 0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use till_core::{Price, Product};

    use super::*;

    fn line(id: &str, price: u64, quantity: u32) -> CartLine {
        CartLine::new(Product::new(id, id, Price::from_whole(price), 100), quantity)
    }

    #[test]
    fn test_empty_summary_is_zero() {
        let summary = CartSummary::from_lines(&[], TaxRate::ZERO);
        assert_eq!(summary, CartSummary::default());
        assert!(summary.is_empty());
    }

    #[test]
    fn test_totals_without_tax() {
        let lines = [line("p1", 10_000, 2), line("p2", 2_500, 3)];
        let summary = CartSummary::from_lines(&lines, TaxRate::ZERO);

        assert_eq!(summary.subtotal, Decimal::from(27_500));
        assert_eq!(summary.tax, Decimal::ZERO);
        assert_eq!(summary.total, Decimal::from(27_500));
        assert_eq!(summary.item_count, 5);
        assert_eq!(summary.unique_item_count, 2);
    }

    #[test]
    fn test_totals_with_tax() {
        let rate: TaxRate = "0.11".parse().unwrap();
        let summary = CartSummary::from_lines(&[line("p1", 10_000, 2)], rate);

        assert_eq!(summary.subtotal, Decimal::from(20_000));
        assert_eq!(summary.tax, Decimal::from(2_200));
        assert_eq!(summary.total, Decimal::from(22_200));
    }
}
