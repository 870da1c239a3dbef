//! The cart engine.
//!
//! Owns the active cart's lines and enforces its invariants:
//!
//! - every line has a quantity of at least 1
//! - at most one line per product
//! - a line's quantity never exceeds the product's stock as known when the
//!   quantity was last changed
//!
//! [`CartEngine::refresh_snapshots`] may swap in a snapshot with less stock
//! than the line holds. Such lines are kept, persisted and reported as
//! [`StockConflict`]s until the quantity is fixed.
//!
//! Rejected operations leave the lines untouched and report through the
//! notification sink as well as the returned [`CartError`]. Every accepted
//! mutation is written through [`CartStorage`] before the call returns.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use till_core::{Product, ProductId, TaxRate};
use tracing::{debug, info, instrument, warn};

use crate::catalog::ProductCatalog;
use crate::checkout::OrderDraft;
use crate::error::{CartError, Result};
use crate::line::CartLine;
use crate::notify::{Notifier, NotifyKind};
use crate::storage::CartStorage;
use crate::summary::CartSummary;

/// Lines plus their derived summary at one point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartSnapshot {
    pub lines: Vec<CartLine>,
    pub summary: CartSummary,
}

/// Why a line no longer fits its refreshed product snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictReason {
    Unavailable,
    OutOfStock,
    InsufficientStock { available: u32 },
}

/// A line that exceeds what the catalog can now supply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StockConflict {
    pub product_id: ProductId,
    pub name: String,
    pub quantity: u32,
    pub reason: ConflictReason,
}

impl fmt::Display for StockConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.reason {
            ConflictReason::Unavailable => write!(f, "{} is no longer available", self.name),
            ConflictReason::OutOfStock => write!(f, "{} is now out of stock", self.name),
            ConflictReason::InsufficientStock { available } => write!(
                f,
                "{} has {} in cart but only {available} in stock",
                self.name, self.quantity
            ),
        }
    }
}

/// Single source of truth for one session's cart.
pub struct CartEngine {
    lines: Vec<CartLine>,
    storage: CartStorage,
    notifier: Arc<dyn Notifier>,
    tax_rate: TaxRate,
}

impl fmt::Debug for CartEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CartEngine")
            .field("lines", &self.lines)
            .field("storage", &self.storage)
            .field("tax_rate", &self.tax_rate)
            .finish_non_exhaustive()
    }
}

impl CartEngine {
    /// Create an engine rehydrated from `storage`.
    #[must_use]
    pub fn load(storage: CartStorage, notifier: Arc<dyn Notifier>, tax_rate: TaxRate) -> Self {
        let lines = storage.load();
        let conflicts = lines.iter().filter_map(conflict_for).count();
        if conflicts > 0 {
            warn!(conflicts, "Rehydrated cart has lines over known stock");
        }
        debug!(lines = lines.len(), "Cart engine rehydrated");
        Self {
            lines,
            storage,
            notifier,
            tax_rate,
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// The line for `product_id`, if present.
    #[must_use]
    pub fn line(&self, product_id: &ProductId) -> Option<&CartLine> {
        self.lines.iter().find(|line| line.product_id() == product_id)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    #[must_use]
    pub const fn tax_rate(&self) -> TaxRate {
        self.tax_rate
    }

    /// Totals for the current lines.
    #[must_use]
    pub fn summary(&self) -> CartSummary {
        CartSummary::from_lines(&self.lines, self.tax_rate)
    }

    #[must_use]
    pub fn snapshot(&self) -> CartSnapshot {
        CartSnapshot {
            lines: self.lines.clone(),
            summary: self.summary(),
        }
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Add one unit of `product`.
    ///
    /// # Errors
    ///
    /// See [`CartEngine::add_item`].
    pub fn add_one(&mut self, product: &Product) -> Result<()> {
        self.add_item(product, 1)
    }

    /// Add `quantity` units of `product`, merging into an existing line.
    ///
    /// Checks run in order: quantity, active flag, stock, then the combined
    /// quantity against stock. An existing line's snapshot is replaced with
    /// `product`.
    ///
    /// # Errors
    ///
    /// - [`CartError::InvalidQuantity`] if `quantity` is 0
    /// - [`CartError::ProductUnavailable`] if the product is inactive
    /// - [`CartError::OutOfStock`] if the product has no stock
    /// - [`CartError::InsufficientStock`] if the line would exceed stock
    #[instrument(skip(self, product), fields(product_id = %product.id))]
    pub fn add_item(&mut self, product: &Product, quantity: u32) -> Result<()> {
        let position = self.position(&product.id);
        let in_cart = position
            .and_then(|i| self.lines.get(i))
            .map_or(0, |line| line.quantity);

        check_add(product, in_cart, quantity).map_err(|e| self.reject(e))?;

        let new_quantity = in_cart + quantity;
        match position.and_then(|i| self.lines.get_mut(i)) {
            Some(line) => {
                line.product = product.clone();
                line.quantity = new_quantity;
            }
            None => self.lines.push(CartLine::new(product.clone(), quantity)),
        }

        self.persist();
        info!(quantity, new_quantity, "Added to cart");
        self.notifier.notify(
            NotifyKind::Success,
            &format!("Added {quantity} × {} to cart", product.name),
        );
        Ok(())
    }

    /// Set the quantity of an existing line.
    ///
    /// The check uses the stock recorded on the line's snapshot.
    ///
    /// # Errors
    ///
    /// - [`CartError::InvalidQuantity`] if `quantity` is 0
    /// - [`CartError::ProductNotInCart`] if there is no line for `product_id`
    /// - [`CartError::InsufficientStock`] if `quantity` exceeds known stock
    #[instrument(skip(self, product_id), fields(product_id = %product_id))]
    pub fn update_item_quantity(&mut self, product_id: &ProductId, quantity: u32) -> Result<()> {
        if quantity == 0 {
            return Err(self.reject(CartError::InvalidQuantity));
        }

        let Some(line) = self.line(product_id) else {
            return Err(self.reject(CartError::ProductNotInCart(product_id.clone())));
        };
        let stock = line.product.stock_quantity;
        let name = line.product.name.clone();
        if quantity > stock {
            return Err(self.reject(CartError::InsufficientStock {
                name,
                available: stock,
            }));
        }

        if let Some(line) = self
            .lines
            .iter_mut()
            .find(|line| line.product_id() == product_id)
        {
            line.quantity = quantity;
        }

        self.persist();
        info!(quantity, "Updated cart quantity");
        self.notifier.notify(
            NotifyKind::Success,
            &format!("Updated {name} quantity to {quantity}"),
        );
        Ok(())
    }

    /// Remove the line for `product_id`.
    ///
    /// Removing a product that is not in the cart leaves the lines alone but
    /// still persists and notifies. Returns whether a line was removed.
    #[instrument(skip(self, product_id), fields(product_id = %product_id))]
    pub fn remove_item(&mut self, product_id: &ProductId) -> bool {
        let removed = self
            .position(product_id)
            .map(|position| self.lines.remove(position));

        self.persist();
        match &removed {
            Some(line) => {
                info!("Removed from cart");
                self.notifier.notify(
                    NotifyKind::Info,
                    &format!("Removed {} from cart", line.product.name),
                );
            }
            None => {
                debug!("Product not in cart, nothing to remove");
                self.notifier.notify(
                    NotifyKind::Info,
                    &format!("Product {product_id} is not in the cart"),
                );
            }
        }
        removed.is_some()
    }

    /// Empty the cart.
    #[instrument(skip(self))]
    pub fn clear_cart(&mut self) {
        self.lines.clear();
        self.persist();
        info!("Cart cleared");
        self.notifier.notify(NotifyKind::Info, "Cart cleared");
    }

    /// Replace line snapshots with fresher ones from `catalog`.
    ///
    /// Quantities are left alone; lines that no longer fit their refreshed
    /// snapshot are returned as conflicts and reported as errors so the
    /// cashier can fix them before checkout. Products the catalog does not
    /// know keep their old snapshot.
    #[instrument(skip(self, catalog))]
    pub fn refresh_snapshots<C>(&mut self, catalog: &C) -> Vec<StockConflict>
    where
        C: ProductCatalog + ?Sized,
    {
        let mut refreshed = 0_usize;
        for line in &mut self.lines {
            if let Some(fresh) = catalog.product(line.product_id()) {
                line.product = fresh;
                refreshed += 1;
            }
        }

        let conflicts: Vec<StockConflict> = self.lines.iter().filter_map(conflict_for).collect();

        if refreshed > 0 {
            self.persist();
        }
        info!(refreshed, conflicts = conflicts.len(), "Refreshed cart snapshots");
        for conflict in &conflicts {
            warn!(product_id = %conflict.product_id, reason = ?conflict.reason, "Cart line conflicts with stock");
            self.notifier
                .notify(NotifyKind::Error, &conflict.to_string());
        }
        conflicts
    }

    /// Freeze the cart into an order draft.
    ///
    /// The cart itself is not cleared.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::EmptyCart`] if there are no lines.
    pub fn order_draft(&self) -> Result<OrderDraft> {
        if self.lines.is_empty() {
            return Err(self.reject(CartError::EmptyCart));
        }
        let draft = OrderDraft::from_lines(&self.lines, self.tax_rate);
        info!(order_id = %draft.id, total = %draft.total, "Built order draft");
        Ok(draft)
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn position(&self, product_id: &ProductId) -> Option<usize> {
        self.lines
            .iter()
            .position(|line| line.product_id() == product_id)
    }

    fn persist(&self) {
        self.storage.save(&self.lines);
    }

    /// Report a rejection and hand the error back for returning.
    fn reject(&self, err: CartError) -> CartError {
        debug!(error = %err, "Cart operation rejected");
        self.notifier.notify(NotifyKind::Error, &err.to_string());
        err
    }
}

fn check_add(product: &Product, in_cart: u32, quantity: u32) -> Result<()> {
    if quantity == 0 {
        return Err(CartError::InvalidQuantity);
    }
    if !product.is_active {
        return Err(CartError::ProductUnavailable {
            name: product.name.clone(),
        });
    }
    if product.stock_quantity == 0 {
        return Err(CartError::OutOfStock {
            name: product.name.clone(),
        });
    }

    let available = product.stock_quantity.saturating_sub(in_cart);
    if quantity > available {
        return Err(CartError::InsufficientStock {
            name: product.name.clone(),
            available,
        });
    }
    Ok(())
}

fn conflict_for(line: &CartLine) -> Option<StockConflict> {
    let product = &line.product;
    let reason = if !product.is_active {
        ConflictReason::Unavailable
    } else if product.stock_quantity == 0 {
        ConflictReason::OutOfStock
    } else if line.quantity > product.stock_quantity {
        ConflictReason::InsufficientStock {
            available: product.stock_quantity,
        }
    } else {
        return None;
    };

    Some(StockConflict {
        product_id: product.id.clone(),
        name: product.name.clone(),
        quantity: line.quantity,
        reason,
    })
}
