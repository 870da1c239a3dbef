//! Product snapshot as read from the catalog.

use serde::{Deserialize, Serialize};

use super::{Price, ProductId};

/// A product as known at the moment it was read from the catalog.
///
/// The catalog owns products; carts only ever hold copies, so the stock
/// and active flag here can be stale relative to the live store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Price,
    pub stock_quantity: u32,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

const fn default_active() -> bool {
    true
}

impl Product {
    /// Create an active product snapshot.
    #[must_use]
    pub fn new(
        id: impl Into<ProductId>,
        name: impl Into<String>,
        price: Price,
        stock_quantity: u32,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            price,
            stock_quantity,
            is_active: true,
        }
    }

    /// Set the active flag.
    #[must_use]
    pub const fn with_active(mut self, is_active: bool) -> Self {
        self.is_active = is_active;
        self
    }

    /// Whether the product can be sold right now.
    #[must_use]
    pub const fn is_available(&self) -> bool {
        self.is_active && self.stock_quantity > 0
    }
}
