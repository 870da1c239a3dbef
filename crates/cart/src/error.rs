//! Cart rejection errors.
//!
//! Every variant is an expected, recoverable outcome. Operations that fail
//! leave the cart untouched, and the message is written for the person at
//! the register.

use thiserror::Error;
use till_core::ProductId;

/// Reasons a cart operation was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    /// Requested quantity is below 1.
    #[error("Quantity must be at least 1")]
    InvalidQuantity,

    /// Product is not active in the catalog.
    #[error("{name} is not available for sale")]
    ProductUnavailable { name: String },

    /// Product has no stock at all.
    #[error("{name} is out of stock")]
    OutOfStock { name: String },

    /// Requested total would exceed known stock. `available` is how many
    /// units the request could have asked for.
    #[error("Not enough stock for {name}: only {available} available")]
    InsufficientStock { name: String, available: u32 },

    /// No line exists for the product.
    #[error("Product {0} is not in the cart")]
    ProductNotInCart(ProductId),

    /// Checkout was requested on an empty cart.
    #[error("Cart is empty")]
    EmptyCart,

    /// The cart was accessed outside a scope that provides one.
    #[error("Cart accessed outside of a cart provider")]
    ContextMissing,
}

impl CartError {
    /// Units that can still be added, for stock rejections.
    #[must_use]
    pub const fn available(&self) -> Option<u32> {
        match self {
            Self::InsufficientStock { available, .. } => Some(*available),
            Self::OutOfStock { .. } => Some(0),
            _ => None,
        }
    }
}

/// Result type alias for [`CartError`].
pub type Result<T> = std::result::Result<T, CartError>;
