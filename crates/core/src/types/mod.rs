//! Core types for Till.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod price;
pub mod product;
pub mod tax;

pub use id::*;
pub use price::{Price, PriceError};
pub use product::Product;
pub use tax::{TaxRate, TaxRateError};
