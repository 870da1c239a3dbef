//! Integration tests for Till.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p till-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `cart_scenarios` - End-to-end cart behavior through the provider
//! - `persistence` - Snapshots surviving reloads on the file-backed store
//!
//! This library holds the fixtures the test files share.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;
use std::sync::Arc;

use till_cart::{CartProvider, CartStorage, KeyValueStore, RecordingNotifier};
use till_core::{Price, Product, TaxRate};

/// An active product with the given price and stock.
#[must_use]
pub fn product(id: &str, price: u64, stock: u32) -> Product {
    Product::new(id, format!("Product {id}"), Price::from_whole(price), stock)
}

/// A provider over `store` with a recording notifier.
#[must_use]
pub fn provider(
    store: Arc<dyn KeyValueStore>,
    tax_rate: TaxRate,
) -> (CartProvider, RecordingNotifier) {
    let notifier = RecordingNotifier::new();
    let provider = CartProvider::new(
        CartStorage::new(store),
        Arc::new(notifier.clone()),
        tax_rate,
    );
    (provider, notifier)
}

/// A fresh directory path under the system temp dir. Not created.
#[must_use]
pub fn scratch_dir() -> PathBuf {
    std::env::temp_dir().join(format!("till-it-{}", uuid::Uuid::new_v4()))
}

/// Removes a directory when dropped.
pub struct ScratchDir(pub PathBuf);

impl ScratchDir {
    #[must_use]
    pub fn new() -> Self {
        Self(scratch_dir())
    }
}

impl Default for ScratchDir {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.0);
    }
}
