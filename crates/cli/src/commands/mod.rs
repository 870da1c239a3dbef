//! CLI command implementations.
//!
//! Each command runs against one [`Context`]: the configured cart provider
//! plus a recording notifier whose messages are printed once the command
//! finishes.

#![allow(clippy::print_stdout)]

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use till_cart::{
    CartConfig, CartError, CartProvider, CatalogCache, CatalogError, ConfigError, NotifyKind,
    RecordingNotifier,
};
use till_core::{Product, ProductId};

pub mod cart;
pub mod catalog;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("{0}")]
    Cart(#[from] CartError),

    #[error("Unknown product: {0}")]
    UnknownProduct(String),

    #[error("{0} cart line(s) conflict with current stock")]
    StockConflicts(usize),

    #[error("Failed to write output: {0}")]
    Output(#[from] serde_json::Error),
}

/// Shared state for a single CLI invocation.
pub struct Context {
    pub config: CartConfig,
    pub cart: CartProvider,
    pub notifier: RecordingNotifier,
}

impl Context {
    /// Load configuration and open the persisted cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn from_env() -> Result<Self, CommandError> {
        let config = CartConfig::from_env()?;
        let notifier = RecordingNotifier::new();
        let cart = CartProvider::open(&config, Arc::new(notifier.clone()));
        tracing::debug!(data_dir = %config.data_dir.display(), key = %config.cart_key, "Opened cart");

        Ok(Self {
            config,
            cart,
            notifier,
        })
    }

    /// Load the product catalog named by `TILL_CATALOG_PATH`.
    ///
    /// # Errors
    ///
    /// Returns an error if no catalog is configured or it cannot be read.
    pub fn catalog(&self) -> Result<CatalogCache, CommandError> {
        let path = self.config.require_catalog_path()?;
        Ok(CatalogCache::from_file(path, self.config.catalog_ttl)?)
    }

    /// Resolve a product from the catalog.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::UnknownProduct`] if the catalog has no such product.
    pub fn product(&self, id: &str) -> Result<Product, CommandError> {
        use till_cart::ProductCatalog;

        self.catalog()?
            .product(&ProductId::new(id))
            .ok_or_else(|| CommandError::UnknownProduct(id.to_string()))
    }

    /// Print and drain recorded notifications.
    pub fn flush_notifications(&self) {
        for notification in self.notifier.take() {
            let marker = match notification.kind {
                NotifyKind::Success => "✓",
                NotifyKind::Error => "✗",
                NotifyKind::Info => "•",
            };
            println!("{marker} {}", notification.message);
        }
    }
}

/// Print `value` as pretty JSON.
///
/// # Errors
///
/// Returns an error if `value` cannot be serialized.
pub fn print_json<T: Serialize>(value: &T) -> Result<(), CommandError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
