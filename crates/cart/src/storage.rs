//! Cart persistence adapter.
//!
//! Round-trips the cart's line list through a [`KeyValueStore`] as JSON.
//! Storage problems never reach the caller: a missing or corrupt snapshot
//! loads as an empty cart, and failed writes are logged while the
//! in-memory cart stays authoritative.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use till_core::ProductId;
use tracing::{debug, error, warn};

use crate::line::CartLine;
use crate::store::{KeyValueStore, StorageError};

/// Default storage key for the cart snapshot.
pub const DEFAULT_CART_KEY: &str = "cart";

/// Reasons a stored snapshot is rejected on load.
#[derive(Debug, Error)]
enum SnapshotError {
    #[error("unreadable snapshot: {0}")]
    Unreadable(#[from] StorageError),
    #[error("malformed snapshot: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("line for product {0} has zero quantity")]
    ZeroQuantity(ProductId),
    #[error("product {0} appears on more than one line")]
    DuplicateLine(ProductId),
}

/// Loads and saves cart snapshots under a single key.
#[derive(Clone)]
pub struct CartStorage {
    store: Arc<dyn KeyValueStore>,
    key: String,
}

impl fmt::Debug for CartStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CartStorage")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

impl CartStorage {
    /// Create an adapter writing under [`DEFAULT_CART_KEY`].
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_key(store, DEFAULT_CART_KEY)
    }

    /// Create an adapter writing under `key`.
    #[must_use]
    pub fn with_key(store: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Read the stored cart.
    ///
    /// Returns an empty list when nothing is stored, when the store cannot
    /// be read, or when the stored value is not a valid cart. Invalid
    /// snapshots are removed from the store.
    #[must_use]
    pub fn load(&self) -> Vec<CartLine> {
        let decoded = match self.store.get(&self.key) {
            Ok(Some(raw)) => decode(&raw),
            Ok(None) => return Vec::new(),
            Err(e @ StorageError::Corrupt(_)) => Err(e.into()),
            Err(e) => {
                warn!(key = %self.key, error = %e, "Cart storage unavailable, starting empty");
                return Vec::new();
            }
        };

        match decoded {
            Ok(lines) => {
                debug!(key = %self.key, lines = lines.len(), "Loaded cart snapshot");
                lines
            }
            Err(e) => {
                warn!(key = %self.key, error = %e, "Discarding corrupt cart snapshot");
                if let Err(e) = self.store.remove(&self.key) {
                    error!(key = %self.key, error = %e, "Failed to remove corrupt cart snapshot");
                }
                Vec::new()
            }
        }
    }

    /// Write `lines` to the store. Failures are logged, not returned.
    pub fn save(&self, lines: &[CartLine]) {
        let encoded = match serde_json::to_string(lines) {
            Ok(encoded) => encoded,
            Err(e) => {
                error!(key = %self.key, error = %e, "Failed to encode cart snapshot");
                return;
            }
        };

        match self.store.set(&self.key, &encoded) {
            Ok(()) => debug!(key = %self.key, lines = lines.len(), "Saved cart snapshot"),
            Err(e) => error!(key = %self.key, error = %e, "Cart storage unavailable, snapshot not saved"),
        }
    }

    /// Remove the stored snapshot. Failures are logged, not returned.
    pub fn clear(&self) {
        if let Err(e) = self.store.remove(&self.key) {
            error!(key = %self.key, error = %e, "Failed to clear cart snapshot");
        }
    }
}

fn decode(raw: &str) -> Result<Vec<CartLine>, SnapshotError> {
    let lines: Vec<CartLine> = serde_json::from_str(raw)?;

    let mut seen = HashSet::with_capacity(lines.len());
    for line in &lines {
        if line.quantity == 0 {
            return Err(SnapshotError::ZeroQuantity(line.product_id().clone()));
        }
        if !seen.insert(line.product_id()) {
            return Err(SnapshotError::DuplicateLine(line.product_id().clone()));
        }
    }

    Ok(lines)
}
