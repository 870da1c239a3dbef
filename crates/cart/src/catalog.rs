//! Product lookup for resolving and refreshing cart snapshots.
//!
//! [`CatalogCache`] keeps product snapshots in a `moka` cache with a TTL, so
//! a lookup that misses after expiry forces the caller back to the live
//! catalog instead of serving ever-older stock figures.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use moka::sync::Cache;
use thiserror::Error;
use till_core::{Product, ProductId};
use tracing::{debug, info};

/// Default lifetime of a cached product snapshot.
pub const DEFAULT_CATALOG_TTL: Duration = Duration::from_secs(300);

/// Maximum number of products held by a [`CatalogCache`].
const MAX_CAPACITY: u64 = 1000;

/// Errors loading a catalog file.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to read catalog: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse catalog: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Source of current product snapshots.
pub trait ProductCatalog {
    /// Look up a product by ID.
    fn product(&self, id: &ProductId) -> Option<Product>;
}

impl ProductCatalog for HashMap<ProductId, Product> {
    fn product(&self, id: &ProductId) -> Option<Product> {
        self.get(id).cloned()
    }
}

impl ProductCatalog for [Product] {
    fn product(&self, id: &ProductId) -> Option<Product> {
        self.iter().find(|p| &p.id == id).cloned()
    }
}

/// TTL cache of product snapshots.
#[derive(Clone)]
pub struct CatalogCache {
    cache: Cache<ProductId, Product>,
}

impl std::fmt::Debug for CatalogCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogCache")
            .field("entries", &self.cache.entry_count())
            .finish()
    }
}

impl Default for CatalogCache {
    fn default() -> Self {
        Self::new(DEFAULT_CATALOG_TTL)
    }
}

impl CatalogCache {
    /// Create an empty cache whose entries expire after `ttl`.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(MAX_CAPACITY)
            .time_to_live(ttl)
            .build();
        Self { cache }
    }

    /// Build a cache from a JSON file holding an array of products.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a product list.
    pub fn from_file(path: &Path, ttl: Duration) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path)?;
        let products: Vec<Product> = serde_json::from_str(&content)?;
        info!(path = %path.display(), products = products.len(), "Loaded catalog");

        let catalog = Self::new(ttl);
        catalog.extend(products);
        Ok(catalog)
    }

    /// Insert or replace a product snapshot.
    pub fn insert(&self, product: Product) {
        debug!(product_id = %product.id, "Caching product");
        self.cache.insert(product.id.clone(), product);
    }

    pub fn extend(&self, products: impl IntoIterator<Item = Product>) {
        for product in products {
            self.insert(product);
        }
    }

    /// Drop a cached product so the next lookup misses.
    pub fn invalidate(&self, id: &ProductId) {
        self.cache.invalidate(id);
    }

    /// All live cached products, ordered by ID.
    #[must_use]
    pub fn products(&self) -> Vec<Product> {
        let mut products: Vec<Product> = self.cache.iter().map(|(_, product)| product).collect();
        products.sort_by(|a, b| a.id.cmp(&b.id));
        products
    }
}

impl ProductCatalog for CatalogCache {
    fn product(&self, id: &ProductId) -> Option<Product> {
        self.cache.get(id)
    }
}
