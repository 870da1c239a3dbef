//! Till Cart - Stock-aware cart engine with local persistence.
//!
//! # Architecture
//!
//! - [`store`] - String-keyed key/value stores (in-memory and file-backed)
//! - [`storage`] - Adapter that loads and saves cart snapshots, never failing the caller
//! - [`engine`] - The cart itself: invariants, mutations, derived summary
//! - [`provider`] - One shared engine per session, with change subscriptions
//! - [`catalog`] - TTL cache of product snapshots used to resolve and refresh lines
//! - [`checkout`] - Order drafts handed to order submission
//!
//! All operations are synchronous. Business rejections come back as
//! [`CartError`] and are also sent to the [`Notifier`]; storage failures are
//! logged and never surface.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use till_cart::{CartProvider, CartStorage, MemoryStore, TracingNotifier};
//! use till_core::{Price, Product, TaxRate};
//!
//! let provider = CartProvider::new(
//!     CartStorage::new(Arc::new(MemoryStore::new())),
//!     Arc::new(TracingNotifier),
//!     TaxRate::ZERO,
//! );
//!
//! let coffee = Product::new("p1", "Kopi Susu", Price::from_whole(10_000), 5);
//! provider.add_item(&coffee, 2).unwrap();
//! assert_eq!(provider.summary().item_count, 2);
//! assert!(provider.add_item(&coffee, 10).is_err());
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod catalog;
pub mod checkout;
pub mod config;
pub mod engine;
pub mod error;
pub mod line;
pub mod notify;
pub mod provider;
pub mod storage;
pub mod store;
pub mod summary;

pub use catalog::{CatalogCache, CatalogError, ProductCatalog};
pub use checkout::{OrderDraft, OrderItem};
pub use config::{CartConfig, ConfigError};
pub use engine::{CartEngine, CartSnapshot, ConflictReason, StockConflict};
pub use error::CartError;
pub use line::CartLine;
pub use notify::{Notification, Notifier, NotifyKind, RecordingNotifier, TracingNotifier};
pub use provider::{CartProvider, CartScope, SubscriptionId};
pub use storage::{CartStorage, DEFAULT_CART_KEY};
pub use store::{FileStore, KeyValueStore, MemoryStore, StorageError};
pub use summary::CartSummary;
