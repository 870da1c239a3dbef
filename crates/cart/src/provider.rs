//! Session-scoped cart provider.
//!
//! A [`CartProvider`] owns the one [`CartEngine`] for a session and hands
//! out cheap clones of itself, so every consumer sees the same cart without
//! threading it through each call. The engine is built, and the stored cart
//! rehydrated, on first use.
//!
//! Consumers reach the provider through a [`CartScope`]. Asking a scope
//! without a provider for the cart is a wiring bug and fails with
//! [`CartError::ContextMissing`].

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

use till_core::{Product, ProductId, TaxRate};
use tracing::{debug, error};

use crate::catalog::ProductCatalog;
use crate::checkout::OrderDraft;
use crate::config::CartConfig;
use crate::engine::{CartEngine, CartSnapshot, StockConflict};
use crate::error::{CartError, Result};
use crate::line::CartLine;
use crate::notify::Notifier;
use crate::storage::CartStorage;
use crate::store::FileStore;
use crate::summary::CartSummary;

/// Callback invoked with the new cart state after each mutation.
pub type Subscriber = Arc<dyn Fn(&CartSnapshot) + Send + Sync>;

/// Handle returned by [`CartProvider::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Shared handle to a session's cart.
///
/// Cheaply cloneable via `Arc`; all clones drive the same engine.
#[derive(Clone)]
pub struct CartProvider {
    inner: Arc<ProviderInner>,
}

struct ProviderInner {
    storage: CartStorage,
    notifier: Arc<dyn Notifier>,
    tax_rate: TaxRate,
    engine: OnceLock<Mutex<CartEngine>>,
    subscribers: Mutex<Subscribers>,
}

#[derive(Default)]
struct Subscribers {
    next_id: u64,
    entries: Vec<(SubscriptionId, Subscriber)>,
}

impl fmt::Debug for CartProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CartProvider")
            .field("storage", &self.inner.storage)
            .field("tax_rate", &self.inner.tax_rate)
            .field("initialized", &self.is_initialized())
            .finish_non_exhaustive()
    }
}

impl CartProvider {
    /// Create a provider. Storage is not read until the cart is first used.
    #[must_use]
    pub fn new(storage: CartStorage, notifier: Arc<dyn Notifier>, tax_rate: TaxRate) -> Self {
        Self {
            inner: Arc::new(ProviderInner {
                storage,
                notifier,
                tax_rate,
                engine: OnceLock::new(),
                subscribers: Mutex::new(Subscribers::default()),
            }),
        }
    }

    /// Create a provider backed by a [`FileStore`] in the configured data directory.
    #[must_use]
    pub fn open(config: &CartConfig, notifier: Arc<dyn Notifier>) -> Self {
        let store = FileStore::new(&config.data_dir);
        let storage = CartStorage::with_key(Arc::new(store), config.cart_key.clone());
        Self::new(storage, notifier, config.tax_rate)
    }

    /// Whether the engine has been built yet.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.inner.engine.get().is_some()
    }

    // =========================================================================
    // Queries
    // =========================================================================

    #[must_use]
    pub fn lines(&self) -> Vec<CartLine> {
        self.engine().lines().to_vec()
    }

    #[must_use]
    pub fn summary(&self) -> CartSummary {
        self.engine().summary()
    }

    #[must_use]
    pub fn snapshot(&self) -> CartSnapshot {
        self.engine().snapshot()
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// See [`CartEngine::add_item`].
    ///
    /// # Errors
    ///
    /// Returns the engine's rejection; the cart is unchanged.
    pub fn add_item(&self, product: &Product, quantity: u32) -> Result<()> {
        self.mutate(|engine| engine.add_item(product, quantity))
    }

    /// See [`CartEngine::update_item_quantity`].
    ///
    /// # Errors
    ///
    /// Returns the engine's rejection; the cart is unchanged.
    pub fn update_item_quantity(&self, product_id: &ProductId, quantity: u32) -> Result<()> {
        self.mutate(|engine| engine.update_item_quantity(product_id, quantity))
    }

    /// See [`CartEngine::remove_item`].
    pub fn remove_item(&self, product_id: &ProductId) -> bool {
        let removed = self.mutate(|engine| Ok(engine.remove_item(product_id)));
        removed.unwrap_or(false)
    }

    /// See [`CartEngine::clear_cart`].
    pub fn clear_cart(&self) {
        let snapshot = {
            let mut engine = self.engine();
            engine.clear_cart();
            engine.snapshot()
        };
        self.publish(&snapshot);
    }

    /// See [`CartEngine::refresh_snapshots`].
    pub fn refresh_snapshots<C>(&self, catalog: &C) -> Vec<StockConflict>
    where
        C: ProductCatalog + ?Sized,
    {
        self.mutate(|engine| Ok(engine.refresh_snapshots(catalog)))
            .unwrap_or_default()
    }

    /// See [`CartEngine::order_draft`].
    ///
    /// # Errors
    ///
    /// Returns [`CartError::EmptyCart`] if there are no lines.
    pub fn order_draft(&self) -> Result<OrderDraft> {
        self.engine().order_draft()
    }

    // =========================================================================
    // Subscriptions
    // =========================================================================

    /// Register `callback` to run after every successful mutation.
    ///
    /// Callbacks run on the mutating thread with no provider lock held, so
    /// they may read or change the cart. A change made from a callback
    /// publishes its own snapshot before the outer publish continues.
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&CartSnapshot) + Send + Sync + 'static,
    {
        let mut subscribers = self.subscribers();
        let id = SubscriptionId(subscribers.next_id);
        subscribers.next_id += 1;
        subscribers.entries.push((id, Arc::new(callback)));
        debug!(subscription = id.0, "Cart subscriber added");
        id
    }

    /// Remove a subscription. Returns whether it existed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.subscribers();
        let before = subscribers.entries.len();
        subscribers.entries.retain(|(entry, _)| *entry != id);
        subscribers.entries.len() != before
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn engine(&self) -> MutexGuard<'_, CartEngine> {
        self.inner
            .engine
            .get_or_init(|| {
                debug!("Initializing cart engine");
                Mutex::new(CartEngine::load(
                    self.inner.storage.clone(),
                    Arc::clone(&self.inner.notifier),
                    self.inner.tax_rate,
                ))
            })
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn subscribers(&self) -> MutexGuard<'_, Subscribers> {
        self.inner
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `op` against the engine and publish the new state on success.
    fn mutate<T>(&self, op: impl FnOnce(&mut CartEngine) -> Result<T>) -> Result<T> {
        let (result, snapshot) = {
            let mut engine = self.engine();
            let result = op(&mut engine);
            let snapshot = result.is_ok().then(|| engine.snapshot());
            (result, snapshot)
        };

        if let Some(snapshot) = snapshot {
            self.publish(&snapshot);
        }
        result
    }

    /// Call every subscriber with `snapshot`.
    fn publish(&self, snapshot: &CartSnapshot) {
        let callbacks: Vec<Subscriber> = self
            .subscribers()
            .entries
            .iter()
            .map(|(_, callback)| Arc::clone(callback))
            .collect();

        for callback in callbacks {
            callback(snapshot);
        }
    }
}

/// A consumer's view of whether a cart has been provided.
#[derive(Debug, Clone, Default)]
pub struct CartScope {
    provider: Option<CartProvider>,
}

impl CartScope {
    /// A scope with no cart.
    #[must_use]
    pub const fn empty() -> Self {
        Self { provider: None }
    }

    /// A scope providing `provider`.
    #[must_use]
    pub const fn with_provider(provider: CartProvider) -> Self {
        Self {
            provider: Some(provider),
        }
    }

    /// Install `provider`, replacing any previous one.
    pub fn provide(&mut self, provider: CartProvider) {
        self.provider = Some(provider);
    }

    /// The provided cart.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::ContextMissing`] if no provider was installed.
    pub fn use_cart(&self) -> Result<&CartProvider> {
        self.provider.as_ref().ok_or_else(|| {
            error!("Cart used outside of a cart provider");
            CartError::ContextMissing
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

    use rust_decimal::Decimal;
    use till_core::Price;

    use super::*;
    use crate::notify::RecordingNotifier;
    use crate::store::{KeyValueStore, MemoryStore, StorageError};

    fn provider_on(store: MemoryStore) -> CartProvider {
        CartProvider::new(
            CartStorage::new(Arc::new(store)),
            Arc::new(RecordingNotifier::new()),
            TaxRate::ZERO,
        )
    }

    fn product(id: &str, stock: u32) -> Product {
        Product::new(id, format!("Product {id}"), Price::from_whole(10_000), stock)
    }

    /// Counts reads so lazy initialization can be observed.
    #[derive(Clone, Default)]
    struct CountingStore {
        inner: MemoryStore,
        reads: Arc<AtomicUsize>,
    }

    impl KeyValueStore for CountingStore {
        fn get(&self, key: &str) -> std::result::Result<Option<String>, StorageError> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> std::result::Result<(), StorageError> {
            self.inner.set(key, value)
        }

        fn remove(&self, key: &str) -> std::result::Result<(), StorageError> {
            self.inner.remove(key)
        }
    }

    #[test]
    fn test_engine_built_once_on_first_use() {
        let store = CountingStore::default();
        let reads = Arc::clone(&store.reads);
        let provider = CartProvider::new(
            CartStorage::new(Arc::new(store)),
            Arc::new(RecordingNotifier::new()),
            TaxRate::ZERO,
        );

        assert!(!provider.is_initialized());
        assert_eq!(reads.load(Ordering::SeqCst), 0);

        let _ = provider.summary();
        let _ = provider.lines();
        provider.add_item(&product("p1", 5), 1).unwrap();

        assert!(provider.is_initialized());
        assert_eq!(reads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_clones_share_one_cart() {
        let provider = provider_on(MemoryStore::new());
        let other = provider.clone();

        provider.add_item(&product("p1", 5), 2).unwrap();
        other.add_item(&product("p1", 5), 1).unwrap();

        assert_eq!(provider.lines().first().unwrap().quantity, 3);
        assert_eq!(other.summary().item_count, 3);
    }

    #[test]
    fn test_rehydrates_from_storage() {
        let store = MemoryStore::new();
        provider_on(store.clone())
            .add_item(&product("p1", 5), 4)
            .unwrap();

        let reloaded = provider_on(store);
        assert_eq!(reloaded.summary().subtotal, Decimal::from(40_000));
    }

    #[test]
    fn test_subscribers_see_each_successful_mutation() {
        let provider = provider_on(MemoryStore::new());
        let last_count = Arc::new(AtomicU64::new(u64::MAX));
        let calls = Arc::new(AtomicUsize::new(0));

        let (seen, hits) = (Arc::clone(&last_count), Arc::clone(&calls));
        provider.subscribe(move |snapshot| {
            seen.store(snapshot.summary.item_count, Ordering::SeqCst);
            hits.fetch_add(1, Ordering::SeqCst);
        });

        provider.add_item(&product("p1", 5), 2).unwrap();
        assert_eq!(last_count.load(Ordering::SeqCst), 2);

        // Rejections do not publish
        provider.add_item(&product("p1", 5), 10).unwrap_err();
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        provider
            .update_item_quantity(&ProductId::new("p1"), 5)
            .unwrap();
        assert_eq!(last_count.load(Ordering::SeqCst), 5);

        provider.clear_cart();
        assert_eq!(last_count.load(Ordering::SeqCst), 0);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_remove_and_refresh_publish() {
        let provider = provider_on(MemoryStore::new());
        provider.add_item(&product("p1", 5), 3).unwrap();
        provider.add_item(&product("p2", 5), 1).unwrap();

        let calls = Arc::new(AtomicUsize::new(0));
        let last_count = Arc::new(AtomicU64::new(u64::MAX));
        let (hits, seen) = (Arc::clone(&calls), Arc::clone(&last_count));
        provider.subscribe(move |snapshot| {
            seen.store(snapshot.summary.item_count, Ordering::SeqCst);
            hits.fetch_add(1, Ordering::SeqCst);
        });

        assert!(provider.remove_item(&ProductId::new("p2")));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(last_count.load(Ordering::SeqCst), 3);

        let catalog = vec![product("p1", 2)];
        let conflicts = provider.refresh_snapshots(catalog.as_slice());
        assert_eq!(conflicts.len(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(last_count.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_subscriber_may_change_cart() {
        let provider = provider_on(MemoryStore::new());
        let inner = provider.clone();
        provider.subscribe(move |snapshot| {
            if snapshot.summary.item_count == 1 {
                inner.remove_item(&ProductId::new("p1"));
            }
        });

        let (tx, rx) = std::sync::mpsc::channel();
        let worker = provider.clone();
        std::thread::spawn(move || {
            worker.add_item(&product("p1", 5), 1).unwrap();
            tx.send(()).unwrap();
        });

        rx.recv_timeout(std::time::Duration::from_secs(5))
            .expect("mutation from a subscriber completes");
        assert!(provider.lines().is_empty());
    }

    #[test]
    fn test_subscriber_may_read_cart() {
        let provider = provider_on(MemoryStore::new());
        let reader = provider.clone();
        let seen = Arc::new(AtomicUsize::new(0));
        let seen_in_callback = Arc::clone(&seen);

        provider.subscribe(move |_| {
            seen_in_callback.store(reader.lines().len(), Ordering::SeqCst);
        });
        provider.add_item(&product("p1", 5), 1).unwrap();

        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unsubscribe() {
        let provider = provider_on(MemoryStore::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let hits = Arc::clone(&calls);
        let id = provider.subscribe(move |_| {
            hits.fetch_add(1, Ordering::SeqCst);
        });

        assert!(provider.unsubscribe(id));
        assert!(!provider.unsubscribe(id));
        provider.add_item(&product("p1", 5), 1).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_scope_without_provider() {
        let scope = CartScope::empty();
        assert_eq!(scope.use_cart().unwrap_err(), CartError::ContextMissing);
    }

    #[test]
    fn test_scope_with_provider() {
        let mut scope = CartScope::default();
        scope.provide(provider_on(MemoryStore::new()));

        let cart = scope.use_cart().unwrap();
        cart.add_item(&product("p1", 5), 1).unwrap();
        assert_eq!(scope.use_cart().unwrap().summary().item_count, 1);
    }
}
