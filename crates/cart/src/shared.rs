//! The cart as seen by UI code.
//!
//! [`SharedCart`] is the only type most callers need. Reads go through the
//! read cache to the persistent store; mutations read the current snapshot,
//! apply a pure transition, write the result back and notify local
//! subscribers. Changes made in other tabs arrive through the registry's
//! storage event handler and cause the same notification, never a write.

use std::sync::{Arc, Mutex, PoisonError};

use arbatai_core::cart::CartTotals;
use arbatai_core::{Cart, CartMutation, DEFAULT_STORAGE_KEY, ProductSummary};
use chrono::Utc;
use tracing::{debug, error, instrument};

use crate::cache::ReadCache;
use crate::events::StorageEventSource;
use crate::registry::{Subscription, SubscriptionRegistry};
use crate::storage::{KeyValueStorage, MemoryProfile, PersistentStore};

struct Inner {
    store: PersistentStore,
    cache: ReadCache,
    registry: Arc<SubscriptionRegistry>,
    events: Option<Arc<dyn StorageEventSource>>,
    /// Serializes read-modify-write cycles of clones of this handle.
    update_lock: Mutex<()>,
    empty: Arc<Cart>,
}

/// Handle to the cart shared by every tab of one storage profile.
///
/// Cloning is cheap and clones share the cache and subscribers. Mutations
/// through clones of one handle are applied one at a time, so concurrent
/// callers never lose each other's changes; separate handles on the same
/// storage still race and the last full write wins.
#[derive(Clone)]
pub struct SharedCart {
    inner: Arc<Inner>,
}

/// Builder for [`SharedCart`].
pub struct SharedCartBuilder {
    storage: Arc<dyn KeyValueStorage>,
    storage_key: String,
    events: Option<Arc<dyn StorageEventSource>>,
}

impl SharedCartBuilder {
    /// Store the cart under `key` instead of [`DEFAULT_STORAGE_KEY`].
    #[must_use]
    pub fn storage_key(mut self, key: impl Into<String>) -> Self {
        self.storage_key = key.into();
        self
    }

    /// Receive changes made by other tabs from `events`.
    #[must_use]
    pub fn events(mut self, events: Arc<dyn StorageEventSource>) -> Self {
        self.events = Some(events);
        self
    }

    #[must_use]
    pub fn build(self) -> SharedCart {
        let registry = SubscriptionRegistry::new(self.storage_key.clone(), self.events.clone());
        SharedCart {
            inner: Arc::new(Inner {
                store: PersistentStore::new(self.storage, self.storage_key),
                cache: ReadCache::new(),
                registry,
                events: self.events,
                update_lock: Mutex::new(()),
                empty: Arc::new(Cart::empty()),
            }),
        }
    }
}

impl SharedCart {
    /// A cart over `storage` with the default key and no cross-tab events.
    #[must_use]
    pub fn new(storage: Arc<dyn KeyValueStorage>) -> Self {
        Self::builder(storage).build()
    }

    #[must_use]
    pub fn builder(storage: Arc<dyn KeyValueStorage>) -> SharedCartBuilder {
        SharedCartBuilder {
            storage,
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            events: None,
        }
    }

    /// A cart in a fresh single-tab in-memory profile.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryProfile::new().open_tab()))
    }

    /// The current cart.
    ///
    /// Consecutive calls with no change in storage return the same `Arc`,
    /// so callers can skip work with [`Arc::ptr_eq`]. Absent or unparseable
    /// storage yields the empty cart.
    #[must_use]
    pub fn snapshot(&self) -> Arc<Cart> {
        let Some(raw) = self.inner.store.read().filter(|raw| !raw.is_empty()) else {
            return Arc::clone(&self.inner.empty);
        };
        self.inner
            .cache
            .resolve(&raw)
            .unwrap_or_else(|| Arc::clone(&self.inner.empty))
    }

    /// The snapshot to use when rendering without storage, e.g. on a server.
    #[must_use]
    pub fn server_snapshot(&self) -> Arc<Cart> {
        Arc::clone(&self.inner.empty)
    }

    /// Call `listener` after every change, local or from another tab.
    pub fn subscribe(&self, listener: impl Fn() + Send + Sync + 'static) -> Subscription {
        self.inner.registry.subscribe(Arc::new(listener))
    }

    /// Add `quantity` of `product`, merging with any existing line.
    ///
    /// A quantity that clamps to zero does nothing at all.
    #[instrument(skip(self, product), fields(product_id = %product.id))]
    pub fn add(&self, product: &ProductSummary, quantity: i64) {
        self.update(&CartMutation::add(product.clone(), quantity));
    }

    /// Remove the line for `product_id`. Unknown IDs are ignored.
    #[instrument(skip(self))]
    pub fn remove(&self, product_id: &str) {
        self.update(&CartMutation::remove(product_id));
    }

    /// Set the quantity of an existing line; zero or less removes it.
    ///
    /// Only [`add`](Self::add) creates lines, so an unknown ID is ignored.
    #[instrument(skip(self))]
    pub fn set_quantity(&self, product_id: &str, quantity: i64) {
        self.update(&CartMutation::set_quantity(product_id, quantity));
    }

    #[instrument(skip(self))]
    pub fn clear(&self) {
        self.update(&CartMutation::Clear);
    }

    #[must_use]
    pub fn total_quantity(&self) -> u32 {
        self.snapshot().total_quantity()
    }

    #[must_use]
    pub fn unique_line_count(&self) -> usize {
        self.snapshot().unique_line_count()
    }

    #[must_use]
    pub fn totals(&self) -> CartTotals {
        self.snapshot().totals()
    }

    /// Whether changes currently persist and reach other tabs.
    ///
    /// `false` means the cart is running in memory only for this handle.
    #[must_use]
    pub fn is_persistence_available(&self) -> bool {
        self.inner.store.is_available()
    }

    #[must_use]
    pub fn storage_key(&self) -> &str {
        self.inner.store.key()
    }

    fn update(&self, mutation: &CartMutation) {
        {
            let _guard = self
                .inner
                .update_lock
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            let current = self.snapshot();
            let Some(next) = current.apply(mutation, Utc::now()) else {
                debug!("Ignoring cart mutation with nothing to do");
                return;
            };
            self.write(next);
        }
        self.inner.registry.emit();
    }

    fn write(&self, cart: Cart) {
        let raw = match serde_json::to_string(&cart) {
            Ok(raw) => raw,
            Err(e) => {
                error!(error = %e, "Failed to serialize cart");
                return;
            }
        };
        if self.inner.store.write(&raw) {
            if let Some(events) = &self.inner.events {
                events.observe_local_write(self.inner.store.key(), &raw);
            }
        }
        self.inner.cache.store(raw, Arc::new(cart));
    }
}

impl std::fmt::Debug for SharedCart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedCart")
            .field("storage_key", &self.storage_key())
            .field("listeners", &self.inner.registry.listener_count())
            .finish_non_exhaustive()
    }
}
