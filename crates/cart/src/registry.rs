//! Change notification for cart subscribers.
//!
//! The registry is an explicit object rather than process-wide state: each
//! [`SharedCart`](crate::SharedCart) owns one, so tests get a fresh registry
//! per cart. The first subscription attaches a single handler to the
//! storage event source; from then on a change to the cart key made
//! elsewhere re-broadcasts to every listener, exactly like a local write.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};

use tracing::{debug, trace};

use crate::events::{StorageEvent, StorageEventSource};

/// A zero-argument change callback.
pub type Listener = Arc<dyn Fn() + Send + Sync>;

pub struct SubscriptionRegistry {
    storage_key: String,
    events: Option<Arc<dyn StorageEventSource>>,
    attached: AtomicBool,
    next_id: AtomicU64,
    listeners: Mutex<Vec<(u64, Listener)>>,
}

impl SubscriptionRegistry {
    /// A registry for `storage_key`, optionally fed by an event source.
    #[must_use]
    pub fn new(
        storage_key: impl Into<String>,
        events: Option<Arc<dyn StorageEventSource>>,
    ) -> Arc<Self> {
        Arc::new(Self {
            storage_key: storage_key.into(),
            events,
            attached: AtomicBool::new(false),
            next_id: AtomicU64::new(0),
            listeners: Mutex::new(Vec::new()),
        })
    }

    /// Register `listener` and return its handle.
    ///
    /// The first call attaches this registry to the storage event source.
    pub fn subscribe(self: &Arc<Self>, listener: Listener) -> Subscription {
        self.ensure_storage_listener();
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.lock_listeners().push((id, listener));
        trace!(id, "Cart listener subscribed");
        Subscription {
            registry: Arc::downgrade(self),
            id,
        }
    }

    /// Invoke every listener synchronously, in registration order.
    ///
    /// Listeners run outside the registry lock, so they may subscribe,
    /// unsubscribe, or read the cart. A panicking listener unwinds into the
    /// caller; the remaining listeners are not invoked.
    pub fn emit(&self) {
        let listeners: Vec<Listener> = self
            .lock_listeners()
            .iter()
            .map(|(_, l)| Arc::clone(l))
            .collect();
        for listener in listeners {
            listener();
        }
    }

    /// Route an inbound storage event: re-broadcast if it is about our key.
    pub fn handle_storage_event(&self, event: &StorageEvent) {
        if event.concerns(&self.storage_key) {
            debug!(key = %self.storage_key, "Cart changed in another tab");
            self.emit();
        }
    }

    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.lock_listeners().len()
    }

    /// Whether the storage event handler has been attached.
    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.attached.load(Ordering::Acquire)
    }

    fn ensure_storage_listener(self: &Arc<Self>) {
        if self.attached.swap(true, Ordering::AcqRel) {
            return;
        }
        let Some(events) = &self.events else {
            return;
        };
        let registry: Weak<Self> = Arc::downgrade(self);
        events.attach(Arc::new(move |event: &StorageEvent| {
            if let Some(registry) = registry.upgrade() {
                registry.handle_storage_event(event);
            }
        }));
    }

    fn unsubscribe(&self, id: u64) {
        self.lock_listeners().retain(|(existing, _)| *existing != id);
    }

    fn lock_listeners(&self) -> std::sync::MutexGuard<'_, Vec<(u64, Listener)>> {
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Handle to a registered listener.
///
/// Dropping the handle unsubscribes. [`unsubscribe`](Self::unsubscribe) may
/// also be called explicitly, any number of times.
#[must_use = "dropping a Subscription unsubscribes its listener"]
pub struct Subscription {
    registry: Weak<SubscriptionRegistry>,
    id: u64,
}

impl Subscription {
    pub fn unsubscribe(&self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.unsubscribe(self.id);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::panic::{AssertUnwindSafe, catch_unwind};

    use super::*;
    use crate::storage::{KeyValueStorage, MemoryProfile};

    fn recorder(log: &Arc<Mutex<Vec<&'static str>>>, name: &'static str) -> Listener {
        let log = Arc::clone(log);
        Arc::new(move || log.lock().unwrap().push(name))
    }

    #[test]
    fn test_emit_in_registration_order() {
        let registry = SubscriptionRegistry::new("cart", None);
        let log = Arc::new(Mutex::new(Vec::new()));
        let _a = registry.subscribe(recorder(&log, "a"));
        let _b = registry.subscribe(recorder(&log, "b"));
        let _c = registry.subscribe(recorder(&log, "c"));

        registry.emit();
        assert_eq!(*log.lock().unwrap(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_unsubscribe_is_idempotent() {
        let registry = SubscriptionRegistry::new("cart", None);
        let log = Arc::new(Mutex::new(Vec::new()));
        let a = registry.subscribe(recorder(&log, "a"));
        let _b = registry.subscribe(recorder(&log, "b"));

        a.unsubscribe();
        a.unsubscribe();
        assert_eq!(registry.listener_count(), 1);

        drop(a);
        assert_eq!(registry.listener_count(), 1);

        registry.emit();
        assert_eq!(*log.lock().unwrap(), vec!["b"]);
    }

    #[test]
    fn test_drop_unsubscribes() {
        let registry = SubscriptionRegistry::new("cart", None);
        let log = Arc::new(Mutex::new(Vec::new()));
        {
            let _a = registry.subscribe(recorder(&log, "a"));
            assert_eq!(registry.listener_count(), 1);
        }
        assert_eq!(registry.listener_count(), 0);
    }

    #[test]
    fn test_listener_panic_propagates() {
        fn exploding() {
            panic!("render failed");
        }
        let registry = SubscriptionRegistry::new("cart", None);
        let _boom = registry.subscribe(Arc::new(exploding));

        let result = catch_unwind(AssertUnwindSafe(|| registry.emit()));
        assert!(result.is_err());

        // The registry is still usable afterwards.
        assert_eq!(registry.listener_count(), 1);
    }

    #[test]
    fn test_attaches_once_on_first_subscribe() {
        let profile = MemoryProfile::new();
        let ours: Arc<dyn StorageEventSource> = Arc::new(profile.open_tab());
        let theirs = profile.open_tab();

        let registry = SubscriptionRegistry::new("cart", Some(ours));
        assert!(!registry.is_attached());

        let log = Arc::new(Mutex::new(Vec::new()));
        let _a = registry.subscribe(recorder(&log, "a"));
        let _b = registry.subscribe(recorder(&log, "b"));
        assert!(registry.is_attached());

        theirs.set_item("cart", "{}").unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["a", "b"]);

        theirs.set_item("unrelated", "{}").unwrap();
        assert_eq!(log.lock().unwrap().len(), 2);
    }
}
