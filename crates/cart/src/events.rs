//! The inbound storage-change signal.
//!
//! A write made by this process is announced to local subscribers directly
//! by the writer. Writes made elsewhere (another tab of the same profile,
//! another process sharing the data directory) arrive here instead, as a
//! [`StorageEvent`] pushed by a [`StorageEventSource`]. An event never
//! triggers a write. Sources that cannot tell who changed a value, like
//! [`PollingEventSource`], are told about our own writes through
//! [`StorageEventSource::observe_local_write`] so they do not echo them.

use std::sync::{Arc, Mutex, PoisonError};

use tracing::debug;

use crate::storage::KeyValueStorage;

/// Notification that a storage entry was changed by someone else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageEvent {
    /// Key that changed, or `None` when the whole storage area was cleared.
    pub key: Option<String>,
}

impl StorageEvent {
    #[must_use]
    pub fn for_key(key: impl Into<String>) -> Self {
        Self {
            key: Some(key.into()),
        }
    }

    #[must_use]
    pub const fn cleared() -> Self {
        Self { key: None }
    }

    /// Whether this event is about `key`. A storage-wide clear is not.
    #[must_use]
    pub fn concerns(&self, key: &str) -> bool {
        self.key.as_deref() == Some(key)
    }
}

/// Callback invoked for each inbound storage event.
pub type StorageEventHandler = Arc<dyn Fn(&StorageEvent) + Send + Sync>;

/// Something that can deliver storage changes made outside this handle.
pub trait StorageEventSource: Send + Sync {
    /// Register a handler for all future events. Handlers are never removed.
    fn attach(&self, handler: StorageEventHandler);

    /// Record that this handle itself just stored `raw` under `key`.
    ///
    /// Sources that push events from elsewhere (browser tabs) never see our
    /// own writes and can ignore this. Sources that detect changes by
    /// comparison must treat `raw` as already seen.
    fn observe_local_write(&self, _key: &str, _raw: &str) {}
}

/// Ordered list of attached handlers, dispatched outside the lock.
#[derive(Default)]
pub(crate) struct HandlerList {
    handlers: Mutex<Vec<StorageEventHandler>>,
}

impl HandlerList {
    pub(crate) fn push(&self, handler: StorageEventHandler) {
        self.handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(handler);
    }

    pub(crate) fn snapshot(&self) -> Vec<StorageEventHandler> {
        self.handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn dispatch(&self, event: &StorageEvent) {
        for handler in self.snapshot() {
            handler(event);
        }
    }
}

/// Event source for backends that cannot push changes, such as files
/// shared between processes.
///
/// Each [`poll`](Self::poll) re-reads the watched key and dispatches an
/// event when the raw value differs from the one seen last. The first
/// value is captured at construction, so only later changes are reported.
pub struct PollingEventSource {
    storage: Arc<dyn KeyValueStorage>,
    key: String,
    last_seen: Mutex<Option<String>>,
    handlers: HandlerList,
}

impl PollingEventSource {
    #[must_use]
    pub fn new(storage: Arc<dyn KeyValueStorage>, key: impl Into<String>) -> Self {
        let key = key.into();
        let initial = storage.get_item(&key).unwrap_or_default();
        Self {
            storage,
            key,
            last_seen: Mutex::new(initial),
            handlers: HandlerList::default(),
        }
    }

    /// Check for a change and notify handlers. Returns `true` if one was found.
    pub fn poll(&self) -> bool {
        let current = match self.storage.get_item(&self.key) {
            Ok(current) => current,
            Err(e) => {
                debug!(key = %self.key, error = %e, "Skipping poll, storage read failed");
                return false;
            }
        };

        {
            let mut last_seen = self
                .last_seen
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if *last_seen == current {
                return false;
            }
            *last_seen = current;
        }

        debug!(key = %self.key, "Detected external cart change");
        self.handlers.dispatch(&StorageEvent::for_key(self.key.clone()));
        true
    }
}

impl StorageEventSource for PollingEventSource {
    fn attach(&self, handler: StorageEventHandler) {
        self.handlers.push(handler);
    }

    fn observe_local_write(&self, key: &str, raw: &str) {
        if key != self.key {
            return;
        }
        *self
            .last_seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(raw.to_owned());
    }
}
