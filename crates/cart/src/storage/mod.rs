//! Durable key-value storage.
//!
//! [`KeyValueStorage`] is the backend seam: the browser's `localStorage`,
//! a directory of files, or an in-memory profile for tests. Backends report
//! failures honestly; [`PersistentStore`] sits on top and turns every
//! failure into "absent" (reads) or a logged no-op (writes) so the cart
//! keeps working when persistence does not.

mod file;
mod memory;

#[cfg(feature = "browser")]
mod browser;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, info, warn};

use crate::error::Result;

pub use file::FileStorage;
pub use memory::{MemoryProfile, MemoryTab};

#[cfg(feature = "browser")]
pub use browser::{LocalStorage, WindowStorageEvents};

/// A string-to-string store shared by every handle of one profile.
pub trait KeyValueStorage: Send + Sync {
    /// Read the value under `key`; `Ok(None)` when nothing is stored.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` when the backend cannot be read.
    fn get_item(&self, key: &str) -> Result<Option<String>>;

    /// Replace the value under `key`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` when the value could not be stored.
    fn set_item(&self, key: &str, value: &str) -> Result<()>;

    /// Delete the value under `key`. Deleting a missing key succeeds.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` when the backend cannot be modified.
    fn remove_item(&self, key: &str) -> Result<()>;

    /// Cheap capability check; `false` means writes are expected to fail.
    fn is_available(&self) -> bool {
        true
    }
}

/// Reads and writes the serialized cart under one fixed key, never failing.
///
/// When a write fails the value is kept in an in-memory shadow and the
/// store reports itself degraded: reads come from the shadow, so this
/// handle keeps a consistent cart, but nothing is shared with other tabs
/// until a write succeeds again.
///
/// Sharing stops in both directions. While degraded, [`read`](Self::read)
/// never consults the backend, so successful writes made by other tabs in
/// the meantime stay invisible here; the next successful write of our own
/// replaces them.
pub struct PersistentStore {
    backend: Arc<dyn KeyValueStorage>,
    key: String,
    shadow: Mutex<Option<String>>,
    degraded: AtomicBool,
}

impl PersistentStore {
    #[must_use]
    pub fn new(backend: Arc<dyn KeyValueStorage>, key: impl Into<String>) -> Self {
        Self {
            backend,
            key: key.into(),
            shadow: Mutex::new(None),
            degraded: AtomicBool::new(false),
        }
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The raw serialized cart, or `None` if absent or unreadable.
    #[must_use]
    pub fn read(&self) -> Option<String> {
        if self.degraded.load(Ordering::Acquire) {
            return self
                .shadow
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone();
        }

        match self.backend.get_item(&self.key) {
            Ok(raw) => raw,
            Err(e) => {
                debug!(key = %self.key, error = %e, "Cart storage read failed");
                None
            }
        }
    }

    /// Persist `raw`. Returns whether it reached durable storage.
    pub fn write(&self, raw: &str) -> bool {
        match self.backend.set_item(&self.key, raw) {
            Ok(()) => {
                if self.degraded.swap(false, Ordering::AcqRel) {
                    info!(key = %self.key, "Cart persistence restored");
                }
                *self.shadow.lock().unwrap_or_else(PoisonError::into_inner) = None;
                true
            }
            Err(e) => {
                warn!(
                    key = %self.key,
                    error = %e,
                    "Cart persistence failed, keeping cart in memory for this session"
                );
                *self.shadow.lock().unwrap_or_else(PoisonError::into_inner) = Some(raw.to_owned());
                self.degraded.store(true, Ordering::Release);
                false
            }
        }
    }

    /// Whether writes currently reach durable, shared storage.
    #[must_use]
    pub fn is_available(&self) -> bool {
        !self.degraded.load(Ordering::Acquire) && self.backend.is_available()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_read_absent() {
        let store = PersistentStore::new(Arc::new(MemoryProfile::new().open_tab()), "cart");
        assert_eq!(store.read(), None);
        assert!(store.is_available());
    }

    #[test]
    fn test_write_then_read() {
        let store = PersistentStore::new(Arc::new(MemoryProfile::new().open_tab()), "cart");
        assert!(store.write("{}"));
        assert_eq!(store.read().as_deref(), Some("{}"));
        assert_eq!(store.key(), "cart");
    }

    #[test]
    fn test_failed_write_degrades_to_memory() {
        let profile = MemoryProfile::with_quota(8);
        let store = PersistentStore::new(Arc::new(profile.open_tab()), "cart");

        assert!(!store.write("this is far too long"));
        assert!(!store.is_available());
        assert_eq!(store.read().as_deref(), Some("this is far too long"));

        // Nothing reached the shared profile.
        assert_eq!(profile.open_tab().get_item("cart").unwrap(), None);

        assert!(store.write("ok"));
        assert!(store.is_available());
        assert_eq!(store.read().as_deref(), Some("ok"));
    }

    #[test]
    fn test_degraded_read_ignores_other_writers() {
        let profile = MemoryProfile::with_quota(16);
        let store = PersistentStore::new(Arc::new(profile.open_tab()), "cart");
        assert!(!store.write("much too long for the quota"));

        profile.open_tab().set_item("cart", "theirs").unwrap();
        assert_eq!(store.read().as_deref(), Some("much too long for the quota"));

        assert!(store.write("ours"));
        assert_eq!(store.read().as_deref(), Some("ours"));
    }

    #[test]
    fn test_disabled_storage_reads_absent() {
        let profile = MemoryProfile::new();
        let tab = profile.open_tab();
        tab.set_item("cart", "{}").unwrap();
        profile.set_disabled(true);

        let store = PersistentStore::new(Arc::new(tab), "cart");
        assert_eq!(store.read(), None);
        assert!(!store.is_available());
    }
}
