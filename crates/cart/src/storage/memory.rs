//! In-process browser profile.
//!
//! A [`MemoryProfile`] owns one key-value area; each [`MemoryTab`] opened on
//! it is a handle that behaves like a browser tab of that profile. Writes
//! are immediately visible to every tab, and a successful change notifies
//! every tab except the one that made it, which is how the platform's
//! storage event behaves.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use uuid::Uuid;

use super::KeyValueStorage;
use crate::error::{Result, StorageError};
use crate::events::{HandlerList, StorageEvent, StorageEventHandler, StorageEventSource};

#[derive(Default)]
struct ProfileState {
    items: Mutex<HashMap<String, String>>,
    tabs: Mutex<Vec<(Uuid, Arc<HandlerList>)>>,
    quota: Option<usize>,
    disabled: AtomicBool,
}

impl ProfileState {
    fn ensure_enabled(&self) -> Result<()> {
        if self.disabled.load(Ordering::Acquire) {
            return Err(StorageError::Unavailable(
                "storage is disabled for this profile".to_string(),
            ));
        }
        Ok(())
    }

    fn items(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Deliver `event` to every tab other than `origin`.
    fn broadcast(&self, origin: Uuid, event: &StorageEvent) {
        let others: Vec<Arc<HandlerList>> = self
            .tabs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|(id, _)| *id != origin)
            .map(|(_, handlers)| Arc::clone(handlers))
            .collect();

        for handlers in others {
            handlers.dispatch(event);
        }
    }
}

/// A shared storage area standing in for one browser profile.
#[derive(Clone, Default)]
pub struct MemoryProfile {
    state: Arc<ProfileState>,
}

impl MemoryProfile {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A profile whose keys and values together may not exceed `limit` bytes.
    #[must_use]
    pub fn with_quota(limit: usize) -> Self {
        Self {
            state: Arc::new(ProfileState {
                quota: Some(limit),
                ..ProfileState::default()
            }),
        }
    }

    /// Simulate storage being switched off (private browsing, blocked site data).
    pub fn set_disabled(&self, disabled: bool) {
        self.state.disabled.store(disabled, Ordering::Release);
    }

    /// Open a new tab on this profile.
    #[must_use]
    pub fn open_tab(&self) -> MemoryTab {
        let id = Uuid::new_v4();
        let handlers = Arc::new(HandlerList::default());
        self.state
            .tabs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, Arc::clone(&handlers)));
        MemoryTab {
            id,
            handlers,
            state: Arc::clone(&self.state),
        }
    }
}

/// One tab's handle on a [`MemoryProfile`].
///
/// Closing the tab (dropping the handle) stops event delivery to it.
pub struct MemoryTab {
    id: Uuid,
    handlers: Arc<HandlerList>,
    state: Arc<ProfileState>,
}

impl MemoryTab {
    /// Remove every key in the profile, as `localStorage.clear()` does.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Unavailable` if the profile is disabled.
    pub fn clear(&self) -> Result<()> {
        self.state.ensure_enabled()?;
        self.state.items().clear();
        self.state.broadcast(self.id, &StorageEvent::cleared());
        Ok(())
    }
}

impl KeyValueStorage for MemoryTab {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        self.state.ensure_enabled()?;
        Ok(self.state.items().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.state.ensure_enabled()?;
        {
            let mut items = self.state.items();
            if let Some(limit) = self.state.quota {
                let others: usize = items
                    .iter()
                    .filter(|(k, _)| k.as_str() != key)
                    .map(|(k, v)| k.len() + v.len())
                    .sum();
                if others + key.len() + value.len() > limit {
                    return Err(StorageError::QuotaExceeded { limit });
                }
            }
            items.insert(key.to_owned(), value.to_owned());
        }
        self.state.broadcast(self.id, &StorageEvent::for_key(key));
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        self.state.ensure_enabled()?;
        let removed = self.state.items().remove(key).is_some();
        if removed {
            self.state.broadcast(self.id, &StorageEvent::for_key(key));
        }
        Ok(())
    }

    fn is_available(&self) -> bool {
        !self.state.disabled.load(Ordering::Acquire)
    }
}

impl StorageEventSource for MemoryTab {
    fn attach(&self, handler: StorageEventHandler) {
        self.handlers.push(handler);
    }
}

impl Drop for MemoryTab {
    fn drop(&mut self) {
        self.state
            .tabs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|(id, _)| *id != self.id);
    }
}
