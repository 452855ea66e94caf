//! `window.localStorage` and the window `storage` event (feature `browser`).
//!
//! Neither type holds a JS handle; the window and its storage are looked up
//! on every call, so both stay `Send + Sync` and simply report
//! `Unavailable` outside a browser window.

use tracing::warn;
use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;

use super::KeyValueStorage;
use crate::error::{Result, StorageError};
use crate::events::{StorageEvent, StorageEventHandler, StorageEventSource};

/// The origin's `localStorage`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalStorage;

fn local_storage() -> Result<web_sys::Storage> {
    let window =
        web_sys::window().ok_or_else(|| StorageError::Unavailable("no window".to_string()))?;
    window
        .local_storage()
        .map_err(|e| StorageError::Unavailable(format!("{e:?}")))?
        .ok_or_else(|| StorageError::Unavailable("localStorage is disabled".to_string()))
}

fn js_error(e: &wasm_bindgen::JsValue) -> StorageError {
    StorageError::Unavailable(format!("{e:?}"))
}

impl KeyValueStorage for LocalStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        local_storage()?.get_item(key).map_err(|e| js_error(&e))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        local_storage()?
            .set_item(key, value)
            .map_err(|e| js_error(&e))
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        local_storage()?.remove_item(key).map_err(|e| js_error(&e))
    }

    fn is_available(&self) -> bool {
        local_storage().is_ok()
    }
}

/// Storage events the browser fires in this window for changes made by
/// other tabs of the same origin.
#[derive(Debug, Clone, Copy, Default)]
pub struct WindowStorageEvents;

impl StorageEventSource for WindowStorageEvents {
    fn attach(&self, handler: StorageEventHandler) {
        let Some(window) = web_sys::window() else {
            warn!("No window, cross-tab cart updates disabled");
            return;
        };

        let callback = Closure::<dyn FnMut(web_sys::StorageEvent)>::new(
            move |event: web_sys::StorageEvent| {
                handler(&StorageEvent { key: event.key() });
            },
        );
        if let Err(e) =
            window.add_event_listener_with_callback("storage", callback.as_ref().unchecked_ref())
        {
            warn!(error = ?e, "Failed to listen for storage events");
            return;
        }
        // The listener lives as long as the page.
        callback.forget();
    }
}
