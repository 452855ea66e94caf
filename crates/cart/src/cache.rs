//! Memoized decoding of the persisted cart.
//!
//! Subscribers re-read the snapshot on every notification and compare it by
//! pointer to decide whether to re-render, so the same raw string must keep
//! producing the same `Arc<Cart>`. The cache holds a single entry: the last
//! raw string decoded and what it decoded to.

use std::sync::{Arc, Mutex, PoisonError};

use arbatai_core::Cart;
use tracing::debug;

struct CacheEntry {
    raw: String,
    cart: Arc<Cart>,
}

#[derive(Default)]
pub struct ReadCache {
    entry: Mutex<Option<CacheEntry>>,
}

impl ReadCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve a raw persisted value to a cart.
    ///
    /// A raw value identical to the cached one returns the cached `Arc`.
    /// Anything else is decoded and sanitized, and replaces the entry.
    /// Returns `None` for unparseable JSON, leaving the entry untouched.
    #[must_use]
    pub fn resolve(&self, raw: &str) -> Option<Arc<Cart>> {
        let mut entry = self.entry.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(hit) = entry.as_ref().filter(|e| e.raw == raw) {
            return Some(Arc::clone(&hit.cart));
        }

        let cart = match serde_json::from_str::<Cart>(raw) {
            Ok(cart) => Arc::new(cart),
            Err(e) => {
                debug!(error = %e, "Persisted cart is not valid JSON");
                return None;
            }
        };
        debug!(lines = cart.unique_line_count(), "Decoded persisted cart");
        *entry = Some(CacheEntry {
            raw: raw.to_owned(),
            cart: Arc::clone(&cart),
        });
        Some(cart)
    }

    /// Record a cart we just serialized ourselves, skipping a decode on the next read.
    pub fn store(&self, raw: String, cart: Arc<Cart>) {
        *self.entry.lock().unwrap_or_else(PoisonError::into_inner) = Some(CacheEntry { raw, cart });
    }

    /// The cached cart, if any, regardless of what storage currently holds.
    #[must_use]
    pub fn cached(&self) -> Option<Arc<Cart>> {
        self.entry
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|e| Arc::clone(&e.cart))
    }
}
