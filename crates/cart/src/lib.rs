//! Arbatai Cart - one shopping basket shared by every tab of a profile.
//!
//! The basket lives as a single serialized JSON value in durable key-value
//! storage. Every handle ([`SharedCart`]) reads it through a memoizing
//! cache, mutates it with the pure transitions from `arbatai-core`, writes
//! it back, and tells its subscribers. Other handles on the same storage
//! learn about the change from a storage event and re-read.
//!
//! # Consistency
//!
//! A mutation is an unsynchronized read-modify-write of the whole cart. Two
//! handles writing at the same moment race and the last full write wins;
//! convergence is eventual, not linearizable.
//!
//! # Failure model
//!
//! Nothing in the public API returns an error. Unreadable or foreign data
//! reads as an empty cart, out-of-range quantities are clamped, unknown
//! product IDs are ignored, and failed writes leave the handle working in
//! memory only ([`SharedCart::is_persistence_available`] turns `false`).
//! The one fault that escapes is a panicking subscriber, which unwinds into
//! the code that triggered the notification.
//!
//! # Modules
//!
//! - [`storage`] - Storage backends and the never-failing persistent store
//! - [`events`] - Inbound storage-change signal
//! - [`registry`] - Subscriber registry
//! - [`cache`] - Raw-string keyed decode cache

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cache;
pub mod error;
pub mod events;
pub mod registry;
mod shared;
pub mod storage;

pub use error::StorageError;
pub use events::{PollingEventSource, StorageEvent, StorageEventSource};
pub use registry::Subscription;
pub use shared::{SharedCart, SharedCartBuilder};
pub use storage::{FileStorage, KeyValueStorage, MemoryProfile, MemoryTab};

#[cfg(feature = "browser")]
pub use storage::{LocalStorage, WindowStorageEvents};
