//! Arbatai Core - Cart types and pure cart logic.
//!
//! This crate provides the types shared by every Arbatai component:
//! - `arbatai-cart` - Shared cart synchronization across tabs and processes
//! - `arbatai-cli` - Command-line access to the local basket
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no storage, no
//! clocks, no listeners. Mutations take the current time as an argument so
//! they stay deterministic under test.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for product IDs and prices
//! - [`cart`] - The cart value, its sanitizer, and its state transitions
//! - [`checkout`] - Checkout form validation

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod checkout;
pub mod types;

pub use cart::{
    Cart, CartLine, CartMutation, CartTotals, DEFAULT_STORAGE_KEY, MAX_QTY, ProductSummary,
    SCHEMA_VERSION, sanitize,
};
pub use types::*;
