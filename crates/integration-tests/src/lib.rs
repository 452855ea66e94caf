//! Integration tests for Arbatai.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p arbatai-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `cart_sync` - Several handles sharing one basket through a memory
//!   profile or a data directory

#![cfg_attr(not(test), forbid(unsafe_code))]
