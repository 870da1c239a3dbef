//! Till Core - Shared types library.
//!
//! This crate provides common types used across all Till components:
//! - `cart` - Cart engine, persistence, and the session-scoped provider
//! - `cli` - Command-line front end driving a file-backed cart
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no storage access,
//! no logging. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for product IDs, prices, tax rates, and the product snapshot

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
