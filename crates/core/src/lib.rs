//! dsc Core - Shared types library.
//!
//! This crate provides common types used across all dsc components:
//! - `api` - The address REST service
//! - `cli` - Command-line tools for migrations and profile provisioning
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, logins, and authorities

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
