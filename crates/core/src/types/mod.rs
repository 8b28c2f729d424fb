//! Core types for dsc.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod authority;
pub mod id;
pub mod login;

pub use authority::Authority;
pub use id::*;
pub use login::{Login, LoginError};
