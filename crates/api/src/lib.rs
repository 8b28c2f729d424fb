//! dsc address service library.
//!
//! Exposes the address REST resource as a library so the binary, the CLI and
//! the integration tests share one implementation.
//!
//! Callers are authenticated by a separate login service that writes the
//! current user into the shared session store; this crate only reads it.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod alert;
pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
