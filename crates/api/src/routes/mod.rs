//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                 - Liveness check
//! GET    /health/ready           - Readiness check (store reachable)
//!
//! # Addresses (authenticated)
//! POST   /api/addresses          - Create an address for the caller's profile
//! PUT    /api/addresses          - Replace an existing address
//! GET    /api/addresses          - List addresses (?filter=profile-is-null)
//! GET    /api/addresses/{id}     - Get one address
//! DELETE /api/addresses/{id}     - Delete an address (administrators only)
//! ```

pub mod addresses;
pub mod health;

use axum::Router;

use crate::state::AppState;

/// Build the complete application router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(addresses::router())
}
