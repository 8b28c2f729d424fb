//! Persistence collaborators for the address service.
//!
//! # Database: `dsc`
//!
//! ## Tables
//!
//! - `address` - Postal addresses
//! - `profile` - User profiles, each owning at most one address (`address_id`)
//! - `session` - Tower-sessions storage
//!
//! # Transactions
//!
//! Every request runs its store calls inside one [`Transaction`] obtained from
//! [`Database::begin`]. Committing makes the writes visible; dropping the
//! transaction without committing rolls everything back, so early returns via
//! `?` never leave partial writes behind.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/api/migrations/` and run via:
//! ```bash
//! cargo run -p dsc-cli -- migrate
//! ```

pub mod addresses;
pub mod memory;
pub mod profiles;

use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres};
use thiserror::Error;

use dsc_core::{AddressId, Login};

use crate::models::{Address, NewProfile, Profile};

pub use memory::MemoryDatabase;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., an address already owned by another profile).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// No identity left to assign.
    #[error("{0} id sequence exhausted")]
    SequenceExhausted(&'static str),
}

/// CRUD persistence for addresses.
#[async_trait]
pub trait AddressStore: Send {
    /// Insert the address when `id` is absent, otherwise replace the stored
    /// row with that id. Returns the stored address with its identity.
    async fn save_address(&mut self, address: Address) -> Result<Address, RepositoryError>;

    /// Look up an address by identity.
    async fn find_address(&mut self, id: AddressId) -> Result<Option<Address>, RepositoryError>;

    /// All addresses, ordered by identity.
    async fn find_all_addresses(&mut self) -> Result<Vec<Address>, RepositoryError>;

    /// Remove an address. Returns `false` if it did not exist.
    async fn delete_address(&mut self, id: AddressId) -> Result<bool, RepositoryError>;
}

/// Profile lookup and linkage.
#[async_trait]
pub trait ProfileStore: Send {
    /// Profiles belonging to a login, ordered by identity.
    async fn profiles_by_login(&mut self, login: &Login) -> Result<Vec<Profile>, RepositoryError>;

    /// Persist changes to an existing profile.
    async fn save_profile(&mut self, profile: &Profile) -> Result<Profile, RepositoryError>;

    /// Provision a new profile without an address.
    async fn insert_profile(&mut self, profile: NewProfile) -> Result<Profile, RepositoryError>;
}

/// A unit of work spanning both stores.
#[async_trait]
pub trait Transaction: AddressStore + ProfileStore {
    /// Make every write performed through this transaction durable.
    async fn commit(self: Box<Self>) -> Result<(), RepositoryError>;
}

/// Source of transactions.
#[async_trait]
pub trait Database: Send + Sync {
    /// Open a new transaction.
    async fn begin(&self) -> Result<Box<dyn Transaction>, RepositoryError>;

    /// Check that the backing store is reachable.
    async fn ping(&self) -> Result<(), RepositoryError>;
}

/// `PostgreSQL`-backed [`Database`].
#[derive(Debug, Clone)]
pub struct PgDatabase {
    pool: PgPool,
}

impl PgDatabase {
    /// Wrap a connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Database for PgDatabase {
    async fn begin(&self) -> Result<Box<dyn Transaction>, RepositoryError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgTransaction { tx }))
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// An open `PostgreSQL` transaction. Rolled back on drop unless committed.
pub struct PgTransaction {
    tx: sqlx::Transaction<'static, Postgres>,
}

#[async_trait]
impl Transaction for PgTransaction {
    async fn commit(self: Box<Self>) -> Result<(), RepositoryError> {
        self.tx.commit().await?;
        Ok(())
    }
}

/// Map a unique violation to `RepositoryError::Conflict`.
fn conflict_on_unique(e: sqlx::Error, what: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(what.to_owned());
    }
    RepositoryError::Database(e)
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
