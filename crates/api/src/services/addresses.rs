//! Address operations.
//!
//! Each operation opens one transaction, performs its store calls and commits.
//! Any error returned before the commit drops the transaction, rolling back
//! every write it made.

use thiserror::Error;
use tracing::instrument;

use dsc_core::{AddressId, Login};

use crate::db::{AddressStore, Database, ProfileStore, RepositoryError};
use crate::models::{Address, CurrentUser, ValidationError};

/// Entity name used in alert headers and error payloads.
pub const ENTITY_NAME: &str = "address";

/// List filter selecting addresses that no profile owns.
pub const PROFILE_IS_NULL_FILTER: &str = "profile-is-null";

/// Errors produced by address operations.
#[derive(Debug, Error)]
pub enum AddressError {
    /// Create was called with an address that already has an identity.
    #[error("A new address cannot already have an ID")]
    IdExists,

    /// Update was called with an address that has no identity.
    #[error("Invalid id")]
    IdNull,

    /// Field-level validation failed.
    #[error("Invalid address: {0}")]
    Invalid(#[from] ValidationError),

    /// No address with the given identity.
    #[error("Address {0} not found")]
    NotFound(AddressId),

    /// Caller lacks the administrator authority.
    #[error("Administrator authority required")]
    Forbidden,

    /// The caller has no profile to link the address to.
    #[error("No profile found for login {0}")]
    ProfileNotFound(Login),

    /// The store failed.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl AddressError {
    /// Client-facing error key for bad-request failures.
    #[must_use]
    pub const fn error_key(&self) -> Option<&'static str> {
        match self {
            Self::IdExists => Some("idexists"),
            Self::IdNull => Some("idnull"),
            Self::Invalid(_) => Some("invalid"),
            _ => None,
        }
    }
}

/// Address operations over a [`Database`].
pub struct AddressService<'a> {
    db: &'a dyn Database,
}

impl<'a> AddressService<'a> {
    /// Create a new address service.
    #[must_use]
    pub const fn new(db: &'a dyn Database) -> Self {
        Self { db }
    }

    /// Store a new address and link it to the caller's first profile.
    ///
    /// The address insert and the profile update commit together.
    ///
    /// # Errors
    ///
    /// Returns `AddressError::Invalid` or `AddressError::IdExists` before
    /// touching the store, `AddressError::ProfileNotFound` if the caller has
    /// no profile, or `AddressError::Repository` if the store fails.
    #[instrument(skip(self, address), fields(login = %caller.login))]
    pub async fn create(
        &self,
        caller: &CurrentUser,
        address: Address,
    ) -> Result<Address, AddressError> {
        address.validate()?;
        if address.id.is_some() {
            return Err(AddressError::IdExists);
        }

        let mut tx = self.db.begin().await?;
        let mut saved = tx.save_address(address).await?;
        let id = saved.id.ok_or_else(|| {
            RepositoryError::DataCorruption("store returned an address without id".to_owned())
        })?;

        let mut profile = tx
            .profiles_by_login(&caller.login)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AddressError::ProfileNotFound(caller.login.clone()))?;
        profile.address_id = Some(id);
        let profile = tx.save_profile(&profile).await?;

        tx.commit().await?;

        saved.profile_id = Some(profile.id);
        tracing::info!(address_id = %id, profile_id = %profile.id, "Address created");
        Ok(saved)
    }

    /// Replace an existing address, keyed by its identity.
    ///
    /// # Errors
    ///
    /// Returns `AddressError::Invalid` or `AddressError::IdNull` before
    /// touching the store, or `AddressError::Repository` if the store fails.
    #[instrument(skip(self, address), fields(address_id = ?address.id))]
    pub async fn update(&self, address: Address) -> Result<Address, AddressError> {
        address.validate()?;
        if address.id.is_none() {
            return Err(AddressError::IdNull);
        }

        let mut tx = self.db.begin().await?;
        let saved = tx.save_address(address).await?;
        tx.commit().await?;

        Ok(saved)
    }

    /// List addresses visible to the caller.
    ///
    /// With the `profile-is-null` filter, every address without an owner.
    /// Otherwise every address for administrators, and only addresses owned
    /// by the caller's own profiles for everyone else.
    ///
    /// # Errors
    ///
    /// Returns `AddressError::Repository` if the store fails.
    #[instrument(skip(self), fields(login = %caller.login))]
    pub async fn list(
        &self,
        caller: &CurrentUser,
        filter: Option<&str>,
    ) -> Result<Vec<Address>, AddressError> {
        let mut tx = self.db.begin().await?;

        let addresses = if filter == Some(PROFILE_IS_NULL_FILTER) {
            tracing::debug!("Listing addresses without a profile");
            tx.find_all_addresses()
                .await?
                .into_iter()
                .filter(|a| a.profile_id.is_none())
                .collect()
        } else if caller.is_admin() {
            tx.find_all_addresses().await?
        } else {
            let profiles = tx.profiles_by_login(&caller.login).await?;
            let mut owned = Vec::with_capacity(profiles.len());
            for address_id in profiles.iter().filter_map(|p| p.address_id) {
                if let Some(address) = tx.find_address(address_id).await? {
                    owned.push(address);
                }
            }
            owned
        };

        tx.commit().await?;
        Ok(addresses)
    }

    /// Get an address by identity.
    ///
    /// # Errors
    ///
    /// Returns `AddressError::NotFound` if no such address exists, or
    /// `AddressError::Repository` if the store fails.
    #[instrument(skip(self))]
    pub async fn get(&self, id: AddressId) -> Result<Address, AddressError> {
        let mut tx = self.db.begin().await?;
        let address = tx.find_address(id).await?;
        tx.commit().await?;

        address.ok_or(AddressError::NotFound(id))
    }

    /// Delete an address. Administrators only.
    ///
    /// The authority check runs before the store is touched. Deleting an
    /// unknown identity succeeds without effect.
    ///
    /// # Errors
    ///
    /// Returns `AddressError::Forbidden` for non-administrators, or
    /// `AddressError::Repository` if the store fails.
    #[instrument(skip(self), fields(login = %caller.login))]
    pub async fn delete(&self, caller: &CurrentUser, id: AddressId) -> Result<(), AddressError> {
        if !caller.is_admin() {
            return Err(AddressError::Forbidden);
        }

        let mut tx = self.db.begin().await?;
        let existed = tx.delete_address(id).await?;
        tx.commit().await?;

        if existed {
            tracing::info!(address_id = %id, "Address deleted");
        } else {
            tracing::debug!(address_id = %id, "Delete of unknown address ignored");
        }
        Ok(())
    }
}
