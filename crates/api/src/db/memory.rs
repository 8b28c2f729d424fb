//! In-process [`Database`] for tests and local runs without `PostgreSQL`.
//!
//! Each transaction works on a private snapshot of the data taken at
//! `begin`. `commit` publishes the snapshot; dropping the transaction
//! discards it. Commit is a whole-state overwrite: when two transactions
//! overlap, the later commit drops every write of the earlier one, including
//! unrelated inserts.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use dsc_core::{AddressId, Login, ProfileId};

use super::{AddressStore, Database, ProfileStore, RepositoryError, Transaction};
use crate::models::{Address, NewProfile, Profile};

#[derive(Debug, Clone, Default)]
struct MemoryState {
    addresses: BTreeMap<AddressId, Address>,
    profiles: BTreeMap<ProfileId, Profile>,
    last_address_id: i64,
    last_profile_id: i64,
}

impl MemoryState {
    fn owner_of(&self, id: AddressId) -> Option<ProfileId> {
        self.profiles
            .values()
            .find(|p| p.address_id == Some(id))
            .map(|p| p.id)
    }

    fn with_owner(&self, address: &Address) -> Address {
        let mut address = address.clone();
        address.profile_id = address.id.and_then(|id| self.owner_of(id));
        address
    }
}

fn next_id(last: &mut i64, entity: &'static str) -> Result<i64, RepositoryError> {
    *last = last
        .checked_add(1)
        .ok_or(RepositoryError::SequenceExhausted(entity))?;
    Ok(*last)
}

/// Shared in-memory store.
#[derive(Debug, Clone, Default)]
pub struct MemoryDatabase {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryDatabase {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Database for MemoryDatabase {
    async fn begin(&self) -> Result<Box<dyn Transaction>, RepositoryError> {
        let working = self.state.lock().await.clone();
        Ok(Box::new(MemoryTransaction {
            shared: Arc::clone(&self.state),
            working,
        }))
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}

/// Snapshot-based transaction over a [`MemoryDatabase`].
pub struct MemoryTransaction {
    shared: Arc<Mutex<MemoryState>>,
    working: MemoryState,
}

#[async_trait]
impl Transaction for MemoryTransaction {
    /// Replace the shared state with this snapshot (whole-state overwrite).
    async fn commit(self: Box<Self>) -> Result<(), RepositoryError> {
        *self.shared.lock().await = self.working;
        Ok(())
    }
}

#[async_trait]
impl AddressStore for MemoryTransaction {
    async fn save_address(&mut self, address: Address) -> Result<Address, RepositoryError> {
        let state = &mut self.working;
        let id = if let Some(id) = address.id {
            state.last_address_id = state.last_address_id.max(id.as_i64());
            id
        } else {
            AddressId::new(next_id(&mut state.last_address_id, "address")?)
        };

        let stored = Address {
            id: Some(id),
            ..address.without_identity()
        };
        state.addresses.insert(id, stored.clone());

        Ok(state.with_owner(&stored))
    }

    async fn find_address(&mut self, id: AddressId) -> Result<Option<Address>, RepositoryError> {
        Ok(self
            .working
            .addresses
            .get(&id)
            .map(|a| self.working.with_owner(a)))
    }

    async fn find_all_addresses(&mut self) -> Result<Vec<Address>, RepositoryError> {
        Ok(self
            .working
            .addresses
            .values()
            .map(|a| self.working.with_owner(a))
            .collect())
    }

    async fn delete_address(&mut self, id: AddressId) -> Result<bool, RepositoryError> {
        let state = &mut self.working;
        if state.addresses.remove(&id).is_none() {
            return Ok(false);
        }

        for profile in state.profiles.values_mut() {
            if profile.address_id == Some(id) {
                profile.address_id = None;
            }
        }

        Ok(true)
    }
}

#[async_trait]
impl ProfileStore for MemoryTransaction {
    async fn profiles_by_login(&mut self, login: &Login) -> Result<Vec<Profile>, RepositoryError> {
        Ok(self
            .working
            .profiles
            .values()
            .filter(|p| &p.user_login == login)
            .cloned()
            .collect())
    }

    async fn save_profile(&mut self, profile: &Profile) -> Result<Profile, RepositoryError> {
        let state = &mut self.working;
        if !state.profiles.contains_key(&profile.id) {
            return Err(RepositoryError::NotFound);
        }

        if let Some(address_id) = profile.address_id
            && state
                .owner_of(address_id)
                .is_some_and(|owner| owner != profile.id)
        {
            return Err(RepositoryError::Conflict(
                "address already linked to another profile".to_owned(),
            ));
        }

        state.profiles.insert(profile.id, profile.clone());
        Ok(profile.clone())
    }

    async fn insert_profile(&mut self, profile: NewProfile) -> Result<Profile, RepositoryError> {
        let state = &mut self.working;
        let id = next_id(&mut state.last_profile_id, "profile")?;

        let profile = Profile {
            id: ProfileId::new(id),
            user_login: profile.user_login,
            display_name: profile.display_name,
            address_id: None,
        };
        state.profiles.insert(profile.id, profile.clone());

        Ok(profile)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn address(street: &str) -> Address {
        Address {
            street_address: street.to_owned(),
            city: "Springfield".to_owned(),
            ..Address::default()
        }
    }

    fn new_profile(login: &str) -> NewProfile {
        NewProfile {
            user_login: Login::parse(login).unwrap(),
            display_name: None,
        }
    }

    #[tokio::test]
    async fn test_save_assigns_sequential_ids() {
        let db = MemoryDatabase::new();
        let mut tx = db.begin().await.unwrap();

        let first = tx.save_address(address("1 Main St")).await.unwrap();
        let second = tx.save_address(address("2 Main St")).await.unwrap();

        assert_eq!(first.id, Some(AddressId::new(1)));
        assert_eq!(second.id, Some(AddressId::new(2)));
    }

    #[tokio::test]
    async fn test_uncommitted_writes_are_discarded() {
        let db = MemoryDatabase::new();

        let mut tx = db.begin().await.unwrap();
        tx.save_address(address("1 Main St")).await.unwrap();
        drop(tx);

        let mut tx = db.begin().await.unwrap();
        assert!(tx.find_all_addresses().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_committed_writes_are_visible() {
        let db = MemoryDatabase::new();

        let mut tx = db.begin().await.unwrap();
        let saved = tx.save_address(address("1 Main St")).await.unwrap();
        tx.commit().await.unwrap();

        let mut tx = db.begin().await.unwrap();
        let found = tx.find_address(saved.id.unwrap()).await.unwrap();
        assert_eq!(found, Some(saved));
    }

    #[tokio::test]
    async fn test_owner_is_derived_from_profile_link() {
        let db = MemoryDatabase::new();
        let mut tx = db.begin().await.unwrap();

        let saved = tx.save_address(address("1 Main St")).await.unwrap();
        let mut profile = tx.insert_profile(new_profile("alice")).await.unwrap();
        profile.address_id = saved.id;
        tx.save_profile(&profile).await.unwrap();

        let found = tx.find_address(saved.id.unwrap()).await.unwrap().unwrap();
        assert_eq!(found.profile_id, Some(profile.id));
    }

    #[tokio::test]
    async fn test_delete_unlinks_profile() {
        let db = MemoryDatabase::new();
        let mut tx = db.begin().await.unwrap();

        let saved = tx.save_address(address("1 Main St")).await.unwrap();
        let mut profile = tx.insert_profile(new_profile("alice")).await.unwrap();
        profile.address_id = saved.id;
        tx.save_profile(&profile).await.unwrap();

        assert!(tx.delete_address(saved.id.unwrap()).await.unwrap());
        assert!(!tx.delete_address(saved.id.unwrap()).await.unwrap());

        let login = Login::parse("alice").unwrap();
        let profiles = tx.profiles_by_login(&login).await.unwrap();
        assert_eq!(profiles.first().unwrap().address_id, None);
    }

    #[tokio::test]
    async fn test_address_cannot_have_two_owners() {
        let db = MemoryDatabase::new();
        let mut tx = db.begin().await.unwrap();

        let saved = tx.save_address(address("1 Main St")).await.unwrap();
        let mut alice = tx.insert_profile(new_profile("alice")).await.unwrap();
        let mut bob = tx.insert_profile(new_profile("bob")).await.unwrap();

        alice.address_id = saved.id;
        tx.save_profile(&alice).await.unwrap();

        bob.address_id = saved.id;
        let result = tx.save_profile(&bob).await;
        assert!(matches!(result, Err(RepositoryError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_save_with_explicit_id_replaces_and_advances_sequence() {
        let db = MemoryDatabase::new();
        let mut tx = db.begin().await.unwrap();

        let replaced = tx
            .save_address(Address {
                id: Some(AddressId::new(10)),
                ..address("10 Main St")
            })
            .await
            .unwrap();
        let next = tx.save_address(address("11 Main St")).await.unwrap();

        assert_eq!(replaced.id, Some(AddressId::new(10)));
        assert_eq!(next.id, Some(AddressId::new(11)));
    }

    #[tokio::test]
    async fn test_later_commit_overwrites_overlapping_transaction() {
        let db = MemoryDatabase::new();
        let mut first = db.begin().await.unwrap();
        let mut second = db.begin().await.unwrap();

        first.save_address(address("1 Main St")).await.unwrap();
        first.commit().await.unwrap();
        second.insert_profile(new_profile("alice")).await.unwrap();
        second.commit().await.unwrap();

        let mut tx = db.begin().await.unwrap();
        assert!(tx.find_all_addresses().await.unwrap().is_empty());
        let alice = Login::parse("alice").unwrap();
        assert_eq!(tx.profiles_by_login(&alice).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_exhausted_sequence_is_an_error() {
        let db = MemoryDatabase::new();
        let mut tx = db.begin().await.unwrap();

        tx.save_address(Address {
            id: Some(AddressId::new(i64::MAX)),
            ..address("Last St")
        })
        .await
        .unwrap();
        let result = tx.save_address(address("Overflow St")).await;

        assert!(matches!(
            result,
            Err(RepositoryError::SequenceExhausted("address"))
        ));
    }
}
