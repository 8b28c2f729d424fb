//! Profile domain types.

use dsc_core::{AddressId, Login, ProfileId};

/// A user's profile (domain type).
///
/// Owns at most one address through `address_id`. The link is set after the
/// address has been stored, never as part of the address insert itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    /// Unique profile ID.
    pub id: ProfileId,
    /// Login of the account this profile belongs to.
    pub user_login: Login,
    /// Optional display name.
    pub display_name: Option<String>,
    /// Address owned by this profile, if any.
    pub address_id: Option<AddressId>,
}

/// Data needed to provision a new profile.
#[derive(Debug, Clone)]
pub struct NewProfile {
    pub user_login: Login,
    pub display_name: Option<String>,
}
