//! Domain models for the address service.

pub mod address;
pub mod profile;
pub mod session;

pub use address::{Address, ValidationError};
pub use profile::{NewProfile, Profile};
pub use session::{CurrentUser, keys as session_keys};
