//! Business operations sitting between route handlers and the stores.

pub mod addresses;

pub use addresses::{AddressError, AddressService};
