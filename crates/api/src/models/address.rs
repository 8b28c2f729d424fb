//! Address domain types.

use serde::{Deserialize, Serialize};

use dsc_core::{AddressId, ProfileId};

/// Maximum length of any address text field.
pub const MAX_FIELD_LENGTH: usize = 255;

/// Field-level validation failures for an [`Address`] payload.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// A required field is missing or only whitespace.
    #[error("{field} must not be blank")]
    Blank {
        /// JSON name of the offending field.
        field: &'static str,
    },
    /// A field exceeds the column width.
    #[error("{field} must be at most {max} characters")]
    TooLong {
        /// JSON name of the offending field.
        field: &'static str,
        /// Maximum allowed length.
        max: usize,
    },
}

/// A postal address.
///
/// `id` is assigned by the store on creation and is absent before that.
/// `profile_id` is derived from the owning profile: it is reported on output
/// and ignored on input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub id: Option<AddressId>,
    #[serde(default)]
    pub street_address: String,
    pub postal_code: Option<String>,
    #[serde(default)]
    pub city: String,
    pub state_province: Option<String>,
    pub country: Option<String>,
    #[serde(default, skip_deserializing)]
    pub profile_id: Option<ProfileId>,
}

impl Address {
    /// Check the field-level constraints.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::Blank` if `streetAddress` or `city` is blank,
    /// or `ValidationError::TooLong` if any field exceeds 255 characters.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_present("streetAddress", &self.street_address)?;
        require_present("city", &self.city)?;

        let optional = [
            ("postalCode", self.postal_code.as_deref()),
            ("stateProvince", self.state_province.as_deref()),
            ("country", self.country.as_deref()),
        ];
        for (field, value) in optional {
            if let Some(value) = value {
                check_length(field, value)?;
            }
        }

        Ok(())
    }

    /// Returns a copy with the identity and profile link cleared.
    #[must_use]
    pub fn without_identity(&self) -> Self {
        Self {
            id: None,
            profile_id: None,
            ..self.clone()
        }
    }
}

fn require_present(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Blank { field });
    }
    check_length(field, value)
}

fn check_length(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.chars().count() > MAX_FIELD_LENGTH {
        return Err(ValidationError::TooLong {
            field,
            max: MAX_FIELD_LENGTH,
        });
    }
    Ok(())
}
