//! User login identifier.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Login`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum LoginError {
    /// The input string is empty.
    #[error("login cannot be empty")]
    Empty,
    /// The input string is too long.
    #[error("login must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The input contains a character outside the allowed set.
    #[error("login contains invalid character {0:?}")]
    InvalidCharacter(char),
}

/// The login identifier of an authenticated user.
///
/// Logins are what the session layer records for the current caller and
/// what profiles are keyed by.
///
/// ## Constraints
///
/// - Length: 1-50 characters
/// - Allowed characters: ASCII letters, digits, and `_ . @ -`
/// - Stored lowercase
///
/// ## Examples
///
/// ```
/// use dsc_core::Login;
///
/// assert_eq!(Login::parse("Alice").unwrap().as_str(), "alice");
/// assert!(Login::parse("").is_err());
/// assert!(Login::parse("bob smith").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct Login(String);

impl Login {
    /// Maximum length of a login.
    pub const MAX_LENGTH: usize = 50;

    /// Parse a `Login` from a string, normalizing it to lowercase.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, longer than 50 characters,
    /// or contains a character other than ASCII alphanumerics and `_ . @ -`.
    pub fn parse(s: &str) -> Result<Self, LoginError> {
        if s.is_empty() {
            return Err(LoginError::Empty);
        }

        if s.chars().count() > Self::MAX_LENGTH {
            return Err(LoginError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        if let Some(c) = s
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '@' | '-')))
        {
            return Err(LoginError::InvalidCharacter(c));
        }

        Ok(Self(s.to_ascii_lowercase()))
    }

    /// Returns the login as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `Login` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Login {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Login {
    type Err = LoginError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Login {
    type Error = LoginError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Login> for String {
    fn from(login: Login) -> Self {
        login.0
    }
}

impl AsRef<str> for Login {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_logins() {
        assert!(Login::parse("admin").is_ok());
        assert!(Login::parse("user_1").is_ok());
        assert!(Login::parse("jane.doe@example.com").is_ok());
        assert!(Login::parse("a-b").is_ok());
    }

    #[test]
    fn test_parse_lowercases() {
        assert_eq!(Login::parse("JaneDoe").unwrap().as_str(), "janedoe");
    }

    #[test]
    fn test_parse_empty() {
        assert_eq!(Login::parse(""), Err(LoginError::Empty));
    }

    #[test]
    fn test_parse_too_long() {
        let long = "a".repeat(51);
        assert!(matches!(
            Login::parse(&long),
            Err(LoginError::TooLong { max: 50 })
        ));
        assert!(Login::parse(&"a".repeat(50)).is_ok());
    }

    #[test]
    fn test_parse_invalid_character() {
        assert_eq!(
            Login::parse("bob smith"),
            Err(LoginError::InvalidCharacter(' '))
        );
    }

    #[test]
    fn test_deserialize_validates() {
        let login: Login = serde_json::from_str("\"User\"").unwrap();
        assert_eq!(login.as_str(), "user");
        assert!(serde_json::from_str::<Login>("\"not valid\"").is_err());
    }
}
