//! Session-related types.
//!
//! Types stored in the session for authentication state. The login flow
//! that writes them lives outside this service; handlers only read them.

use serde::{Deserialize, Serialize};

use dsc_core::{Authority, Login};

/// Session-stored caller identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    /// Login of the authenticated user.
    pub login: Login,
    /// Authorities granted to the user.
    #[serde(default)]
    pub authorities: Vec<Authority>,
}

impl CurrentUser {
    /// Create a caller with the given login and authorities.
    #[must_use]
    pub const fn new(login: Login, authorities: Vec<Authority>) -> Self {
        Self { login, authorities }
    }

    /// Whether the caller holds the given authority.
    #[must_use]
    pub fn has_authority(&self, authority: Authority) -> bool {
        self.authorities.contains(&authority)
    }

    /// Whether the caller is an administrator.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.has_authority(Authority::Admin)
    }
}

/// Session keys for authentication data.
pub mod keys {
    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_is_admin() {
        let admin = CurrentUser::new(
            Login::parse("admin").unwrap(),
            vec![Authority::User, Authority::Admin],
        );
        let user = CurrentUser::new(Login::parse("user").unwrap(), vec![Authority::User]);

        assert!(admin.is_admin());
        assert!(!user.is_admin());
        assert!(user.has_authority(Authority::User));
    }

    #[test]
    fn test_session_payload_shape() {
        let json = r#"{"login":"Jane","authorities":["ROLE_USER"]}"#;
        let user: CurrentUser = serde_json::from_str(json).unwrap();

        assert_eq!(user.login.as_str(), "jane");
        assert_eq!(user.authorities, vec![Authority::User]);
    }
}
