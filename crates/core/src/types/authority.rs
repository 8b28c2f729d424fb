//! Granted authorities (roles) of an authenticated caller.

use serde::{Deserialize, Serialize};

/// A role granted to a user account.
///
/// Serialized with the `ROLE_` prefix used by the session layer,
/// e.g. `"ROLE_ADMIN"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Authority {
    /// Full access, including listing every address and deleting addresses.
    #[serde(rename = "ROLE_ADMIN")]
    Admin,
    /// Regular account; sees only addresses linked to its own profile.
    #[serde(rename = "ROLE_USER")]
    User,
    /// Unauthenticated visitor.
    #[serde(rename = "ROLE_ANONYMOUS")]
    Anonymous,
}

impl Authority {
    /// Returns the role name, e.g. `ROLE_ADMIN`.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "ROLE_ADMIN",
            Self::User => "ROLE_USER",
            Self::Anonymous => "ROLE_ANONYMOUS",
        }
    }
}

impl std::fmt::Display for Authority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Authority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ROLE_ADMIN" => Ok(Self::Admin),
            "ROLE_USER" => Ok(Self::User),
            "ROLE_ANONYMOUS" => Ok(Self::Anonymous),
            _ => Err(format!("invalid authority: {s}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_authority_serde_uses_role_names() {
        let json = serde_json::to_string(&Authority::Admin).unwrap();
        assert_eq!(json, "\"ROLE_ADMIN\"");

        let parsed: Authority = serde_json::from_str("\"ROLE_USER\"").unwrap();
        assert_eq!(parsed, Authority::User);
    }

    #[test]
    fn test_authority_from_str_roundtrips_display() {
        for authority in [Authority::Admin, Authority::User, Authority::Anonymous] {
            assert_eq!(authority.to_string().parse::<Authority>().unwrap(), authority);
        }
    }

    #[test]
    fn test_authority_from_str_rejects_unknown() {
        assert!("ROLE_ROOT".parse::<Authority>().is_err());
    }
}
