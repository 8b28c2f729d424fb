//! Profile provisioning commands.
//!
//! Addresses can only be created by callers that already own a profile, so
//! operators provision one per login before the account starts using the API.
//!
//! # Usage
//!
//! ```bash
//! dsc-cli profile create --login alice --name "Alice"
//! ```

use secrecy::SecretString;
use thiserror::Error;

use dsc_api::db::{self, Database, PgDatabase, ProfileStore, RepositoryError};
use dsc_api::models::NewProfile;
use dsc_core::{Login, LoginError};

/// Errors that can occur during profile operations.
#[derive(Debug, Error)]
pub enum ProfileError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Login failed validation.
    #[error("Invalid login {login:?}: {source}")]
    InvalidLogin {
        login: String,
        #[source]
        source: LoginError,
    },

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Connection(#[from] sqlx::Error),

    /// Store rejected the profile.
    #[error("Failed to create profile: {0}")]
    Repository(#[from] RepositoryError),
}

/// Read the database URL, preferring `DSC_DATABASE_URL`.
pub fn database_url() -> Option<SecretString> {
    dotenvy::dotenv().ok();

    std::env::var("DSC_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .ok()
        .map(SecretString::from)
}

/// Create a profile for `login`.
///
/// # Returns
///
/// The ID of the created profile.
///
/// # Errors
///
/// Returns an error if the login is invalid or the insert fails.
pub async fn create(login: &str, name: Option<String>) -> Result<i64, ProfileError> {
    let user_login = Login::parse(login).map_err(|source| ProfileError::InvalidLogin {
        login: login.to_owned(),
        source,
    })?;
    let display_name = name.map(|n| n.trim().to_owned()).filter(|n| !n.is_empty());

    let database_url =
        database_url().ok_or(ProfileError::MissingEnvVar("DSC_DATABASE_URL"))?;

    tracing::info!("Connecting to database...");
    let pool = db::create_pool(&database_url).await?;
    let database = PgDatabase::new(pool);

    tracing::info!("Creating profile for {}", user_login);
    let mut tx = database.begin().await?;
    let profile = tx
        .insert_profile(NewProfile {
            user_login,
            display_name,
        })
        .await?;
    tx.commit().await?;

    tracing::info!("Created profile {} for {}", profile.id, profile.user_login);
    Ok(profile.id.as_i64())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_rejects_invalid_login() {
        let result = create("not a login", None).await;
        assert!(matches!(result, Err(ProfileError::InvalidLogin { .. })));
    }
}
