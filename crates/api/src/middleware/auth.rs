//! Caller resolution.
//!
//! The current caller is whatever the login service stored in the shared
//! session under [`session_keys::CURRENT_USER`]. Handlers receive it through
//! the [`RequireAuth`] extractor.

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;

use crate::error::AppError;
use crate::models::{CurrentUser, session_keys};

/// Extractor that requires an authenticated caller.
///
/// Rejects with 401 Unauthorized when there is no session or no caller in it.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAuth(caller): RequireAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", caller.login)
/// }
/// ```
pub struct RequireAuth(pub CurrentUser);

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Get the session from extensions (set by SessionManagerLayer)
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or_else(|| AppError::Unauthorized("no session".to_owned()))?;

        let caller: CurrentUser = session
            .get(session_keys::CURRENT_USER)
            .await
            .map_err(|e| {
                tracing::warn!("Failed to read session: {e}");
                AppError::Unauthorized("unreadable session".to_owned())
            })?
            .ok_or_else(|| AppError::Unauthorized("authentication required".to_owned()))?;

        Ok(Self(caller))
    }
}

/// Helper to set the current caller in the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::CURRENT_USER, user).await
}
