//! Unified error handling for the HTTP layer.

use axum::{
    Json,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::alert;
use crate::db::RepositoryError;
use crate::services::AddressError;

/// A rejected request that the client UI should surface as an alert.
#[derive(Debug)]
pub struct Alert {
    /// Application name used to build the `X-{app}-*` headers.
    pub app_name: String,
    /// Human-readable title.
    pub title: String,
    /// Entity the request was about.
    pub entity_name: &'static str,
    /// Machine-readable error key, e.g. `idexists`.
    pub error_key: &'static str,
}

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Client sent a request that violates an entity precondition.
    #[error("Bad request: {}", .0.title)]
    BadRequestAlert(Box<Alert>),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// User lacks permission.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Map an address operation failure to its HTTP form.
    #[must_use]
    pub fn from_address_error(err: AddressError, app_name: &str) -> Self {
        if let Some(error_key) = err.error_key() {
            return Self::BadRequestAlert(Box::new(Alert {
                app_name: app_name.to_owned(),
                title: err.to_string(),
                entity_name: crate::services::addresses::ENTITY_NAME,
                error_key,
            }));
        }

        let message = err.to_string();
        match err {
            AddressError::NotFound(id) => Self::NotFound(format!("address {id}")),
            AddressError::Forbidden => Self::Forbidden(message),
            AddressError::Repository(e) => Self::Database(e),
            _ => Self::Internal(message),
        }
    }

    const fn status(&self) -> StatusCode {
        match self {
            Self::BadRequestAlert(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Problem body returned with every error response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Problem {
    title: String,
    status: u16,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    entity_name: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_key: Option<&'static str>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Log server errors with Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let (headers, problem) = match &self {
            Self::BadRequestAlert(alert) => (
                alert::failure_alert(&alert.app_name, alert.entity_name, alert.error_key),
                Problem {
                    title: alert.title.clone(),
                    status: status.as_u16(),
                    message: format!("error.{}", alert.error_key),
                    entity_name: Some(alert.entity_name),
                    error_key: Some(alert.error_key),
                },
            ),
            // Don't expose internal error details to clients
            Self::Database(_) | Self::Internal(_) => (
                HeaderMap::new(),
                Problem {
                    title: "Internal server error".to_owned(),
                    status: status.as_u16(),
                    message: "error.http.500".to_owned(),
                    entity_name: None,
                    error_key: None,
                },
            ),
            _ => (
                HeaderMap::new(),
                Problem {
                    title: self.to_string(),
                    status: status.as_u16(),
                    message: format!("error.http.{}", status.as_u16()),
                    entity_name: None,
                    error_key: None,
                },
            ),
        };

        (status, headers, Json(problem)).into_response()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use dsc_core::{AddressId, Login};

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("address 123".to_string());
        assert_eq!(err.to_string(), "Not found: address 123");

        let err = AppError::Forbidden("nope".to_string());
        assert_eq!(err.to_string(), "Forbidden: nope");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Unauthorized("test".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::Forbidden("test".to_string())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_address_error_mapping() {
        let bad = AppError::from_address_error(AddressError::IdExists, "dsc");
        assert_eq!(get_status(bad), StatusCode::BAD_REQUEST);

        let missing = AppError::from_address_error(AddressError::NotFound(AddressId::new(1)), "dsc");
        assert_eq!(get_status(missing), StatusCode::NOT_FOUND);

        let forbidden = AppError::from_address_error(AddressError::Forbidden, "dsc");
        assert_eq!(get_status(forbidden), StatusCode::FORBIDDEN);

        let no_profile = AppError::from_address_error(
            AddressError::ProfileNotFound(Login::parse("ghost").unwrap()),
            "dsc",
        );
        assert_eq!(get_status(no_profile), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_bad_request_alert_body_and_headers() {
        let response =
            AppError::from_address_error(AddressError::IdExists, "dsc").into_response();

        assert_eq!(
            response
                .headers()
                .get("x-dsc-error")
                .and_then(|v| v.to_str().ok()),
            Some("error.idexists")
        );

        let body = body_json(response).await;
        assert_eq!(body["status"], 400);
        assert_eq!(body["entityName"], "address");
        assert_eq!(body["errorKey"], "idexists");
        assert_eq!(body["message"], "error.idexists");
        assert_eq!(body["title"], "A new address cannot already have an ID");
    }

    #[tokio::test]
    async fn test_internal_error_hides_details() {
        let response = AppError::Internal("connection string leaked".to_string()).into_response();
        let body = body_json(response).await;

        assert_eq!(body["title"], "Internal server error");
        assert!(!body.to_string().contains("leaked"));
    }
}
