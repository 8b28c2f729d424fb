//! Request extractors that reject malformed input with [`AppError`].
//!
//! Axum's own `Json` and `Path` rejections answer 422 or 400 with a plain-text
//! body. These wrappers turn the same failures into a 400 problem response
//! carrying the `X-{app}-error` header, like every other rejected request.

use axum::{
    Json,
    extract::{FromRequest, FromRequestParts, Path, Request},
    http::request::Parts,
};
use serde::de::DeserializeOwned;

use dsc_core::AddressId;

use crate::error::{Alert, AppError};
use crate::models::Address;
use crate::services::addresses::ENTITY_NAME;
use crate::state::AppState;

/// Error key sent when a request body or path cannot be decoded.
pub const MALFORMED_ERROR_KEY: &str = "invalid";

/// A type that names the entity a request is about.
pub trait Resource {
    const ENTITY_NAME: &'static str;
}

impl Resource for Address {
    const ENTITY_NAME: &'static str = ENTITY_NAME;
}

impl Resource for AddressId {
    const ENTITY_NAME: &'static str = ENTITY_NAME;
}

/// JSON body extractor.
#[derive(Debug)]
pub struct ValidJson<T>(pub T);

impl<T> FromRequest<AppState> for ValidJson<T>
where
    T: DeserializeOwned + Resource + Send,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| malformed::<T>(state, rejection.body_text()))?;
        Ok(Self(value))
    }
}

/// Path parameter extractor.
#[derive(Debug)]
pub struct ValidPath<T>(pub T);

impl<T> FromRequestParts<AppState> for ValidPath<T>
where
    T: DeserializeOwned + Resource + Send,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| malformed::<T>(state, rejection.body_text()))?;
        Ok(Self(value))
    }
}

fn malformed<T: Resource>(state: &AppState, detail: String) -> AppError {
    tracing::debug!(entity = T::ENTITY_NAME, %detail, "Rejected malformed request");
    AppError::BadRequestAlert(Box::new(Alert {
        app_name: state.config().app_name.clone(),
        title: detail,
        entity_name: T::ENTITY_NAME,
        error_key: MALFORMED_ERROR_KEY,
    }))
}
