//! Address REST handlers.

use axum::{
    Json, Router,
    extract::{Query, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    routing::get,
};
use serde::Deserialize;
use tracing::instrument;

use dsc_core::AddressId;

use crate::{
    alert::{self, EntityEvent},
    error::AppError,
    extract::{ValidJson, ValidPath},
    middleware::auth::RequireAuth,
    models::Address,
    services::{AddressError, AddressService, addresses::ENTITY_NAME},
    state::AppState,
};

/// Build the addresses router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/api/addresses",
            get(list_addresses).post(create_address).put(update_address),
        )
        .route(
            "/api/addresses/{id}",
            get(get_address).delete(delete_address),
        )
}

/// Query parameters for listing addresses.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub filter: Option<String>,
}

fn map_err(state: &AppState) -> impl FnOnce(AddressError) -> AppError + '_ {
    move |e| AppError::from_address_error(e, &state.config().app_name)
}

/// `POST /api/addresses`: create an address and link it to the caller's profile.
///
/// Responds 201 with a `Location` header, or 400 if the address already has an id.
///
/// # Errors
///
/// Returns an error if validation fails, the caller has no profile, or the
/// store fails.
#[instrument(skip(caller, state, address), fields(login = %caller.login))]
pub async fn create_address(
    RequireAuth(caller): RequireAuth,
    State(state): State<AppState>,
    ValidJson(address): ValidJson<Address>,
) -> Result<(StatusCode, HeaderMap, Json<Address>), AppError> {
    tracing::debug!(?address, "REST request to save Address");

    let saved = AddressService::new(state.database())
        .create(&caller, address)
        .await
        .map_err(map_err(&state))?;

    let id = saved
        .id
        .ok_or_else(|| AppError::Internal("created address has no id".to_owned()))?;
    let mut headers = alert::entity_alert(
        &state.config().app_name,
        EntityEvent::Created,
        ENTITY_NAME,
        &id.to_string(),
    );
    let location = HeaderValue::try_from(format!("/api/addresses/{id}"))
        .map_err(|e| AppError::Internal(format!("invalid location header: {e}")))?;
    headers.insert(header::LOCATION, location);

    Ok((StatusCode::CREATED, headers, Json(saved)))
}

/// `PUT /api/addresses`: replace an existing address.
///
/// # Errors
///
/// Returns an error if validation fails, the id is missing, or the store fails.
#[instrument(skip(_caller, state, address))]
pub async fn update_address(
    RequireAuth(_caller): RequireAuth,
    State(state): State<AppState>,
    ValidJson(address): ValidJson<Address>,
) -> Result<(HeaderMap, Json<Address>), AppError> {
    tracing::debug!(?address, "REST request to update Address");

    let saved = AddressService::new(state.database())
        .update(address)
        .await
        .map_err(map_err(&state))?;

    let param = saved.id.map(|id| id.to_string()).unwrap_or_default();
    let headers = alert::entity_alert(
        &state.config().app_name,
        EntityEvent::Updated,
        ENTITY_NAME,
        &param,
    );

    Ok((headers, Json(saved)))
}

/// `GET /api/addresses`: list addresses visible to the caller.
///
/// # Errors
///
/// Returns an error if the store fails.
#[instrument(skip(caller, state), fields(login = %caller.login))]
pub async fn list_addresses(
    RequireAuth(caller): RequireAuth,
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Address>>, AppError> {
    tracing::debug!(filter = ?query.filter, "REST request to get all Addresses");

    let addresses = AddressService::new(state.database())
        .list(&caller, query.filter.as_deref())
        .await
        .map_err(map_err(&state))?;

    Ok(Json(addresses))
}

/// `GET /api/addresses/{id}`: get one address.
///
/// # Errors
///
/// Returns 404 if the address does not exist, or an error if the store fails.
#[instrument(skip(_caller, state))]
pub async fn get_address(
    RequireAuth(_caller): RequireAuth,
    State(state): State<AppState>,
    ValidPath(id): ValidPath<AddressId>,
) -> Result<Json<Address>, AppError> {
    tracing::debug!(%id, "REST request to get Address");

    let address = AddressService::new(state.database())
        .get(id)
        .await
        .map_err(map_err(&state))?;

    Ok(Json(address))
}

/// `DELETE /api/addresses/{id}`: delete an address (administrators only).
///
/// # Errors
///
/// Returns 403 for non-administrators, or an error if the store fails.
#[instrument(skip(caller, state), fields(login = %caller.login))]
pub async fn delete_address(
    RequireAuth(caller): RequireAuth,
    State(state): State<AppState>,
    ValidPath(id): ValidPath<AddressId>,
) -> Result<(StatusCode, HeaderMap), AppError> {
    tracing::debug!(%id, "REST request to delete Address");

    AddressService::new(state.database())
        .delete(&caller, id)
        .await
        .map_err(map_err(&state))?;

    let headers = alert::entity_alert(
        &state.config().app_name,
        EntityEvent::Deleted,
        ENTITY_NAME,
        &id.to_string(),
    );

    Ok((StatusCode::NO_CONTENT, headers))
}
