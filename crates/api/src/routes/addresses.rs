//! Address route handlers. Every address belongs to the caller.

use axum::{Json, extract::State, http::StatusCode};

use bazaar_core::AddressId;

use crate::db::AddressRepository;
use crate::error::{AppError, Result};
use crate::middleware::{ApiJson, ApiPath, RequireAuth};
use crate::models::address::{Address, CreateAddressRequest, UpdateAddressRequest};
use crate::state::AppState;

/// GET /user/address
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<Address>>> {
    let addresses = AddressRepository::new(state.pool())
        .list_for_user(user.id)
        .await?;
    Ok(Json(addresses))
}

/// POST /user/address
///
/// Marking the new address primary demotes the previous primary.
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(req): ApiJson<CreateAddressRequest>,
) -> Result<(StatusCode, Json<Address>)> {
    req.validate()?;
    let address = AddressRepository::new(state.pool())
        .create(user.id, &req)
        .await?;

    tracing::info!(user_id = %user.id, address_id = %address.id, "Address created");
    Ok((StatusCode::CREATED, Json(address)))
}

/// PATCH /user/address/{id}
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiPath(id): ApiPath<AddressId>,
    ApiJson(req): ApiJson<UpdateAddressRequest>,
) -> Result<Json<Address>> {
    req.validate()?;
    AddressRepository::new(state.pool())
        .update(id, user.id, &req)
        .await?
        .map(Json)
        .ok_or_else(|| not_found(id))
}

/// DELETE /user/address/{id}
pub async fn delete(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiPath(id): ApiPath<AddressId>,
) -> Result<StatusCode> {
    if AddressRepository::new(state.pool())
        .delete(id, user.id)
        .await?
    {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found(id))
    }
}

fn not_found(id: AddressId) -> AppError {
    AppError::NotFound(format!("address {id} not found"))
}
