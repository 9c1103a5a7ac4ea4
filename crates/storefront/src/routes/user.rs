//! Account route handlers: profile, saved addresses and order history.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use tracing::instrument;

use elegance_core::address::{Address, AddressBook, AddressPatch, NewAddress};
use elegance_core::order::Order;
use elegance_core::{AddressId, OrderId};

use crate::db::{OrderRepository, UserRepository};
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::{CurrentUser, Profile, User};
use crate::state::AppState;

/// Body of `PUT /api/user/profile`. Absent fields are unchanged.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateProfile {
    pub name: Option<String>,
    pub phone: Option<String>,
}

/// Query selecting one address.
#[derive(Debug, Deserialize)]
pub struct AddressKey {
    pub id: AddressId,
}

async fn load_user(state: &AppState, current: &CurrentUser) -> Result<User> {
    // A session can outlive its account.
    UserRepository::new(state.pool())
        .get_by_id(current.id)
        .await?
        .ok_or(AppError::Unauthorized)
}

// =============================================================================
// Profile
// =============================================================================

#[instrument(skip(state, current), fields(user_id = %current.id))]
pub async fn profile(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
) -> Result<Json<Profile>> {
    Ok(Json(load_user(&state, &current).await?.into()))
}

#[instrument(skip(state, current, input), fields(user_id = %current.id))]
pub async fn update_profile(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    Json(input): Json<UpdateProfile>,
) -> Result<Json<Profile>> {
    let name = input.name.as_deref().map(str::trim);
    let phone = input.phone.as_deref().map(str::trim);
    if name == Some("") {
        return Err(AppError::BadRequest("name cannot be blank".to_owned()));
    }

    let user = UserRepository::new(state.pool())
        .update_profile(current.id, name, phone)
        .await?;
    Ok(Json(user.into()))
}

// =============================================================================
// Addresses
// =============================================================================

#[instrument(skip(state, current), fields(user_id = %current.id))]
pub async fn addresses(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
) -> Result<Json<AddressBook>> {
    Ok(Json(load_user(&state, &current).await?.addresses))
}

#[instrument(skip(state, current, input), fields(user_id = %current.id))]
pub async fn add_address(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    Json(input): Json<NewAddress>,
) -> Result<(StatusCode, Json<Address>)> {
    let mut book = load_user(&state, &current).await?.addresses;
    let address = book.add(input)?;
    UserRepository::new(state.pool())
        .save_addresses(current.id, &book)
        .await?;
    Ok((StatusCode::CREATED, Json(address)))
}

#[instrument(skip(state, current, patch), fields(user_id = %current.id, address_id = %key.id))]
pub async fn update_address(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    Query(key): Query<AddressKey>,
    Json(patch): Json<AddressPatch>,
) -> Result<Json<Address>> {
    let mut book = load_user(&state, &current).await?.addresses;
    let address = book.update(key.id, patch)?;
    UserRepository::new(state.pool())
        .save_addresses(current.id, &book)
        .await?;
    Ok(Json(address))
}

#[instrument(skip(state, current), fields(user_id = %current.id, address_id = %key.id))]
pub async fn delete_address(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    Query(key): Query<AddressKey>,
) -> Result<Json<AddressBook>> {
    let mut book = load_user(&state, &current).await?.addresses;
    book.remove(key.id)?;
    UserRepository::new(state.pool())
        .save_addresses(current.id, &book)
        .await?;
    Ok(Json(book))
}

// =============================================================================
// Orders
// =============================================================================

#[instrument(skip(state, current), fields(user_id = %current.id))]
pub async fn orders(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
) -> Result<Json<Vec<Order>>> {
    let orders = OrderRepository::new(state.pool())
        .list_for_user(current.id)
        .await?;
    Ok(Json(orders))
}

/// One of the user's orders. Other users' orders are reported as missing.
#[instrument(skip(state, current), fields(user_id = %current.id))]
pub async fn order(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    Path(id): Path<OrderId>,
) -> Result<Json<Order>> {
    OrderRepository::new(state.pool())
        .get_for_user(id, current.id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Order not found".to_owned()))
}
