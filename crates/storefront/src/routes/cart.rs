//! Cart route handlers.
//!
//! Every handler works on the logged-in user's cart. Mutations load the
//! current product so stock limits are checked against live counts, then
//! change the cart under its row lock.

use axum::{
    Json,
    extract::{Query, State},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use elegance_core::cart::{Cart, CartError};
use elegance_core::{Amount, ProductId};

use crate::db::{CartRepository, ProductRepository, RepositoryError};
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::state::AppState;

/// Cart with derived totals.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    #[serde(flatten)]
    pub cart: Cart,
    pub subtotal: Amount,
    pub item_count: u64,
}

impl From<Cart> for CartView {
    fn from(cart: Cart) -> Self {
        Self {
            subtotal: cart.subtotal(),
            item_count: cart.item_count(),
            cart,
        }
    }
}

/// Body of `POST /api/cart`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCart {
    pub product_id: ProductId,
    pub size: String,
    #[serde(default = "one")]
    pub quantity: i64,
}

const fn one() -> i64 {
    1
}

/// Body of `PUT /api/cart`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCartLine {
    pub product_id: ProductId,
    pub size: String,
    pub quantity: i64,
}

/// Query of `DELETE /api/cart`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineKey {
    pub product_id: ProductId,
    pub size: String,
}

fn cart_not_found(err: AppError) -> AppError {
    match err {
        AppError::Database(RepositoryError::NotFound) => {
            AppError::NotFound("Cart not found".to_owned())
        }
        other => other,
    }
}

/// Show the cart, creating an empty one on first visit.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<CartView>> {
    let cart = CartRepository::new(state.pool())
        .get_or_create(user.id)
        .await?;
    Ok(Json(cart.into()))
}

/// Add units of a product size, merging with an existing line.
#[instrument(skip(state, user, input), fields(user_id = %user.id, product_id = %input.product_id))]
pub async fn add(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(input): Json<AddToCart>,
) -> Result<Json<CartView>> {
    if input.quantity < 1 {
        return Err(CartError::InvalidQuantity.into());
    }
    let product = ProductRepository::new(state.pool())
        .get(input.product_id)
        .await?
        .ok_or(CartError::ProductNotFound)?;

    let carts = CartRepository::new(state.pool());
    carts.get_or_create(user.id).await?;
    let cart = carts
        .modify(user.id, |cart| {
            cart.add(&product, input.size.trim(), input.quantity, Utc::now())
                .map_err(AppError::from)
        })
        .await?;

    tracing::info!(size = %input.size, quantity = input.quantity, "Added to cart");
    Ok(Json(cart.into()))
}

/// Set the quantity of a line. Zero or less removes it.
#[instrument(skip(state, user, input), fields(user_id = %user.id, product_id = %input.product_id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(input): Json<UpdateCartLine>,
) -> Result<Json<CartView>> {
    let product = if input.quantity > 0 {
        ProductRepository::new(state.pool())
            .get(input.product_id)
            .await?
    } else {
        None
    };

    let cart = CartRepository::new(state.pool())
        .modify(user.id, |cart| {
            cart.set_quantity(
                input.product_id,
                input.size.trim(),
                input.quantity,
                product.as_ref(),
                Utc::now(),
            )
            .map_err(AppError::from)
        })
        .await
        .map_err(cart_not_found)?;

    Ok(Json(cart.into()))
}

/// Remove a line.
#[instrument(skip(state, user, key), fields(user_id = %user.id, product_id = %key.product_id))]
pub async fn remove(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Query(key): Query<CartLineKey>,
) -> Result<Json<CartView>> {
    let cart = CartRepository::new(state.pool())
        .modify(user.id, |cart| {
            cart.remove(key.product_id, key.size.trim(), Utc::now())
                .map_err(AppError::from)
        })
        .await
        .map_err(cart_not_found)?;

    Ok(Json(cart.into()))
}
