//! Wishlist route handlers.

use axum::{
    Json,
    extract::{Query, State},
};
use chrono::Utc;
use serde::Deserialize;
use tracing::instrument;

use elegance_core::ProductId;
use elegance_core::wishlist::Wishlist;

use crate::db::{ProductRepository, RepositoryError, WishlistRepository};
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::state::AppState;

/// Body of `POST /api/wishlist` and query of `DELETE /api/wishlist`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WishlistProduct {
    pub product_id: ProductId,
}

/// Show the wishlist, creating an empty one on first visit.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Wishlist>> {
    let wishlist = WishlistRepository::new(state.pool())
        .get_or_create(user.id)
        .await?;
    Ok(Json(wishlist))
}

/// Save a product.
#[instrument(skip(state, user, input), fields(user_id = %user.id, product_id = %input.product_id))]
pub async fn add(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(input): Json<WishlistProduct>,
) -> Result<Json<Wishlist>> {
    let product = ProductRepository::new(state.pool())
        .get(input.product_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".to_owned()))?;

    let wishlists = WishlistRepository::new(state.pool());
    wishlists.get_or_create(user.id).await?;
    let wishlist = wishlists
        .modify(user.id, |wishlist| {
            wishlist.add(&product, Utc::now()).map_err(AppError::from)
        })
        .await?;

    Ok(Json(wishlist))
}

/// Drop a product. Dropping a product that isn't saved succeeds.
#[instrument(skip(state, user, input), fields(user_id = %user.id, product_id = %input.product_id))]
pub async fn remove(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Query(input): Query<WishlistProduct>,
) -> Result<Json<Wishlist>> {
    let wishlist = WishlistRepository::new(state.pool())
        .modify(user.id, |wishlist| {
            wishlist.remove(input.product_id, Utc::now());
            Ok::<_, AppError>(())
        })
        .await
        .map_err(|e| match e {
            AppError::Database(RepositoryError::NotFound) => {
                AppError::NotFound("Wishlist not found".to_owned())
            }
            other => other,
        })?;

    Ok(Json(wishlist))
}
