//! Catalog management.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde_json::{Value, json};
use tracing::instrument;

use elegance_core::ProductId;
use elegance_core::catalog::{NewProduct, Product, ProductPatch};

use crate::db::products::UpdateProductError;
use crate::db::{ProductRepository, RepositoryError};
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::state::AppState;

fn not_found() -> AppError {
    AppError::NotFound("Product not found".to_owned())
}

/// All products sorted by name.
#[instrument(skip(state, _admin))]
pub async fn index(
    State(state): State<AppState>,
    _admin: RequireAdmin,
) -> Result<Json<Vec<Product>>> {
    Ok(Json(ProductRepository::new(state.pool()).list_all().await?))
}

#[instrument(skip(state, admin, input), fields(admin_id = %admin.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(input): Json<NewProduct>,
) -> Result<(StatusCode, Json<Product>)> {
    let product = input.into_product()?;
    ProductRepository::new(state.pool()).create(&product).await?;

    tracing::info!(product_id = %product.product_id, name = %product.name, "Product created");
    Ok((StatusCode::CREATED, Json(product)))
}

#[instrument(skip(state, _admin))]
pub async fn show(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<ProductId>,
) -> Result<Json<Product>> {
    ProductRepository::new(state.pool())
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(not_found)
}

/// Merge the provided fields into a product.
#[instrument(skip(state, admin, patch), fields(admin_id = %admin.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<ProductId>,
    Json(patch): Json<ProductPatch>,
) -> Result<Json<Product>> {
    let product = ProductRepository::new(state.pool())
        .update(id, patch)
        .await
        .map_err(|e| match e {
            UpdateProductError::Repository(RepositoryError::NotFound) => not_found(),
            other => other.into(),
        })?;

    tracing::info!(product_id = %id, "Product updated");
    Ok(Json(product))
}

#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<ProductId>,
) -> Result<Json<Value>> {
    if !ProductRepository::new(state.pool()).delete(id).await? {
        return Err(not_found());
    }

    tracing::info!(product_id = %id, "Product deleted");
    Ok(Json(json!({ "message": "Product deleted" })))
}
