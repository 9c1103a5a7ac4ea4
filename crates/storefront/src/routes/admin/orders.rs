//! Order management.

use axum::{
    Json,
    extract::{Path, State},
};
use tracing::instrument;

use elegance_core::OrderId;
use elegance_core::order::{Order, OrderStatusUpdate};

use crate::db::{OrderRepository, RepositoryError};
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::state::AppState;

fn not_found() -> AppError {
    AppError::NotFound("Order not found".to_owned())
}

/// All orders, newest first.
#[instrument(skip(state, _admin))]
pub async fn index(
    State(state): State<AppState>,
    _admin: RequireAdmin,
) -> Result<Json<Vec<Order>>> {
    Ok(Json(OrderRepository::new(state.pool()).list_all().await?))
}

#[instrument(skip(state, _admin))]
pub async fn show(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<OrderId>,
) -> Result<Json<Order>> {
    OrderRepository::new(state.pool())
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(not_found)
}

/// Change payment and/or fulfillment status.
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<OrderId>,
    Json(update): Json<OrderStatusUpdate>,
) -> Result<Json<Order>> {
    let order = OrderRepository::new(state.pool())
        .update_status(id, update)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => not_found(),
            other => other.into(),
        })?;

    tracing::info!(
        order_id = %id,
        payment_status = %order.payment_status,
        order_status = %order.fulfillment_status,
        "Order status updated"
    );
    Ok(Json(order))
}
