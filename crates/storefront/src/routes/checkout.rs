//! Checkout route handler.

use axum::{Json, extract::State, http::StatusCode};
use tracing::instrument;

use elegance_core::checkout::CheckoutRequest;
use elegance_core::order::Order;

use crate::db::CheckoutRepository;
use crate::error::{Result, add_breadcrumb};
use crate::middleware::RequireAuth;
use crate::state::AppState;

/// Turn the user's cart into an order.
///
/// Responds `201 Created` with the order. On any failure the cart, stock and
/// orders are left untouched.
#[instrument(skip(state, user, request), fields(user_id = %user.id))]
pub async fn checkout(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(request): Json<CheckoutRequest>,
) -> Result<(StatusCode, Json<Order>)> {
    let (shipping_address, payment_method) = request.validate()?;

    let order = CheckoutRepository::new(state.pool())
        .place_order(
            user.id,
            shipping_address,
            payment_method,
            &state.config().pricing,
        )
        .await?;

    let order_id = order.order_id.to_string();
    add_breadcrumb("checkout", "Order placed", Some(&[("order_id", order_id.as_str())]));

    Ok((StatusCode::CREATED, Json(order)))
}
