//! Dashboard statistics.

use axum::{Json, extract::State};
use tracing::instrument;

use elegance_core::stats::{DashboardStats, dashboard_stats};

use crate::db::{OrderRepository, ProductRepository, UserRepository};
use crate::error::Result;
use crate::middleware::RequireAdmin;
use crate::state::AppState;

#[instrument(skip(state, _admin))]
pub async fn dashboard(
    State(state): State<AppState>,
    _admin: RequireAdmin,
) -> Result<Json<DashboardStats>> {
    let pool = state.pool();
    let product_repo = ProductRepository::new(pool);
    let order_repo = OrderRepository::new(pool);
    let user_repo = UserRepository::new(pool);
    let (products, orders, users) = tokio::try_join!(
        product_repo.list_all(),
        order_repo.list_all(),
        user_repo.count(),
    )?;

    let total_users = u64::try_from(users).unwrap_or_default();
    Ok(Json(dashboard_stats(&products, &orders, total_users)))
}
