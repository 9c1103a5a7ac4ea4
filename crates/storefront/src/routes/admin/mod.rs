//! Admin API route handlers.
//!
//! Every handler takes [`RequireAdmin`](crate::middleware::RequireAdmin), so
//! anonymous callers get `401` and non-admins get `403`.

pub mod orders;
pub mod products;
pub mod stats;

use axum::{Router, routing::get};

use crate::state::AppState;

/// Create the admin routes router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(products::index).post(products::create))
        .route(
            "/products/{id}",
            get(products::show)
                .put(products::update)
                .delete(products::delete),
        )
        .route("/orders", get(orders::index))
        .route("/orders/{id}", get(orders::show).put(orders::update))
        .route("/stats", get(stats::dashboard))
}
