//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Readiness check (database)
//!
//! # Catalog
//! GET  /api/products           - List (?category=&limit=)
//! GET  /api/products/{id}      - Detail
//!
//! # Cart and wishlist (requires auth)
//! GET|POST|PUT|DELETE /api/cart
//! GET|POST|DELETE     /api/wishlist
//! POST /api/checkout
//!
//! # Auth (strict rate limit)
//! POST /api/auth/otp           - Issue login passcode
//! PUT  /api/auth/otp           - Verify passcode
//! POST /api/auth/signup        - Issue signup passcode
//! PUT  /api/auth/signup        - Set password, log in
//! POST /api/auth/login         - Log in with password or passcode
//! POST /api/auth/logout        - End session
//!
//! # Account (requires auth)
//! GET|PUT                 /api/user/profile
//! GET|POST|PUT|DELETE     /api/user/addresses
//! GET  /api/user/orders, /api/user/orders/{id}
//!
//! # Admin (requires admin role)
//! GET|POST                /api/admin/products
//! GET|PUT|DELETE          /api/admin/products/{id}
//! GET                     /api/admin/orders
//! GET|PUT                 /api/admin/orders/{id}
//! GET                     /api/admin/stats
//! ```

pub mod admin;
pub mod auth;
pub mod cart;
pub mod checkout;
pub mod products;
pub mod user;
pub mod wishlist;

use axum::{
    Router,
    routing::{get, post},
};

use crate::middleware::{api_rate_limiter, auth_rate_limiter};
use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/otp", post(auth::request_otp).put(auth::verify_otp))
        .route(
            "/signup",
            post(auth::request_signup).put(auth::complete_signup),
        )
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
}

/// Create the catalog routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{id}", get(products::show))
}

/// Create the account routes router.
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/profile", get(user::profile).put(user::update_profile))
        .route(
            "/addresses",
            get(user::addresses)
                .post(user::add_address)
                .put(user::update_address)
                .delete(user::delete_address),
        )
        .route("/orders", get(user::orders))
        .route("/orders/{id}", get(user::order))
}

/// Create the shopping and admin routes (everything under `/api` except auth).
pub fn shop_routes() -> Router<AppState> {
    Router::new()
        .nest("/products", product_routes())
        .route(
            "/cart",
            get(cart::show)
                .post(cart::add)
                .put(cart::update)
                .delete(cart::remove),
        )
        .route(
            "/wishlist",
            get(wishlist::show)
                .post(wishlist::add)
                .delete(wishlist::remove),
        )
        .route("/checkout", post(checkout::checkout))
        .nest("/user", user_routes())
        .nest("/admin", admin::routes())
}

/// Create all API routes, each group behind its rate limiter.
pub fn routes() -> Router<AppState> {
    let api = Router::new()
        .nest("/auth", auth_routes().layer(auth_rate_limiter()))
        .merge(shop_routes().layer(api_rate_limiter()));

    Router::new().nest("/api", api)
}
