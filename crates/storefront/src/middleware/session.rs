//! Session middleware configuration.
//!
//! Sessions are stored in `tower_sessions.session` using tower-sessions.

use sqlx::PgPool;
use tower_sessions::cookie::{SameSite, time::Duration};
use tower_sessions::{Expiry, SessionManagerLayer};
use tower_sessions_sqlx_store::PostgresStore;

use crate::config::StorefrontConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "elegance_session";

/// Sessions expire after 7 days without activity.
const SESSION_IDLE_DAYS: i64 = 7;

/// Create the session layer with `PostgreSQL` store.
///
/// The cookie is `HttpOnly`, `SameSite=Lax`, and `Secure` when the public
/// base URL is https.
#[must_use]
pub fn create_session_layer(
    pool: &PgPool,
    config: &StorefrontConfig,
) -> SessionManagerLayer<PostgresStore> {
    let store = PostgresStore::new(pool.clone());

    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(Duration::days(SESSION_IDLE_DAYS)))
        .with_secure(config.is_secure())
        .with_same_site(SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}
