//! Cookie-backed login sessions.
//!
//! Session records live in `tower_sessions.session` (created by the
//! migrations). The cookie is `Secure` only when `STOREFRONT_BASE_URL` is
//! https, so plain-http local development keeps working.

use sqlx::PgPool;
use tower_sessions::cookie::{SameSite, time::Duration};
use tower_sessions::{Expiry, SessionManagerLayer, SessionStore};
use tower_sessions_sqlx_store::PostgresStore;

use crate::config::StorefrontConfig;

/// Name of the session cookie sent to the marketing site.
pub const SESSION_COOKIE_NAME: &str = "cwish_sessionid";

/// Sessions idle for two weeks are dropped.
const SESSION_IDLE_DAYS: i64 = 14;

/// Build the session layer for the API router.
#[must_use]
pub fn create_session_layer(
    pool: &PgPool,
    config: &StorefrontConfig,
) -> SessionManagerLayer<PostgresStore> {
    with_cookie_policy(
        SessionManagerLayer::new(PostgresStore::new(pool.clone())),
        config.is_https(),
    )
}

fn with_cookie_policy<S: SessionStore>(
    layer: SessionManagerLayer<S>,
    secure: bool,
) -> SessionManagerLayer<S> {
    layer
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(Duration::days(SESSION_IDLE_DAYS)))
        .with_secure(secure)
        .with_same_site(SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}
