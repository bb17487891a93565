//! Session middleware configuration.
//!
//! Sets up `PostgreSQL`-backed sessions using tower-sessions. Tests build the
//! same layer over `tower_sessions::MemoryStore` via [`session_layer`].

use sqlx::PgPool;
use tower_sessions::{Expiry, SessionManagerLayer, SessionStore};
use tower_sessions_sqlx_store::PostgresStore;

use crate::config::ShopConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "shop_session";

/// Session expiry time in seconds (2 weeks of inactivity).
const SESSION_EXPIRY_SECONDS: i64 = 14 * 24 * 60 * 60;

/// Build the session layer over any store.
#[must_use]
pub fn session_layer<S: SessionStore + Clone>(store: S, secure: bool) -> SessionManagerLayer<S> {
    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(secure)
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}

/// Create the session layer with `PostgreSQL` store.
///
/// The `shop.session` table is created by migration.
///
/// # Errors
///
/// Returns an error if the schema or table name is rejected by the store.
pub fn create_session_layer(
    pool: &PgPool,
    config: &ShopConfig,
) -> Result<SessionManagerLayer<PostgresStore>, String> {
    let store = PostgresStore::new(pool.clone())
        .with_schema_name("shop")
        .map_err(|e| e.to_string())?
        .with_table_name("session")
        .map_err(|e| e.to_string())?;

    Ok(session_layer(store, config.secure_cookies()))
}
