//! Database access for the shop.
//!
//! # Schema: `shop`
//!
//! ## Tables
//!
//! - `product` - Catalog products (soft-deleted via `archived`)
//! - `order` / `order_product` - Orders and their product sets
//! - `user` - Login accounts (argon2 password hashes)
//! - `group` / `permission` - Authorization, with `group_permission`,
//!   `user_group` and `user_permission` join tables
//! - `session` - tower-sessions storage
//!
//! # Adapters
//!
//! - [`PgProductRepository`] and friends - `PostgreSQL` via `sqlx`
//! - [`MemoryDatabase`] - in-process maps, used by tests and local demos
//!
//! # Migrations
//!
//! Migrations are stored in `crates/shopapp/migrations/` and run via:
//! ```bash
//! cargo run -p shopapp-cli -- migrate
//! ```

pub mod groups;
pub mod memory;
pub mod orders;
pub mod products;
pub mod users;

use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use groups::PgGroupRepository;
pub use memory::MemoryDatabase;
pub use orders::PgOrderRepository;
pub use products::PgProductRepository;
pub use users::PgUserRepository;

use crate::ports::HealthCheck;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique group name, unknown foreign key).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Map unique and foreign-key violations to [`RepositoryError::Conflict`].
    pub(crate) fn from_write(e: sqlx::Error, what: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = e {
            if db_err.is_unique_violation() {
                return Self::Conflict(format!("{what} already exists"));
            }
            if db_err.is_foreign_key_violation() {
                return Self::Conflict(format!("{what} references a missing row"));
            }
        }
        Self::Database(e)
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Readiness probe for the `PostgreSQL` pool.
#[derive(Clone)]
pub struct PgHealthCheck {
    pool: PgPool,
}

impl PgHealthCheck {
    /// Create a new health check over a pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl HealthCheck for PgHealthCheck {
    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
