//! CLI command implementations.

pub mod group;
pub mod migrate;
pub mod seed;
pub mod user;

use secrecy::SecretString;
use sqlx::PgPool;
use thiserror::Error;

use shopapp::db::{self, RepositoryError};
use shopapp::services::AuthError;
use shopapp_core::{PermissionCodeError, UsernameError};

/// Errors shared by the CLI commands.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration failed.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Store operation failed.
    #[error("{0}")]
    Repository(#[from] RepositoryError),

    /// Account operation failed.
    #[error("{0}")]
    Auth(#[from] AuthError),

    /// Malformed username argument.
    #[error("Invalid username: {0}")]
    InvalidUsername(#[from] UsernameError),

    /// Malformed permission argument.
    #[error("Invalid permission code: {0}")]
    InvalidPermission(#[from] PermissionCodeError),

    /// Argument rejected before touching the store.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Named user or group does not exist.
    #[error("{0} not found")]
    NotFound(String),
}

/// Connect to the shop database named by `SHOP_DATABASE_URL` or `DATABASE_URL`.
pub async fn connect() -> Result<PgPool, CommandError> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("SHOP_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| CommandError::MissingEnvVar("SHOP_DATABASE_URL"))?;

    tracing::info!("Connecting to shop database...");
    Ok(db::create_pool(&database_url).await?)
}
