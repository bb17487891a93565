//! Database migration command.
//!
//! Migrations live in `crates/shopapp/migrations/` and are embedded at
//! compile time.

use super::{CommandError, connect};

/// Apply all pending migrations.
pub async fn run() -> Result<(), CommandError> {
    let pool = connect().await?;

    tracing::info!("Running shop migrations...");
    sqlx::migrate!("../shopapp/migrations").run(&pool).await?;

    tracing::info!("Shop migrations complete!");
    Ok(())
}
