//! Seed the catalog with the starter products.

use shopapp::ports::Repositories;
use shopapp::seed::seed_products;

use super::{CommandError, connect};

/// Get or create the starter products. Running this twice is harmless.
pub async fn products() -> Result<(), CommandError> {
    let pool = connect().await?;
    let repos = Repositories::postgres(&pool);

    let products = seed_products(repos.products.as_ref()).await?;
    tracing::info!(count = products.len(), "Seed complete");
    Ok(())
}
