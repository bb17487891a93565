//! Catalog seeding.
//!
//! Idempotent: products are looked up by name and only inserted when missing,
//! so running the seed repeatedly never duplicates rows.

use tracing::instrument;

use crate::db::RepositoryError;
use crate::models::Product;
use crate::ports::ProductRepository;

/// Products every fresh catalog starts with.
pub const SEED_PRODUCT_NAMES: [&str; 3] = ["Laptop", "Desktop", "Smartphone"];

/// Get or create each seed product.
///
/// Returns the products in seed order, whether they were inserted now or
/// already existed.
///
/// # Errors
///
/// Returns `RepositoryError` if the store fails.
#[instrument(skip_all)]
pub async fn seed_products(repo: &dyn ProductRepository) -> Result<Vec<Product>, RepositoryError> {
    tracing::info!("Create products");

    let mut products = Vec::with_capacity(SEED_PRODUCT_NAMES.len());
    for name in SEED_PRODUCT_NAMES {
        let (product, created) = repo.get_or_create_by_name(name).await?;
        tracing::info!(product_id = %product.id, created, "Created product {}", product.name);
        products.push(product);
    }

    tracing::info!("Products created");
    Ok(products)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::db::MemoryDatabase;
    use crate::models::ProductScope;

    #[tokio::test]
    async fn test_seed_creates_named_products() {
        let db = Arc::new(MemoryDatabase::new());

        let seeded = seed_products(db.as_ref()).await.unwrap();

        let names: Vec<_> = seeded.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, SEED_PRODUCT_NAMES);
        assert!(seeded.iter().all(|p| !p.archived));
    }

    #[tokio::test]
    async fn test_seed_twice_does_not_duplicate() {
        let db = Arc::new(MemoryDatabase::new());

        let first = seed_products(db.as_ref()).await.unwrap();
        let second = seed_products(db.as_ref()).await.unwrap();

        let all = db.list(ProductScope::All).await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(
            first.iter().map(|p| p.id).collect::<Vec<_>>(),
            second.iter().map(|p| p.id).collect::<Vec<_>>()
        );
    }

    #[tokio::test]
    async fn test_seed_keeps_archived_product_archived() {
        let db = Arc::new(MemoryDatabase::new());
        let first = seed_products(db.as_ref()).await.unwrap();
        db.archive(first[0].id).await.unwrap();

        let second = seed_products(db.as_ref()).await.unwrap();

        assert!(second[0].archived);
        let live = db.list(ProductScope::Live).await.unwrap();
        let names: Vec<_> = live.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["Desktop", "Smartphone"]);
    }
}
