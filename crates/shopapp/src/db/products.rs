//! Product repository for `PostgreSQL`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use shopapp_core::{Discount, Price, ProductId};

use super::RepositoryError;
use crate::models::{Product, ProductInput, ProductScope};
use crate::ports::ProductRepository;

// =============================================================================
// Internal Row Types
// =============================================================================

/// Internal row type for `PostgreSQL` product queries.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ProductRow {
    id: i32,
    name: String,
    description: String,
    price: Decimal,
    discount: i16,
    created_at: DateTime<Utc>,
    archived: bool,
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let price = Price::new(row.price).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid price for product {}: {e}", row.id))
        })?;
        let discount = Discount::new(row.discount).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid discount for product {}: {e}", row.id))
        })?;

        Ok(Self {
            id: ProductId::new(row.id),
            name: row.name,
            description: row.description,
            price,
            discount,
            created_at: row.created_at,
            archived: row.archived,
        })
    }
}

pub(crate) const PRODUCT_COLUMNS: &str =
    "id, name, description, price, discount, created_at, archived";

// =============================================================================
// Repository
// =============================================================================

/// Repository for product database operations.
#[derive(Clone)]
pub struct PgProductRepository {
    pool: PgPool,
}

impl PgProductRepository {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProductRepository for PgProductRepository {
    async fn list(&self, scope: ProductScope) -> Result<Vec<Product>, RepositoryError> {
        let sql = match scope {
            ProductScope::Live => format!(
                "SELECT {PRODUCT_COLUMNS} FROM shop.product WHERE archived = FALSE ORDER BY id"
            ),
            ProductScope::All => format!("SELECT {PRODUCT_COLUMNS} FROM shop.product ORDER BY id"),
        };

        let rows = sqlx::query_as::<_, ProductRow>(&sql)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM shop.product WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn create(&self, input: &ProductInput) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            INSERT INTO shop.product (name, description, price, discount)
            VALUES ($1, $2, $3, $4)
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.price.amount())
        .bind(input.discount.percent())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| RepositoryError::from_write(e, "product"))?;

        row.try_into()
    }

    async fn update(
        &self,
        id: ProductId,
        input: &ProductInput,
    ) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            UPDATE shop.product
            SET name = $1, description = $2, price = $3, discount = $4
            WHERE id = $5
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.price.amount())
        .bind(input.discount.percent())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        row.try_into()
    }

    async fn archive(&self, id: ProductId) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            UPDATE shop.product
            SET archived = TRUE
            WHERE id = $1
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        row.try_into()
    }

    async fn get_or_create_by_name(&self, name: &str) -> Result<(Product, bool), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        // Serialize concurrent seeders on the name so neither inserts a duplicate.
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
            .bind(name)
            .execute(&mut *tx)
            .await?;

        let existing = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM shop.product WHERE name = $1 ORDER BY id LIMIT 1"
        ))
        .bind(name)
        .fetch_optional(&mut *tx)
        .await?;

        if let Some(row) = existing {
            tx.commit().await?;
            return Ok((row.try_into()?, false));
        }

        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "INSERT INTO shop.product (name) VALUES ($1) RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(name)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| RepositoryError::from_write(e, "product"))?;

        tx.commit().await?;
        Ok((row.try_into()?, true))
    }
}
