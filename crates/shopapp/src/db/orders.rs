//! Order repository for `PostgreSQL`.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use shopapp_core::{OrderId, UserId};

use super::RepositoryError;
use super::products::{PRODUCT_COLUMNS, ProductRow};
use super::users::UserRow;
use crate::models::{NewOrder, Order, OrderWithRelations, Product, User};
use crate::ports::OrderRepository;

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i32,
    user_id: i32,
    delivery_address: Option<String>,
    promocode: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<OrderRow> for Order {
    fn from(row: OrderRow) -> Self {
        Self {
            id: OrderId::new(row.id),
            user_id: UserId::new(row.user_id),
            delivery_address: row.delivery_address,
            promocode: row.promocode,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Order joined with its owner in one row. User columns are prefixed.
#[derive(Debug, sqlx::FromRow)]
struct OrderOwnerRow {
    #[sqlx(flatten)]
    order: OrderRow,
    owner_id: i32,
    owner_username: String,
    owner_is_superuser: bool,
    owner_is_active: bool,
    owner_date_joined: DateTime<Utc>,
}

impl OrderOwnerRow {
    fn into_parts(self) -> (OrderRow, UserRow) {
        let user = UserRow {
            id: self.owner_id,
            username: self.owner_username,
            is_superuser: self.owner_is_superuser,
            is_active: self.owner_is_active,
            date_joined: self.owner_date_joined,
        };
        (self.order, user)
    }
}

/// A product row tagged with the order that links to it.
#[derive(Debug, sqlx::FromRow)]
struct OrderProductRow {
    order_id: i32,
    #[sqlx(flatten)]
    product: ProductRow,
}

const ORDER_WITH_OWNER_SELECT: &str = r#"
    SELECT o.id, o.user_id, o.delivery_address, o.promocode, o.created_at, o.updated_at,
           u.id AS owner_id, u.username AS owner_username,
           u.is_superuser AS owner_is_superuser, u.is_active AS owner_is_active,
           u.date_joined AS owner_date_joined
    FROM shop."order" o
    JOIN shop."user" u ON u.id = o.user_id
"#;

// =============================================================================
// Repository
// =============================================================================

/// Repository for order database operations.
#[derive(Clone)]
pub struct PgOrderRepository {
    pool: PgPool,
}

impl PgOrderRepository {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Load the product sets of several orders with a single query.
    async fn products_for(
        &self,
        order_ids: &[i32],
    ) -> Result<HashMap<i32, Vec<Product>>, RepositoryError> {
        let columns = PRODUCT_COLUMNS
            .split(", ")
            .map(|c| format!("p.{c}"))
            .collect::<Vec<_>>()
            .join(", ");

        let rows = sqlx::query_as::<_, OrderProductRow>(&format!(
            r"
            SELECT op.order_id, {columns}
            FROM shop.order_product op
            JOIN shop.product p ON p.id = op.product_id
            WHERE op.order_id = ANY($1)
            ORDER BY p.id
            "
        ))
        .bind(order_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut by_order: HashMap<i32, Vec<Product>> = HashMap::new();
        for row in rows {
            by_order
                .entry(row.order_id)
                .or_default()
                .push(row.product.try_into()?);
        }
        Ok(by_order)
    }

    async fn assemble(
        &self,
        rows: Vec<OrderOwnerRow>,
    ) -> Result<Vec<OrderWithRelations>, RepositoryError> {
        let ids: Vec<i32> = rows.iter().map(|r| r.order.id).collect();
        let mut products = self.products_for(&ids).await?;

        rows.into_iter()
            .map(|row| -> Result<OrderWithRelations, RepositoryError> {
                let (order, owner) = row.into_parts();
                let products = products.remove(&order.id).unwrap_or_default();
                Ok(OrderWithRelations {
                    order: order.into(),
                    owner: User::try_from(owner)?,
                    products,
                })
            })
            .collect()
    }
}

#[async_trait]
impl OrderRepository for PgOrderRepository {
    async fn list_with_relations(&self) -> Result<Vec<OrderWithRelations>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderOwnerRow>(&format!(
            "{ORDER_WITH_OWNER_SELECT} ORDER BY o.id"
        ))
        .fetch_all(&self.pool)
        .await?;

        self.assemble(rows).await
    }

    async fn get_with_relations(
        &self,
        id: OrderId,
    ) -> Result<Option<OrderWithRelations>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderOwnerRow>(&format!(
            "{ORDER_WITH_OWNER_SELECT} WHERE o.id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        Ok(self.assemble(vec![row]).await?.pop())
    }

    async fn create(&self, order: &NewOrder) -> Result<Order, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, OrderRow>(
            r#"
            INSERT INTO shop."order" (user_id, delivery_address, promocode)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, delivery_address, promocode, created_at, updated_at
            "#,
        )
        .bind(order.user_id)
        .bind(order.delivery_address.as_deref())
        .bind(&order.promocode)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| RepositoryError::from_write(e, "order owner"))?;

        sqlx::query(
            r"
            INSERT INTO shop.order_product (order_id, product_id)
            SELECT $1, UNNEST($2::int[])
            ON CONFLICT DO NOTHING
            ",
        )
        .bind(row.id)
        .bind(&order.product_ids)
        .execute(&mut *tx)
        .await
        .map_err(|e| RepositoryError::from_write(e, "order product"))?;

        tx.commit().await?;
        Ok(row.into())
    }
}
