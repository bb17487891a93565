//! Group and permission repository for `PostgreSQL`.

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::PgPool;

use shopapp_core::{GroupId, PermissionCode, PermissionId};

use super::RepositoryError;
use crate::models::{Group, GroupWithPermissions, Permission};
use crate::ports::GroupRepository;

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct GroupRow {
    id: i32,
    name: String,
}

impl From<GroupRow> for Group {
    fn from(row: GroupRow) -> Self {
        Self {
            id: GroupId::new(row.id),
            name: row.name,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct PermissionRow {
    id: i32,
    codename: String,
    name: String,
}

impl TryFrom<PermissionRow> for Permission {
    type Error = RepositoryError;

    fn try_from(row: PermissionRow) -> Result<Self, Self::Error> {
        let code = PermissionCode::parse(&row.codename).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid permission {}: {e}", row.codename))
        })?;

        Ok(Self {
            id: PermissionId::new(row.id),
            code,
            name: row.name,
        })
    }
}

/// A permission row tagged with the group it was fetched for.
#[derive(Debug, sqlx::FromRow)]
struct GroupPermissionRow {
    group_id: i32,
    #[sqlx(flatten)]
    permission: PermissionRow,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for group database operations.
#[derive(Clone)]
pub struct PgGroupRepository {
    pool: PgPool,
}

impl PgGroupRepository {
    /// Create a new group repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GroupRepository for PgGroupRepository {
    async fn list_with_permissions(&self) -> Result<Vec<GroupWithPermissions>, RepositoryError> {
        let groups = sqlx::query_as::<_, GroupRow>(r#"SELECT id, name FROM shop."group" ORDER BY id"#)
            .fetch_all(&self.pool)
            .await?;

        // One query for every group's permissions instead of one per group.
        let links = sqlx::query_as::<_, GroupPermissionRow>(
            r"
            SELECT gp.group_id, p.id, p.codename, p.name
            FROM shop.group_permission gp
            JOIN shop.permission p ON p.id = gp.permission_id
            ORDER BY p.codename
            ",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut by_group: HashMap<i32, Vec<Permission>> = HashMap::new();
        for link in links {
            by_group
                .entry(link.group_id)
                .or_default()
                .push(link.permission.try_into()?);
        }

        Ok(groups
            .into_iter()
            .map(|row| {
                let permissions = by_group.remove(&row.id).unwrap_or_default();
                GroupWithPermissions {
                    group: row.into(),
                    permissions,
                }
            })
            .collect())
    }

    async fn get_by_name(&self, name: &str) -> Result<Option<Group>, RepositoryError> {
        let row =
            sqlx::query_as::<_, GroupRow>(r#"SELECT id, name FROM shop."group" WHERE name = $1"#)
                .bind(name)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(Into::into))
    }

    async fn create(&self, name: &str) -> Result<Group, RepositoryError> {
        let row = sqlx::query_as::<_, GroupRow>(
            r#"INSERT INTO shop."group" (name) VALUES ($1) RETURNING id, name"#,
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| RepositoryError::from_write(e, "group"))?;

        Ok(row.into())
    }

    async fn grant_permission(
        &self,
        id: GroupId,
        code: &PermissionCode,
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let permission_id = sqlx::query_scalar::<_, i32>(
            "SELECT id FROM shop.permission WHERE codename = $1",
        )
        .bind(code.as_str())
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        sqlx::query(
            r"
            INSERT INTO shop.group_permission (group_id, permission_id)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            ",
        )
        .bind(id)
        .bind(permission_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| RepositoryError::from_write(e, "group permission"))?;

        tx.commit().await?;
        Ok(())
    }

    async fn list_permissions(&self) -> Result<Vec<Permission>, RepositoryError> {
        let rows = sqlx::query_as::<_, PermissionRow>(
            "SELECT id, codename, name FROM shop.permission ORDER BY codename",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }
}
