//! User repository for `PostgreSQL`.
//!
//! Covers accounts, direct permission grants and group membership.

use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use shopapp_core::{GroupId, PermissionCode, UserId, Username};

use super::RepositoryError;
use crate::models::User;
use crate::ports::UserRepository;

// =============================================================================
// Internal Row Types
// =============================================================================

/// Internal row type for `PostgreSQL` user queries.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct UserRow {
    pub(crate) id: i32,
    pub(crate) username: String,
    pub(crate) is_superuser: bool,
    pub(crate) is_active: bool,
    pub(crate) date_joined: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let username = Username::parse(&row.username).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid username in database: {e}"))
        })?;

        Ok(Self {
            id: UserId::new(row.id),
            username,
            is_superuser: row.is_superuser,
            is_active: row.is_active,
            date_joined: row.date_joined,
        })
    }
}

/// Internal row type for login lookups.
#[derive(Debug, sqlx::FromRow)]
struct CredentialRow {
    #[sqlx(flatten)]
    user: UserRow,
    password_hash: String,
}

const USER_COLUMNS: &str = "id, username, is_superuser, is_active, date_joined";

// =============================================================================
// Repository
// =============================================================================

/// Repository for user database operations.
#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn list_all(&self) -> Result<Vec<User>, RepositoryError> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            r#"SELECT {USER_COLUMNS} FROM shop."user" ORDER BY username"#
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"SELECT {USER_COLUMNS} FROM shop."user" WHERE id = $1"#
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn get_by_username(&self, username: &Username) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"SELECT {USER_COLUMNS} FROM shop."user" WHERE username = $1"#
        ))
        .bind(username.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn get_credentials(
        &self,
        username: &Username,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let row = sqlx::query_as::<_, CredentialRow>(&format!(
            r#"SELECT {USER_COLUMNS}, password_hash FROM shop."user" WHERE username = $1"#
        ))
        .bind(username.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| -> Result<(User, String), RepositoryError> {
            Ok((User::try_from(r.user)?, r.password_hash))
        })
        .transpose()
    }

    async fn create(
        &self,
        username: &Username,
        password_hash: &str,
        is_superuser: bool,
    ) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            INSERT INTO shop."user" (username, password_hash, is_superuser)
            VALUES ($1, $2, $3)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(username.as_str())
        .bind(password_hash)
        .bind(is_superuser)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| RepositoryError::from_write(e, "username"))?;

        row.try_into()
    }

    async fn granted_permissions(
        &self,
        id: UserId,
    ) -> Result<BTreeSet<PermissionCode>, RepositoryError> {
        let codes = sqlx::query_scalar::<_, String>(
            r#"
            SELECT p.codename
            FROM shop.permission p
            JOIN shop.user_permission up ON up.permission_id = p.id
            JOIN shop."user" u ON u.id = up.user_id
            WHERE u.id = $1 AND u.is_active
            UNION
            SELECT p.codename
            FROM shop.permission p
            JOIN shop.group_permission gp ON gp.permission_id = p.id
            JOIN shop.user_group ug ON ug.group_id = gp.group_id
            JOIN shop."user" u ON u.id = ug.user_id
            WHERE u.id = $1 AND u.is_active
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        codes
            .iter()
            .map(|c| {
                PermissionCode::parse(c).map_err(|e| {
                    RepositoryError::DataCorruption(format!("invalid permission {c}: {e}"))
                })
            })
            .collect()
    }

    async fn grant_permission(
        &self,
        id: UserId,
        code: &PermissionCode,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            INSERT INTO shop.user_permission (user_id, permission_id)
            SELECT $1, p.id FROM shop.permission p WHERE p.codename = $2
            ON CONFLICT DO NOTHING
            ",
        )
        .bind(id)
        .bind(code.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::from_write(e, "user permission"))?;

        if result.rows_affected() == 0 {
            // Either already granted or the permission does not exist.
            let known = sqlx::query_scalar::<_, i32>(
                "SELECT id FROM shop.permission WHERE codename = $1",
            )
            .bind(code.as_str())
            .fetch_optional(&self.pool)
            .await?;
            if known.is_none() {
                return Err(RepositoryError::NotFound);
            }
        }

        Ok(())
    }

    async fn add_to_group(&self, id: UserId, group_id: GroupId) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO shop.user_group (user_id, group_id)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            ",
        )
        .bind(id)
        .bind(group_id)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::from_write(e, "group membership"))?;

        Ok(())
    }
}
