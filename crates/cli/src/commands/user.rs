//! User account commands.

use shopapp::models::User;
use shopapp::ports::Repositories;
use shopapp::services::AuthService;
use shopapp_core::{PermissionCode, Username};

use super::{CommandError, connect};

async fn find_user(repos: &Repositories, username: &str) -> Result<User, CommandError> {
    let username = Username::parse(username)?;
    repos
        .users
        .get_by_username(&username)
        .await?
        .ok_or_else(|| CommandError::NotFound(format!("user {username}")))
}

/// Create a user with a hashed password.
pub async fn create(username: &str, password: &str, superuser: bool) -> Result<(), CommandError> {
    let pool = connect().await?;
    let repos = Repositories::postgres(&pool);

    tracing::info!("Creating user: {} (superuser: {})", username, superuser);
    let user = AuthService::new(repos.users.as_ref())
        .register(username, password, superuser)
        .await?;

    tracing::info!(user_id = %user.id, "User created");
    Ok(())
}

/// Grant a permission directly to a user.
pub async fn grant(username: &str, permission: &str) -> Result<(), CommandError> {
    let code = PermissionCode::parse(permission)?;
    let pool = connect().await?;
    let repos = Repositories::postgres(&pool);

    let user = find_user(&repos, username).await?;
    repos.users.grant_permission(user.id, &code).await?;

    tracing::info!("Granted {} to {}", code, user.username);
    Ok(())
}

/// Add a user to a group.
pub async fn add_to_group(username: &str, group: &str) -> Result<(), CommandError> {
    let pool = connect().await?;
    let repos = Repositories::postgres(&pool);

    let user = find_user(&repos, username).await?;
    let group = repos
        .groups
        .get_by_name(group)
        .await?
        .ok_or_else(|| CommandError::NotFound(format!("group {group}")))?;
    repos.users.add_to_group(user.id, group.id).await?;

    tracing::info!("Added {} to group {}", user.username, group.name);
    Ok(())
}
