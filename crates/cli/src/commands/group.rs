//! Group and permission commands.

use shopapp::ports::Repositories;
use shopapp_core::PermissionCode;

use super::{CommandError, connect};

/// Create a group.
pub async fn create(name: &str) -> Result<(), CommandError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(CommandError::InvalidArgument("group name must not be empty".into()));
    }

    let pool = connect().await?;
    let repos = Repositories::postgres(&pool);

    let group = repos.groups.create(name).await?;
    tracing::info!(group_id = %group.id, "Group created: {}", group.name);
    Ok(())
}

/// Grant a permission to a group.
pub async fn grant(name: &str, permission: &str) -> Result<(), CommandError> {
    let code = PermissionCode::parse(permission)?;
    let pool = connect().await?;
    let repos = Repositories::postgres(&pool);

    let group = repos
        .groups
        .get_by_name(name)
        .await?
        .ok_or_else(|| CommandError::NotFound(format!("group {name}")))?;
    repos.groups.grant_permission(group.id, &code).await?;

    tracing::info!("Granted {} to group {}", code, group.name);
    Ok(())
}

/// Print every known permission, one per line.
#[allow(clippy::print_stdout)]
pub async fn list_permissions() -> Result<(), CommandError> {
    let pool = connect().await?;
    let repos = Repositories::postgres(&pool);

    let permissions = repos.groups.list_permissions().await?;

    for permission in permissions {
        println!("{:<32} {}", permission.code, permission.name);
    }
    Ok(())
}
