//! Groups and permissions.

use serde::{Deserialize, Serialize};

use shopapp_core::{GroupId, PermissionCode, PermissionId};

/// A named permission such as `shopapp.view_order`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    pub id: PermissionId,
    pub code: PermissionCode,
    pub name: String,
}

/// A group of users sharing a permission set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    pub name: String,
}

/// A group with its permissions loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupWithPermissions {
    pub group: Group,
    pub permissions: Vec<Permission>,
}
