//! Session-related types for authentication.

use serde::{Deserialize, Serialize};

use shopapp_core::{UserId, Username};

use super::User;

/// Session-stored identity.
///
/// Minimal data stored in the session to identify the logged-in user.
/// Permissions are not cached here; guards resolve them per request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    /// User's database ID.
    pub id: UserId,
    /// User's login name.
    pub username: Username,
    /// Whether the user bypasses permission checks.
    pub is_superuser: bool,
}

impl From<&User> for CurrentUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            is_superuser: user.is_superuser,
        }
    }
}

/// Session keys for authentication data.
pub mod keys {
    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";
}
