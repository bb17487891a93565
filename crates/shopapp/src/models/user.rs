//! Shop user accounts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use shopapp_core::{UserId, Username};

/// A user account. Password hashes never leave the repository layer except
/// through [`crate::ports::UserRepository::get_credentials`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: Username,
    pub is_superuser: bool,
    pub is_active: bool,
    pub date_joined: DateTime<Utc>,
}
