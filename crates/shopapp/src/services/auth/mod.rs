//! Authentication service.
//!
//! Password login for shop staff and permission resolution for guards.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use shopapp_core::{PermissionCode, Username};

use crate::db::RepositoryError;
use crate::models::User;
use crate::ports::UserRepository;

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Authentication service.
///
/// Handles account creation, login, and permission checks.
pub struct AuthService<'a> {
    users: &'a dyn UserRepository,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service over a user repository.
    #[must_use]
    pub const fn new(users: &'a dyn UserRepository) -> Self {
        Self { users }
    }

    /// Create an account with a hashed password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidUsername` if the username format is invalid.
    /// Returns `AuthError::WeakPassword` if the password doesn't meet requirements.
    /// Returns `AuthError::UserAlreadyExists` if the username is taken.
    pub async fn register(
        &self,
        username: &str,
        password: &str,
        is_superuser: bool,
    ) -> Result<User, AuthError> {
        let username = Username::parse(username)?;
        validate_password(password)?;
        let password_hash = hash_password(password)?;

        self.users
            .create(&username, &password_hash, is_superuser)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })
    }

    /// Login with username and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the username or password is
    /// wrong, or if the account is inactive.
    pub async fn login(&self, username: &str, password: &str) -> Result<User, AuthError> {
        let username = Username::parse(username).map_err(|_| AuthError::InvalidCredentials)?;

        let (user, password_hash) = self
            .users
            .get_credentials(&username)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        if !user.is_active {
            tracing::warn!(username = %user.username, "Login attempt for inactive account");
            return Err(AuthError::InvalidCredentials);
        }

        Ok(user)
    }

    /// Whether the user holds a permission.
    ///
    /// `user` should be freshly loaded for the request so deactivation takes
    /// effect immediately; grants are always read from the store. Active
    /// superusers hold every permission.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the lookup fails.
    pub async fn has_permission(&self, user: &User, code: &PermissionCode) -> Result<bool, AuthError> {
        if !user.is_active {
            return Ok(false);
        }
        if user.is_superuser {
            return Ok(true);
        }

        let granted = self.users.granted_permissions(user.id).await?;
        Ok(granted.contains(code))
    }
}

/// Validate password requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::db::MemoryDatabase;
    use crate::ports::GroupRepository;

    fn code(s: &str) -> PermissionCode {
        PermissionCode::parse(s).unwrap()
    }

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("correct horse").unwrap();
        assert!(verify_password("correct horse", &hash).is_ok());
        assert!(matches!(
            verify_password("battery staple", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_short_password_rejected() {
        assert!(matches!(
            validate_password("short"),
            Err(AuthError::WeakPassword(_))
        ));
        assert!(validate_password("long enough").is_ok());
    }

    #[tokio::test]
    async fn test_login_roundtrip() {
        let db = Arc::new(MemoryDatabase::new());
        let auth = AuthService::new(db.as_ref());
        auth.register("jane", "password123", false).await.unwrap();

        let user = auth.login("jane", "password123").await.unwrap();
        assert_eq!(user.username.as_str(), "jane");

        assert!(matches!(
            auth.login("jane", "wrong-password").await,
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            auth.login("nobody", "password123").await,
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_duplicate_username() {
        let db = MemoryDatabase::new();
        let auth = AuthService::new(&db);
        auth.register("jane", "password123", false).await.unwrap();

        assert!(matches!(
            auth.register("jane", "password456", false).await,
            Err(AuthError::UserAlreadyExists)
        ));
    }

    #[tokio::test]
    async fn test_inactive_user_cannot_login() {
        let db = MemoryDatabase::new();
        let auth = AuthService::new(&db);
        let user = auth.register("jane", "password123", false).await.unwrap();
        db.set_user_active(user.id, false).await.unwrap();

        assert!(matches!(
            auth.login("jane", "password123").await,
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_superuser_holds_every_permission() {
        let db = MemoryDatabase::new();
        let auth = AuthService::new(&db);
        let mut admin = auth.register("admin", "password123", true).await.unwrap();

        assert!(auth.has_permission(&admin, &code("shopapp.view_order")).await.unwrap());

        admin.is_active = false;
        assert!(!auth.has_permission(&admin, &code("shopapp.view_order")).await.unwrap());
    }

    #[tokio::test]
    async fn test_group_permission_is_honored() {
        let db = MemoryDatabase::new();
        let auth = AuthService::new(&db);
        let jane = auth.register("jane", "password123", false).await.unwrap();
        let view_order = code("shopapp.view_order");

        assert!(!auth.has_permission(&jane, &view_order).await.unwrap());

        let group = GroupRepository::create(&db, "clerks").await.unwrap();
        GroupRepository::grant_permission(&db, group.id, &view_order)
            .await
            .unwrap();
        db.add_to_group(jane.id, group.id).await.unwrap();

        assert!(auth.has_permission(&jane, &view_order).await.unwrap());
    }

    #[tokio::test]
    async fn test_permission_check_uses_loaded_account() {
        let db = MemoryDatabase::new();
        let auth = AuthService::new(&db);
        let mut jane = auth.register("jane", "password123", false).await.unwrap();
        let view_order = code("shopapp.view_order");

        // Flags come from the account passed in; the store is not re-read.
        jane.is_superuser = true;
        assert!(auth.has_permission(&jane, &view_order).await.unwrap());
    }
}
