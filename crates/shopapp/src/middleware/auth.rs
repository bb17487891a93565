//! Authentication and authorization extractors.
//!
//! Guards reload the account on every request, so a deactivated user or a
//! revoked grant takes effect immediately. Anonymous callers are redirected
//! to the login page with a `next` parameter; authenticated callers who lack
//! the required privilege get 403.

use std::marker::PhantomData;

use axum::{
    extract::{FromRequestParts, OriginalUri},
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use shopapp_core::PermissionCode;

use crate::error::{AppError, set_sentry_user};
use crate::models::{CurrentUser, User, session_keys};
use crate::services::auth::AuthService;
use crate::state::AppState;

/// Login page path.
pub const LOGIN_PATH: &str = "/accounts/login/";

/// Build the login redirect target for a request path.
#[must_use]
pub fn login_url(next: &str) -> String {
    format!("{LOGIN_PATH}?next={}", urlencoding::encode(next))
}

/// Error returned when a guard rejects a request.
#[derive(Debug)]
pub enum AuthRejection {
    /// Not logged in. Carries the path to come back to.
    RedirectToLogin(String),
    /// Logged in without the required privilege.
    Forbidden,
    /// The session or the user store failed.
    Internal(AppError),
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin(next) => Redirect::to(&login_url(&next)).into_response(),
            Self::Forbidden => (
                StatusCode::FORBIDDEN,
                "You do not have permission to access this page",
            )
                .into_response(),
            Self::Internal(err) => err.into_response(),
        }
    }
}

fn requested_path(parts: &Parts) -> String {
    let uri = parts
        .extensions
        .get::<OriginalUri>()
        .map_or(&parts.uri, |original| &original.0);
    uri.path_and_query()
        .map_or_else(|| uri.path().to_string(), ToString::to_string)
}

/// Resolve the logged-in, still-active account for a request.
async fn authenticated_user(parts: &Parts, state: &AppState) -> Result<User, AuthRejection> {
    let session = parts.extensions.get::<Session>().ok_or_else(|| {
        AuthRejection::Internal(AppError::Internal("session layer missing".to_string()))
    })?;

    let current: Option<CurrentUser> = session
        .get(session_keys::CURRENT_USER)
        .await
        .map_err(|e| AuthRejection::Internal(AppError::Internal(e.to_string())))?;
    let Some(current) = current else {
        return Err(AuthRejection::RedirectToLogin(requested_path(parts)));
    };

    let user = state
        .users()
        .get_by_id(current.id)
        .await
        .map_err(|e| AuthRejection::Internal(e.into()))?;

    match user {
        Some(user) if user.is_active => {
            set_sentry_user(user.id.as_i32(), user.username.as_str());
            Ok(user)
        }
        _ => {
            // Account deleted or deactivated since login.
            if let Err(e) = clear_current_user(session).await {
                tracing::warn!("Failed to clear stale session: {e}");
            }
            Err(AuthRejection::RedirectToLogin(requested_path(parts)))
        }
    }
}

/// Extractor that requires a logged-in, active user.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(RequireLogin(user): RequireLogin) -> impl IntoResponse {
///     format!("Hello, {}!", user.username)
/// }
/// ```
pub struct RequireLogin(pub CurrentUser);

impl FromRequestParts<AppState> for RequireLogin {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = authenticated_user(parts, state).await?;
        Ok(Self(CurrentUser::from(&user)))
    }
}

/// Extractor that requires an active superuser.
pub struct RequireSuperuser(pub CurrentUser);

impl FromRequestParts<AppState> for RequireSuperuser {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = authenticated_user(parts, state).await?;
        if !user.is_superuser {
            tracing::info!(username = %user.username, "Superuser check failed");
            return Err(AuthRejection::Forbidden);
        }
        Ok(Self(CurrentUser::from(&user)))
    }
}

/// A permission a route can demand through [`RequirePermission`].
pub trait RequiredPermission: Send + Sync {
    /// Codename in `app_label.codename` form.
    const CODE: &'static str;
}

/// `shopapp.view_order`.
pub struct ViewOrder;

impl RequiredPermission for ViewOrder {
    const CODE: &'static str = "shopapp.view_order";
}

/// Extractor that requires a specific permission.
///
/// Superusers pass every check; others need the permission directly or
/// through one of their groups.
pub struct RequirePermission<P: RequiredPermission>(pub CurrentUser, PhantomData<P>);

impl<P: RequiredPermission> RequirePermission<P> {
    /// The user that passed the check.
    #[must_use]
    pub fn user(&self) -> &CurrentUser {
        &self.0
    }
}

impl<P: RequiredPermission> FromRequestParts<AppState> for RequirePermission<P> {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = authenticated_user(parts, state).await?;
        let current = CurrentUser::from(&user);

        let code = PermissionCode::parse(P::CODE)
            .map_err(|e| AuthRejection::Internal(AppError::Internal(e.to_string())))?;
        let allowed = AuthService::new(state.users())
            .has_permission(&user, &code)
            .await
            .map_err(|e| AuthRejection::Internal(AppError::Internal(e.to_string())))?;

        if !allowed {
            tracing::info!(username = %current.username, permission = P::CODE, "Permission denied");
            return Err(AuthRejection::Forbidden);
        }
        Ok(Self(current, PhantomData))
    }
}

/// Extractor that optionally gets the current user, for page chrome.
///
/// Reads the session only; it does not reload the account.
pub struct OptionalUser(pub Option<CurrentUser>);

impl<S> FromRequestParts<S> for OptionalUser
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = match parts.extensions.get::<Session>() {
            Some(session) => session
                .get::<CurrentUser>(session_keys::CURRENT_USER)
                .await
                .ok()
                .flatten(),
            None => None,
        };

        Ok(Self(user))
    }
}

/// Helper to set the current user in the session.
///
/// Cycles the session id first so a pre-login id cannot be reused.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_USER, user).await
}

/// Helper to clear the current user from the session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_url_encodes_next() {
        assert_eq!(
            login_url("/shop/orders/?page=2"),
            "/accounts/login/?next=%2Fshop%2Forders%2F%3Fpage%3D2"
        );
    }

    #[test]
    fn test_view_order_code_parses() {
        let code = PermissionCode::parse(ViewOrder::CODE).unwrap();
        assert_eq!(code.app_label(), "shopapp");
        assert_eq!(code.codename(), "view_order");
    }

    #[test]
    fn test_forbidden_rejection_status() {
        let response = AuthRejection::Forbidden.into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_login_rejection_redirects() {
        let response = AuthRejection::RedirectToLogin("/shop/orders/".to_string()).into_response();
        assert!(response.status().is_redirection());
        assert_eq!(
            response.headers()["location"],
            "/accounts/login/?next=%2Fshop%2Forders%2F"
        );
    }
}
