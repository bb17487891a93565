//! Login and logout handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, clear_sentry_user};
use crate::filters;
use crate::forms::LoginForm;
use crate::middleware::auth::LOGIN_PATH;
use crate::middleware::{OptionalUser, clear_current_user, set_current_user};
use crate::models::CurrentUser;
use crate::services::auth::{AuthError, AuthService};
use crate::state::AppState;

/// Where to go after login when no usable `next` is given.
const DEFAULT_REDIRECT: &str = "/shop/";

/// Query parameters for the login page.
#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    pub next: Option<String>,
}

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub user: Option<CurrentUser>,
    pub username: String,
    pub next: String,
    pub error: Option<String>,
}

/// Accept only same-site absolute paths as a post-login target.
///
/// Rejects scheme-relative URLs (`//host`) and backslash tricks that some
/// browsers normalize into them.
fn safe_next(next: Option<&str>) -> Option<&str> {
    next.filter(|n| n.starts_with('/') && !n.starts_with("//") && !n.contains('\\'))
}

/// Display the login page.
pub async fn login_page(
    OptionalUser(user): OptionalUser,
    Query(query): Query<LoginQuery>,
) -> LoginTemplate {
    LoginTemplate {
        user,
        username: String::new(),
        next: safe_next(query.next.as_deref()).unwrap_or_default().to_string(),
        error: None,
    }
}

/// Handle login form submission.
#[instrument(skip_all, fields(username = %form.username))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let next = safe_next(form.next.as_deref()).unwrap_or_default().to_string();

    let user = match AuthService::new(state.users())
        .login(&form.username, &form.password)
        .await
    {
        Ok(user) => user,
        Err(AuthError::InvalidCredentials) => {
            tracing::info!("Login failed");
            return Ok(LoginTemplate {
                user: None,
                username: form.username,
                next,
                error: Some(
                    "Please enter a correct username and password. Note that both fields may be case-sensitive."
                        .to_string(),
                ),
            }
            .into_response());
        }
        Err(e) => return Err(AppError::Internal(e.to_string())),
    };

    set_current_user(&session, &CurrentUser::from(&user))
        .await
        .map_err(|e| AppError::Internal(format!("session: {e}")))?;
    tracing::info!(user_id = %user.id, "Login succeeded");

    let target = if next.is_empty() { DEFAULT_REDIRECT } else { next.as_str() };
    Ok(Redirect::to(target).into_response())
}

/// Handle logout.
#[instrument(skip_all)]
pub async fn logout(session: Session) -> Result<Redirect, AppError> {
    clear_current_user(&session)
        .await
        .map_err(|e| AppError::Internal(format!("session: {e}")))?;
    clear_sentry_user();

    Ok(Redirect::to(LOGIN_PATH))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_next_accepts_local_paths() {
        assert_eq!(safe_next(Some("/shop/orders/")), Some("/shop/orders/"));
        assert_eq!(safe_next(Some("/shop/?a=1")), Some("/shop/?a=1"));
    }

    #[test]
    fn test_safe_next_rejects_offsite_targets() {
        assert_eq!(safe_next(Some("https://evil.example.com/")), None);
        assert_eq!(safe_next(Some("//evil.example.com/")), None);
        assert_eq!(safe_next(Some("/\\evil.example.com")), None);
        assert_eq!(safe_next(Some("")), None);
        assert_eq!(safe_next(None), None);
    }
}
