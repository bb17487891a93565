//! Group administration handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{OriginalUri, State},
    response::{IntoResponse, Redirect, Response},
};
use tracing::instrument;

use crate::db::RepositoryError;
use crate::error::AppError;
use crate::filters;
use crate::forms::{FormErrors, GROUP_NAME_TAKEN, GroupForm};
use crate::middleware::OptionalUser;
use crate::models::{CurrentUser, GroupWithPermissions};
use crate::state::AppState;

/// Group list page template.
#[derive(Template, WebTemplate)]
#[template(path = "groups/list.html")]
pub struct GroupsTemplate {
    pub user: Option<CurrentUser>,
    pub groups: Vec<GroupWithPermissions>,
    pub form: GroupForm,
    pub errors: FormErrors,
}

/// List groups with their permissions and an empty creation form.
#[instrument(skip_all)]
pub async fn index(
    State(state): State<AppState>,
    OptionalUser(user): OptionalUser,
) -> Result<GroupsTemplate, AppError> {
    Ok(GroupsTemplate {
        user,
        groups: state.groups().list_with_permissions().await?,
        form: GroupForm::default(),
        errors: FormErrors::default(),
    })
}

/// Create a group, then redirect back to the list.
///
/// An invalid or duplicate name re-renders the page with the error.
#[instrument(skip_all, fields(name = %form.name))]
pub async fn create(
    State(state): State<AppState>,
    OptionalUser(user): OptionalUser,
    OriginalUri(uri): OriginalUri,
    Form(form): Form<GroupForm>,
) -> Result<Response, AppError> {
    let errors = match form.validate() {
        Ok(name) => match state.groups().create(&name).await {
            Ok(group) => {
                tracing::info!(group_id = %group.id, "Group created");
                return Ok(Redirect::to(uri.path()).into_response());
            }
            Err(RepositoryError::Conflict(_)) => {
                let mut errors = FormErrors::default();
                errors.add("name", GROUP_NAME_TAKEN);
                errors
            }
            Err(e) => return Err(e.into()),
        },
        Err(errors) => errors,
    };

    Ok(GroupsTemplate {
        user,
        groups: state.groups().list_with_permissions().await?,
        form,
        errors,
    }
    .into_response())
}
