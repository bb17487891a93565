//! Order handlers.

use std::collections::BTreeSet;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use tracing::instrument;

use shopapp_core::{OrderId, ProductId, UserId};

use crate::db::RepositoryError;
use crate::error::AppError;
use crate::filters;
use crate::forms::{FormErrors, OrderForm};
use crate::middleware::{OptionalUser, RequireLogin, RequirePermission, ViewOrder};
use crate::models::{CurrentUser, OrderWithRelations, ProductScope};
use crate::routes::extract::IdPath;
use crate::state::AppState;

const ORDERS_PATH: &str = "/shop/orders/";

/// One selectable option in the order form.
#[derive(Debug, Clone)]
pub struct Choice {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

/// Order list page template.
#[derive(Template, WebTemplate)]
#[template(path = "orders/list.html")]
pub struct OrderListTemplate {
    pub user: Option<CurrentUser>,
    pub orders: Vec<OrderWithRelations>,
}

/// Order detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "orders/detail.html")]
pub struct OrderDetailTemplate {
    pub user: Option<CurrentUser>,
    pub order: OrderWithRelations,
}

/// Order creation form template.
#[derive(Template, WebTemplate)]
#[template(path = "orders/create.html")]
pub struct OrderCreateTemplate {
    pub user: Option<CurrentUser>,
    pub users: Vec<Choice>,
    pub products: Vec<Choice>,
    pub form: OrderForm,
    pub errors: FormErrors,
}

/// Every user and every live product, as form choices plus id sets.
struct OrderChoices {
    users: Vec<Choice>,
    products: Vec<Choice>,
    user_ids: BTreeSet<UserId>,
    product_ids: BTreeSet<ProductId>,
}

async fn order_choices(state: &AppState, form: &OrderForm) -> Result<OrderChoices, AppError> {
    let users = state.users().list_all().await?;
    let products = state.products().list(ProductScope::Live).await?;

    Ok(OrderChoices {
        user_ids: users.iter().map(|u| u.id).collect(),
        product_ids: products.iter().map(|p| p.id).collect(),
        users: users
            .iter()
            .map(|u| Choice {
                value: u.id.to_string(),
                label: u.username.to_string(),
                selected: form.is_owner(u.id),
            })
            .collect(),
        products: products
            .iter()
            .map(|p| Choice {
                value: p.id.to_string(),
                label: p.name.clone(),
                selected: form.is_selected(p.id),
            })
            .collect(),
    })
}

/// Field errors for an insert that lost a race with a delete.
fn conflict_errors(owner_exists: bool) -> FormErrors {
    let mut errors = FormErrors::default();
    if owner_exists {
        errors.add(
            "products",
            "Select a valid choice. A selected product is no longer available.",
        );
    } else {
        errors.add(
            "user",
            "Select a valid choice. That choice is not one of the available choices.",
        );
    }
    errors
}

/// All orders with owners and products. Login required.
#[instrument(skip_all, fields(user = %user.username))]
pub async fn index(
    RequireLogin(user): RequireLogin,
    State(state): State<AppState>,
) -> Result<OrderListTemplate, AppError> {
    Ok(OrderListTemplate {
        orders: state.orders().list_with_relations().await?,
        user: Some(user),
    })
}

/// Order detail. Requires `shopapp.view_order`.
#[instrument(skip(guard, state))]
pub async fn show(
    guard: RequirePermission<ViewOrder>,
    State(state): State<AppState>,
    IdPath(id): IdPath<OrderId>,
) -> Result<OrderDetailTemplate, AppError> {
    let order = state
        .orders()
        .get_with_relations(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("order {id}")))?;

    Ok(OrderDetailTemplate {
        user: Some(guard.user().clone()),
        order,
    })
}

/// Display the order creation form.
#[instrument(skip_all)]
pub async fn create_form(
    State(state): State<AppState>,
    OptionalUser(user): OptionalUser,
) -> Result<OrderCreateTemplate, AppError> {
    let form = OrderForm::default();
    let choices = order_choices(&state, &form).await?;

    Ok(OrderCreateTemplate {
        user,
        users: choices.users,
        products: choices.products,
        form,
        errors: FormErrors::default(),
    })
}

/// Create an order and redirect to the order list.
#[instrument(skip_all)]
pub async fn create(
    State(state): State<AppState>,
    OptionalUser(user): OptionalUser,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Result<Response, AppError> {
    let form = OrderForm::from_pairs(pairs);
    let choices = order_choices(&state, &form).await?;

    let errors = match form.validate(&choices.user_ids, &choices.product_ids) {
        Ok(new_order) => match state.orders().create(&new_order).await {
            Ok(order) => {
                tracing::info!(order_id = %order.id, owner = %order.user_id, "Order created");
                return Ok(Redirect::to(ORDERS_PATH).into_response());
            }
            // The owner or a product vanished between validation and insert.
            Err(RepositoryError::Conflict(message)) => {
                let owner_exists = state.users().get_by_id(new_order.user_id).await?.is_some();
                tracing::warn!(owner_exists, "Order insert conflicted: {message}");
                conflict_errors(owner_exists)
            }
            Err(e) => return Err(e.into()),
        },
        Err(errors) => errors,
    };

    Ok(OrderCreateTemplate {
        user,
        users: choices.users,
        products: choices.products,
        form,
        errors,
    }
    .into_response())
}
