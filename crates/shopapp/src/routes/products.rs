//! Product catalog handlers.
//!
//! Archiving is a soft delete: the row stays and only `archived` flips.
//!
//! Update and archive carry no guard. Whether they should require
//! `change_product`/`delete_product` is still undecided, so they stay open
//! rather than being silently hardened.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use tracing::instrument;

use shopapp_core::ProductId;

use crate::error::AppError;
use crate::filters;
use crate::forms::{FormErrors, ProductForm};
use crate::middleware::{OptionalUser, RequireSuperuser};
use crate::models::{CurrentUser, Product, ProductScope};
use crate::routes::extract::IdPath;
use crate::state::AppState;

const PRODUCTS_PATH: &str = "/shop/products/";

fn detail_path(id: ProductId) -> String {
    format!("{PRODUCTS_PATH}{id}/")
}

// =============================================================================
// Templates
// =============================================================================

/// Product list page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/list.html")]
pub struct ProductListTemplate {
    pub user: Option<CurrentUser>,
    pub products: Vec<Product>,
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/detail.html")]
pub struct ProductDetailTemplate {
    pub user: Option<CurrentUser>,
    pub product: Product,
}

/// Product create/update form template.
#[derive(Template, WebTemplate)]
#[template(path = "products/form.html")]
pub struct ProductFormTemplate {
    pub user: Option<CurrentUser>,
    /// `None` when creating.
    pub product: Option<Product>,
    pub action: String,
    pub form: ProductForm,
    pub errors: FormErrors,
}

/// Archive confirmation page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/confirm_archive.html")]
pub struct ConfirmArchiveTemplate {
    pub user: Option<CurrentUser>,
    pub product: Product,
}

async fn load(state: &AppState, id: ProductId) -> Result<Product, AppError> {
    state
        .products()
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))
}

// =============================================================================
// Read Routes
// =============================================================================

/// Live products in insertion order.
#[instrument(skip_all)]
pub async fn index(
    State(state): State<AppState>,
    OptionalUser(user): OptionalUser,
) -> Result<ProductListTemplate, AppError> {
    Ok(ProductListTemplate {
        user,
        products: state.products().list(ProductScope::Live).await?,
    })
}

/// Product detail. Archived products are still shown.
#[instrument(skip(state, user))]
pub async fn show(
    State(state): State<AppState>,
    OptionalUser(user): OptionalUser,
    IdPath(id): IdPath<ProductId>,
) -> Result<ProductDetailTemplate, AppError> {
    Ok(ProductDetailTemplate {
        user,
        product: load(&state, id).await?,
    })
}

// =============================================================================
// Create Routes
// =============================================================================

/// Display the creation form.
#[instrument(skip_all)]
pub async fn create_form(RequireSuperuser(admin): RequireSuperuser) -> ProductFormTemplate {
    ProductFormTemplate {
        user: Some(admin),
        product: None,
        action: format!("{PRODUCTS_PATH}create/"),
        form: ProductForm::blank(),
        errors: FormErrors::default(),
    }
}

/// Create a product and redirect to the list.
#[instrument(skip_all, fields(admin = %admin.username))]
pub async fn create(
    RequireSuperuser(admin): RequireSuperuser,
    State(state): State<AppState>,
    Form(form): Form<ProductForm>,
) -> Result<Response, AppError> {
    match form.validate() {
        Ok(input) => {
            let product = state.products().create(&input).await?;
            tracing::info!(product_id = %product.id, "Product created");
            Ok(Redirect::to(PRODUCTS_PATH).into_response())
        }
        Err(errors) => Ok(ProductFormTemplate {
            user: Some(admin),
            product: None,
            action: format!("{PRODUCTS_PATH}create/"),
            form,
            errors,
        }
        .into_response()),
    }
}

// =============================================================================
// Update Routes
// =============================================================================

/// Display the update form pre-filled with the current values.
#[instrument(skip(state, user))]
pub async fn update_form(
    State(state): State<AppState>,
    OptionalUser(user): OptionalUser,
    IdPath(id): IdPath<ProductId>,
) -> Result<ProductFormTemplate, AppError> {
    let product = load(&state, id).await?;

    Ok(ProductFormTemplate {
        user,
        form: ProductForm::from_product(&product),
        action: format!("{}update/", detail_path(id)),
        product: Some(product),
        errors: FormErrors::default(),
    })
}

/// Update a product and redirect to its detail page.
#[instrument(skip(state, user, form))]
pub async fn update(
    State(state): State<AppState>,
    OptionalUser(user): OptionalUser,
    IdPath(id): IdPath<ProductId>,
    Form(form): Form<ProductForm>,
) -> Result<Response, AppError> {
    let product = load(&state, id).await?;

    match form.validate() {
        Ok(input) => {
            let updated = state.products().update(id, &input).await?;
            tracing::info!(product_id = %updated.id, "Product updated");
            Ok(Redirect::to(&detail_path(updated.id)).into_response())
        }
        Err(errors) => Ok(ProductFormTemplate {
            user,
            product: Some(product),
            action: format!("{}update/", detail_path(id)),
            form,
            errors,
        }
        .into_response()),
    }
}

// =============================================================================
// Archive Routes
// =============================================================================

/// Ask for confirmation before archiving.
#[instrument(skip(state, user))]
pub async fn archive_confirm(
    State(state): State<AppState>,
    OptionalUser(user): OptionalUser,
    IdPath(id): IdPath<ProductId>,
) -> Result<ConfirmArchiveTemplate, AppError> {
    Ok(ConfirmArchiveTemplate {
        user,
        product: load(&state, id).await?,
    })
}

/// Archive a product and redirect to the list. The row is kept.
#[instrument(skip(state))]
pub async fn archive(
    State(state): State<AppState>,
    IdPath(id): IdPath<ProductId>,
) -> Result<Redirect, AppError> {
    let product = state.products().archive(id).await?;
    tracing::info!(product_id = %product.id, "Product archived");
    Ok(Redirect::to(PRODUCTS_PATH))
}
