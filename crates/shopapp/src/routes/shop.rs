//! Shop index handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::State;
use tracing::instrument;

use crate::error::AppError;
use crate::filters;
use crate::middleware::OptionalUser;
use crate::models::{CurrentUser, Product, ProductScope};
use crate::state::AppState;

/// Shop index page template.
#[derive(Template, WebTemplate)]
#[template(path = "shop/index.html")]
pub struct ShopIndexTemplate {
    pub user: Option<CurrentUser>,
    pub products: Vec<Product>,
    /// Seconds since the server started, two decimals.
    pub time_running: String,
}

/// Shop index: live products and server uptime.
#[instrument(skip_all)]
pub async fn index(
    State(state): State<AppState>,
    OptionalUser(user): OptionalUser,
) -> Result<ShopIndexTemplate, AppError> {
    let products = state.products().list(ProductScope::Live).await?;

    Ok(ShopIndexTemplate {
        user,
        products,
        time_running: format!("{:.2}", state.uptime().as_secs_f64()),
    })
}
