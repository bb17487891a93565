//! HTTP route handlers for the shop.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                               - Redirect to /shop/
//! GET  /health                         - Liveness
//! GET  /health/ready                   - Readiness (store ping)
//!
//! # Shop
//! GET  /shop/                          - Index: live products + uptime
//! GET  /shop/groups/                   - Group list + creation form
//! POST /shop/groups/                   - Create group
//!
//! # Products
//! GET  /shop/products/                 - Live product listing
//! GET  /shop/products/create/          - Creation form (superuser)
//! POST /shop/products/create/          - Create product (superuser)
//! GET  /shop/products/{id}/            - Product detail (archived included)
//! GET  /shop/products/{id}/update/     - Update form
//! POST /shop/products/{id}/update/     - Update product
//! GET  /shop/products/{id}/archive/    - Archive confirmation
//! POST /shop/products/{id}/archive/    - Archive product
//!
//! # Orders
//! GET  /shop/orders/                   - Order listing (login required)
//! GET  /shop/orders/create/            - Creation form
//! POST /shop/orders/create/            - Create order
//! GET  /shop/orders/{id}/              - Order detail (shopapp.view_order)
//!
//! # Accounts
//! GET  /accounts/login/                - Login form
//! POST /accounts/login/                - Login action
//! POST /accounts/logout/               - Logout action
//! ```

pub mod auth;
pub mod extract;
pub mod groups;
pub mod health;
pub mod orders;
pub mod products;
pub mod shop;

use axum::{
    Router,
    response::Redirect,
    routing::{get, post},
};
use tower_http::services::ServeDir;
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tower_sessions::{SessionManagerLayer, SessionStore};
use tracing::Span;

use crate::middleware::security_headers_middleware;
use crate::state::AppState;

/// Create the shop index and group routes router.
pub fn shop_routes() -> Router<AppState> {
    Router::new()
        .route("/shop/", get(shop::index))
        .route("/shop/groups/", get(groups::index).post(groups::create))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/shop/products/", get(products::index))
        .route(
            "/shop/products/create/",
            get(products::create_form).post(products::create),
        )
        .route("/shop/products/{id}/", get(products::show))
        .route(
            "/shop/products/{id}/update/",
            get(products::update_form).post(products::update),
        )
        .route(
            "/shop/products/{id}/archive/",
            get(products::archive_confirm).post(products::archive),
        )
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/shop/orders/", get(orders::index))
        .route(
            "/shop/orders/create/",
            get(orders::create_form).post(orders::create),
        )
        .route("/shop/orders/{id}/", get(orders::show))
}

/// Create the account routes router.
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/accounts/login/", get(auth::login_page).post(auth::login))
        .route("/accounts/logout/", post(auth::logout))
}

/// Create all routes for the shop.
///
/// Paths are spelled out in full because every page URL ends in a slash,
/// which a nested `/` route would not match.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(|| async { Redirect::to("/shop/") }))
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .merge(shop_routes())
        .merge(product_routes())
        .merge(order_routes())
        .merge(account_routes())
}

/// Build the complete application over any session store.
///
/// Sentry layers are added by the binary so tests run without a client.
pub fn app<S>(state: AppState, sessions: SessionManagerLayer<S>) -> Router
where
    S: SessionStore + Clone,
{
    Router::new()
        .merge(routes())
        .nest_service(
            "/static",
            ServeDir::new(concat!(env!("CARGO_MANIFEST_DIR"), "/static")),
        )
        .layer(axum::middleware::from_fn(security_headers_middleware))
        .layer(sessions)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
}
