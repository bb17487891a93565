//! HTTP middleware stack for the shop.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request tracing)
//! 3. Session layer (tower-sessions with `PostgreSQL` store)
//! 4. Security headers
//!
//! Authorization is not a layer: handlers opt in with the extractors in
//! [`auth`].

pub mod auth;
pub mod security_headers;
pub mod session;

pub use auth::{
    AuthRejection, OptionalUser, RequireLogin, RequirePermission, RequireSuperuser,
    RequiredPermission, ViewOrder, clear_current_user, login_url, set_current_user,
};
pub use security_headers::security_headers_middleware;
pub use session::{create_session_layer, session_layer};
