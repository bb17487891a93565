//! Business logic services.
//!
//! - `auth` - Password registration, login and permission checks

pub mod auth;

pub use auth::{AuthError, AuthService};
