//! Shop administration library.
//!
//! Catalog, order and group management served as server-rendered HTML.
//! The binary in `main.rs` wires this library to `PostgreSQL`; the
//! integration tests wire it to the in-process store instead.
//!
//! # Modules
//!
//! - [`ports`] - Repository traits the handlers depend on
//! - [`db`] - `PostgreSQL` and in-process implementations of the ports
//! - [`routes`] - Axum handlers and the application router
//! - [`middleware`] - Sessions, access guards and security headers
//! - [`seed`] - Idempotent catalog seeding

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod filters;
pub mod forms;
pub mod middleware;
pub mod models;
pub mod ports;
pub mod routes;
pub mod seed;
pub mod services;
pub mod state;
