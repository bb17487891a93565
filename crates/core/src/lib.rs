//! Shop core - shared domain types.
//!
//! This crate provides the types used across all shop components:
//! - `shopapp` - Catalog, order and group administration server
//! - `cli` - Command-line tools for migrations, seeding and user management
//!
//! # Architecture
//!
//! The core crate contains only types and validation - no I/O, no database
//! access, no HTTP. With the `postgres` feature the id newtypes gain `sqlx`
//! encode/decode support.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, prices, discounts, usernames and
//!   permission codenames

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
