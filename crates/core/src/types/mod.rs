//! Core types for the shop.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod discount;
pub mod id;
pub mod permission;
pub mod price;
pub mod username;

pub use discount::{Discount, DiscountError};
pub use id::*;
pub use permission::{PermissionCode, PermissionCodeError};
pub use price::{Price, PriceError};
pub use username::{Username, UsernameError};
