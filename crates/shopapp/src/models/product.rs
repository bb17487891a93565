//! Catalog product.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use shopapp_core::{Discount, Price, ProductId};

/// A catalog product.
///
/// Products are never physically deleted; archiving sets `archived` and
/// hides the product from customer-facing listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Price,
    pub discount: Discount,
    pub created_at: DateTime<Utc>,
    pub archived: bool,
}

/// Validated field set used by both create and update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductInput {
    pub name: String,
    pub description: String,
    pub price: Price,
    pub discount: Discount,
}

impl ProductInput {
    /// Input for a product that only has a name, as created by the seed command.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            price: Price::ZERO,
            discount: Discount::NONE,
        }
    }
}

/// Which products a listing should include.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductScope {
    /// Only products with `archived = false`. Use for anything customers see.
    Live,
    /// Every row, archived or not.
    All,
}

impl ProductScope {
    /// Whether a product belongs to this scope.
    #[must_use]
    pub const fn includes(self, product: &Product) -> bool {
        match self {
            Self::Live => !product.archived,
            Self::All => true,
        }
    }
}
