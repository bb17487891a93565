//! Customer orders.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use shopapp_core::{OrderId, ProductId, UserId};

use super::{Product, User};

/// An order row.
///
/// Orders carry no price snapshot; totals are always computed from the live
/// product prices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub delivery_address: Option<String>,
    pub promocode: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An order with its owner and product set loaded.
#[derive(Debug, Clone)]
pub struct OrderWithRelations {
    pub order: Order,
    pub owner: User,
    pub products: Vec<Product>,
}

impl OrderWithRelations {
    /// Sum of the current product prices, discount applied.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.products
            .iter()
            .map(|p| {
                let keep = Decimal::ONE_HUNDRED - Decimal::from(p.discount.percent());
                (p.price.amount() * keep / Decimal::ONE_HUNDRED).round_dp(2)
            })
            .sum()
    }
}

/// Validated input for creating an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub user_id: UserId,
    pub product_ids: Vec<ProductId>,
    pub delivery_address: Option<String>,
    pub promocode: String,
}
