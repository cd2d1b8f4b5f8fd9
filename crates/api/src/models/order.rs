//! Order domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use shoplite_core::{OrderId, ProductId, UserId};

/// Status given to every newly placed order. There are no further
/// transitions in scope (no cancel, pay, ship, or refund).
pub const ORDER_STATUS_PENDING: &str = "pending";

/// One line of an order, snapshotted from the cart at checkout.
///
/// Serialized as part of the order's line document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    /// Referenced product. Weak reference: display degrades if the product
    /// is later deleted.
    pub product_id: ProductId,
    /// Ordered quantity.
    pub quantity: u32,
    /// Line subtotal at checkout time.
    pub subtotal: Decimal,
}

impl From<super::CartLine> for OrderLine {
    fn from(line: super::CartLine) -> Self {
        Self {
            product_id: line.product_id,
            quantity: line.quantity,
            subtotal: line.subtotal,
        }
    }
}

/// A placed order. Immutable after creation.
#[derive(Debug, Clone)]
pub struct Order {
    /// Unique order ID.
    pub id: OrderId,
    /// Owning user.
    pub user_id: UserId,
    /// Snapshot of the cart lines at checkout. Not a live reference.
    pub lines: Vec<OrderLine>,
    /// Order total at checkout.
    pub total_price: Decimal,
    /// Free-text status; always `pending` for new orders.
    pub status: String,
    /// When the order was placed.
    pub ordered_on: DateTime<Utc>,
}
