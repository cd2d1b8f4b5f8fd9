//! Cart domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use shoplite_core::{CartId, ProductId, UserId};

/// One line of a cart: a product selection with its priced subtotal.
///
/// Serialized as part of the cart's line document, so the field names here
/// are also the stored representation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    /// Referenced product. Weak reference: the product may since have been
    /// deleted.
    pub product_id: ProductId,
    /// Selected quantity. Always positive.
    pub quantity: u32,
    /// `quantity x unit price` as of the mutation that last touched this
    /// line.
    pub subtotal: Decimal,
}

/// A user's single mutable pre-purchase cart.
///
/// Invariant: `total_price` equals the sum of the line subtotals after every
/// engine mutation.
#[derive(Debug, Clone)]
pub struct Cart {
    /// Unique cart ID.
    pub id: CartId,
    /// Owning user. At most one cart exists per user.
    pub user_id: UserId,
    /// Line items, at most one per distinct product.
    pub lines: Vec<CartLine>,
    /// Sum of the line subtotals.
    pub total_price: Decimal,
    /// Optimistic-concurrency counter; bumped by every successful save.
    pub version: i32,
    /// When the cart was first created.
    pub created_at: DateTime<Utc>,
}

impl Cart {
    /// Sum of the stored line subtotals.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.lines.iter().map(|line| line.subtotal).sum()
    }

    /// Find the line for a product, if present.
    #[must_use]
    pub fn line_for(&self, product_id: ProductId) -> Option<&CartLine> {
        self.lines.iter().find(|line| line.product_id == product_id)
    }
}
