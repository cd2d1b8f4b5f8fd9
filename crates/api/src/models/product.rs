//! Product domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use shoplite_core::ProductId;

/// A catalog product.
///
/// Carts and orders reference products weakly by id; deleting a product
/// leaves their line items intact and only degrades how they display.
#[derive(Debug, Clone)]
pub struct Product {
    /// Unique product ID.
    pub id: ProductId,
    /// Display name (unique across the catalog).
    pub name: String,
    /// Description text.
    pub description: String,
    /// Current unit price. Non-negative.
    pub price: Decimal,
    /// Whether the product is visible in the public listing.
    pub is_active: bool,
    /// Path of the uploaded product image, if any.
    pub image_url: Option<String>,
    /// When the product was created.
    pub created_at: DateTime<Utc>,
}

/// Fields required to create a product.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub image_url: Option<String>,
}

/// Partial update applied to an existing product.
///
/// `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub image_url: Option<String>,
}
