//! Checkout engine.
//!
//! Snapshots the user's stored cart into a durable order and serves order
//! history. The stored cart is the authoritative source: checkout reads it
//! server-side, validates every product reference, and the store clears the
//! cart in the same transaction that inserts the order, guarded by the cart
//! version.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

use shoplite_core::{OrderId, ProductId, UserId};

use crate::models::{Order, OrderLine};
use crate::store::{Store, StoreError};

use super::MISSING_PRODUCT_NAME;

/// Errors returned by the checkout engine.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The user has no cart.
    #[error("cart not found")]
    CartNotFound,

    /// The cart has no line items.
    #[error("cart is empty")]
    EmptyCart,

    /// A cart line references a product that no longer exists.
    #[error("product {0} not found")]
    MissingProduct(ProductId),

    /// The cart total is zero; free orders are not accepted.
    #[error("order total must be greater than zero")]
    ZeroTotal,

    /// The cart changed while checkout was running.
    #[error("cart was modified concurrently")]
    Conflict,

    /// Store operation failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// One order line as displayed, enriched with the product name.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineView {
    pub product_id: Option<ProductId>,
    pub product_name: String,
    pub quantity: u32,
    pub subtotal: Decimal,
}

/// An order as displayed in history views.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderView {
    pub id: OrderId,
    pub user_id: UserId,
    pub products_ordered: Vec<OrderLineView>,
    pub total_price: Decimal,
    pub status: String,
    pub ordered_on: DateTime<Utc>,
}

/// Checkout engine.
pub struct CheckoutService<'a> {
    store: &'a dyn Store,
}

impl<'a> CheckoutService<'a> {
    /// Create a new checkout engine.
    #[must_use]
    pub const fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    /// Convert the user's cart into a pending order and clear the cart.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::CartNotFound` / `EmptyCart` / `ZeroTotal` /
    /// `MissingProduct` on validation failure and `CheckoutError::Conflict`
    /// if the cart was mutated concurrently.
    pub async fn checkout(&self, user_id: UserId) -> Result<Order, CheckoutError> {
        let cart = self
            .store
            .cart_by_user(user_id)
            .await?
            .ok_or(CheckoutError::CartNotFound)?;

        if cart.lines.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        for line in &cart.lines {
            if self.store.product_by_id(line.product_id).await?.is_none() {
                return Err(CheckoutError::MissingProduct(line.product_id));
            }
        }

        let total_price = cart.line_total();
        if total_price.is_zero() {
            return Err(CheckoutError::ZeroTotal);
        }

        let lines: Vec<OrderLine> = cart.lines.iter().cloned().map(OrderLine::from).collect();

        self.store
            .place_order(user_id, lines, total_price, cart.version)
            .await
            .map_err(|e| match e {
                StoreError::VersionConflict => CheckoutError::Conflict,
                other => CheckoutError::Store(other),
            })
    }

    /// Every order owned by the user, enriched with product names.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::Store` if the store fails.
    pub async fn my_orders(&self, user_id: UserId) -> Result<Vec<OrderView>, CheckoutError> {
        let orders = self.store.orders_by_user(user_id).await?;
        self.render(orders).await
    }

    /// Every order across all users, enriched with product names.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::Store` if the store fails.
    pub async fn all_orders(&self) -> Result<Vec<OrderView>, CheckoutError> {
        let orders = self.store.orders_all().await?;
        self.render(orders).await
    }

    async fn render(&self, orders: Vec<Order>) -> Result<Vec<OrderView>, CheckoutError> {
        // Product names are looked up once per distinct product across the
        // whole listing. A dangling reference renders a placeholder rather
        // than failing the request.
        let mut names: HashMap<ProductId, Option<String>> = HashMap::new();

        let mut views = Vec::with_capacity(orders.len());
        for order in orders {
            let mut lines = Vec::with_capacity(order.lines.len());
            for line in &order.lines {
                let name = match names.get(&line.product_id) {
                    Some(cached) => cached.clone(),
                    None => {
                        let name = self
                            .store
                            .product_by_id(line.product_id)
                            .await?
                            .map(|product| product.name);
                        names.insert(line.product_id, name.clone());
                        name
                    }
                };

                lines.push(match name {
                    Some(name) => OrderLineView {
                        product_id: Some(line.product_id),
                        product_name: name,
                        quantity: line.quantity,
                        subtotal: line.subtotal,
                    },
                    None => OrderLineView {
                        product_id: None,
                        product_name: MISSING_PRODUCT_NAME.to_owned(),
                        quantity: line.quantity,
                        subtotal: line.subtotal,
                    },
                });
            }

            views.push(OrderView {
                id: order.id,
                user_id: order.user_id,
                products_ordered: lines,
                total_price: order.total_price,
                status: order.status,
                ordered_on: order.ordered_on,
            });
        }

        Ok(views)
    }
}
