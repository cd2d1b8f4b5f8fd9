//! Cart engine.
//!
//! Maintains the single cart per authenticated user and keeps its total
//! consistent with its line items: after every mutation,
//! `total_price == sum(line.subtotal)`.
//!
//! Subtotals are always derived server-side from the stored product price;
//! nothing price-shaped is trusted from the request body.
//!
//! Every mutation is a fetch-modify-save cycle whose save is
//! compare-and-swapped on the cart version. A lost race is retried a bounded
//! number of times and then surfaced as [`CartError::Conflict`] rather than
//! silently overwriting the concurrent update.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

use shoplite_core::{CartId, ProductId, UserId};

use crate::models::{Cart, CartLine, Product};
use crate::store::{Store, StoreError};

use super::MISSING_PRODUCT_NAME;

/// Attempts per mutation before giving up on a contended cart.
const MAX_SAVE_ATTEMPTS: usize = 3;

/// Errors returned by the cart engine.
#[derive(Debug, Error)]
pub enum CartError {
    /// Malformed request field.
    #[error("{0}")]
    Validation(String),

    /// The user has no cart yet.
    #[error("cart not found")]
    CartNotFound,

    /// The cart has no line for the requested product.
    #[error("item not found in cart")]
    LineNotFound,

    /// The referenced product does not exist.
    #[error("product {0} not found")]
    ProductNotFound(ProductId),

    /// The cart kept changing under us; the client should retry.
    #[error("cart was modified concurrently")]
    Conflict,

    /// Store operation failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// One line of the cart as displayed, joined with the current product.
///
/// `subtotal` here is recomputed from the current unit price at read time;
/// a line whose product no longer resolves keeps its stored subtotal and
/// renders a placeholder name.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineView {
    pub product_id: Option<ProductId>,
    pub name: String,
    pub price: Option<Decimal>,
    pub quantity: u32,
    pub subtotal: Decimal,
}

/// The cart as displayed.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub id: CartId,
    pub user_id: UserId,
    pub cart_items: Vec<CartLineView>,
    pub total_price: Decimal,
    pub created_at: DateTime<Utc>,
}

/// Cart engine.
pub struct CartService<'a> {
    store: &'a dyn Store,
}

impl<'a> CartService<'a> {
    /// Create a new cart engine.
    #[must_use]
    pub const fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    /// The user's cart joined with current product data.
    ///
    /// # Errors
    ///
    /// Returns `CartError::CartNotFound` if the user has no cart.
    pub async fn get_cart(&self, user_id: UserId) -> Result<CartView, CartError> {
        let cart = self
            .store
            .cart_by_user(user_id)
            .await?
            .ok_or(CartError::CartNotFound)?;

        let mut items = Vec::with_capacity(cart.lines.len());
        for line in &cart.lines {
            items.push(match self.store.product_by_id(line.product_id).await? {
                Some(product) => CartLineView {
                    product_id: Some(product.id),
                    name: product.name,
                    price: Some(product.price),
                    quantity: line.quantity,
                    subtotal: product.price * Decimal::from(line.quantity),
                },
                None => CartLineView {
                    product_id: None,
                    name: MISSING_PRODUCT_NAME.to_owned(),
                    price: None,
                    quantity: line.quantity,
                    subtotal: line.subtotal,
                },
            });
        }

        let total_price = items.iter().map(|item| item.subtotal).sum();

        Ok(CartView {
            id: cart.id,
            user_id: cart.user_id,
            cart_items: items,
            total_price,
            created_at: cart.created_at,
        })
    }

    /// Add a product to the cart, creating the cart on first use and
    /// merging into an existing line for the same product.
    ///
    /// Returns the updated cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Validation` for a non-positive quantity and
    /// `CartError::ProductNotFound` if the product doesn't exist.
    pub async fn add_item(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<Cart, CartError> {
        let quantity = positive_quantity(quantity)?;

        let product = self
            .store
            .product_by_id(product_id)
            .await?
            .ok_or(CartError::ProductNotFound(product_id))?;

        for _ in 0..MAX_SAVE_ATTEMPTS {
            match self.try_add(user_id, &product, quantity).await {
                Err(CartError::Store(StoreError::VersionConflict)) => (),
                other => return other,
            }
        }

        Err(CartError::Conflict)
    }

    async fn try_add(
        &self,
        user_id: UserId,
        product: &Product,
        quantity: u32,
    ) -> Result<Cart, CartError> {
        let added_subtotal = product.price * Decimal::from(quantity);

        let Some(mut cart) = self.store.cart_by_user(user_id).await? else {
            let line = CartLine {
                product_id: product.id,
                quantity,
                subtotal: added_subtotal,
            };
            return Ok(self.store.create_cart(user_id, vec![line], added_subtotal).await?);
        };

        match cart
            .lines
            .iter_mut()
            .find(|line| line.product_id == product.id)
        {
            Some(line) => {
                line.quantity += quantity;
                line.subtotal += added_subtotal;
            }
            None => cart.lines.push(CartLine {
                product_id: product.id,
                quantity,
                subtotal: added_subtotal,
            }),
        }
        cart.total_price = cart.line_total();

        Ok(self.store.save_cart(&cart).await?)
    }

    /// Set the quantity of an existing line, repricing it from the current
    /// product price. Returns the new cart total.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Validation` for a non-positive quantity;
    /// `CartError::CartNotFound` / `LineNotFound` / `ProductNotFound` when
    /// the respective record is absent.
    pub async fn update_quantity(
        &self,
        user_id: UserId,
        product_id: ProductId,
        new_quantity: i64,
    ) -> Result<Decimal, CartError> {
        let new_quantity = positive_quantity(new_quantity)?;

        for _ in 0..MAX_SAVE_ATTEMPTS {
            match self.try_update(user_id, product_id, new_quantity).await {
                Err(CartError::Store(StoreError::VersionConflict)) => (),
                other => return other,
            }
        }

        Err(CartError::Conflict)
    }

    async fn try_update(
        &self,
        user_id: UserId,
        product_id: ProductId,
        new_quantity: u32,
    ) -> Result<Decimal, CartError> {
        let mut cart = self
            .store
            .cart_by_user(user_id)
            .await?
            .ok_or(CartError::CartNotFound)?;

        if cart.line_for(product_id).is_none() {
            return Err(CartError::LineNotFound);
        }

        let product = self
            .store
            .product_by_id(product_id)
            .await?
            .ok_or(CartError::ProductNotFound(product_id))?;

        if let Some(line) = cart
            .lines
            .iter_mut()
            .find(|line| line.product_id == product_id)
        {
            line.quantity = new_quantity;
            line.subtotal = product.price * Decimal::from(new_quantity);
        }
        cart.total_price = cart.line_total();

        let saved = self.store.save_cart(&cart).await?;
        Ok(saved.total_price)
    }

    /// Remove a line from the cart. Returns the new cart total.
    ///
    /// # Errors
    ///
    /// Returns `CartError::CartNotFound` / `LineNotFound` when the cart or
    /// line is absent.
    pub async fn remove_item(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<Decimal, CartError> {
        for _ in 0..MAX_SAVE_ATTEMPTS {
            match self.try_remove(user_id, product_id).await {
                Err(CartError::Store(StoreError::VersionConflict)) => (),
                other => return other,
            }
        }

        Err(CartError::Conflict)
    }

    async fn try_remove(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<Decimal, CartError> {
        let mut cart = self
            .store
            .cart_by_user(user_id)
            .await?
            .ok_or(CartError::CartNotFound)?;

        if cart.line_for(product_id).is_none() {
            return Err(CartError::LineNotFound);
        }

        cart.lines.retain(|line| line.product_id != product_id);
        cart.total_price = cart.line_total();

        let saved = self.store.save_cart(&cart).await?;
        Ok(saved.total_price)
    }

    /// Empty the cart. Returns the new (zero) total.
    ///
    /// # Errors
    ///
    /// Returns `CartError::CartNotFound` if the user has no cart.
    pub async fn clear_cart(&self, user_id: UserId) -> Result<Decimal, CartError> {
        for _ in 0..MAX_SAVE_ATTEMPTS {
            match self.try_clear(user_id).await {
                Err(CartError::Store(StoreError::VersionConflict)) => (),
                other => return other,
            }
        }

        Err(CartError::Conflict)
    }

    async fn try_clear(&self, user_id: UserId) -> Result<Decimal, CartError> {
        let mut cart = self
            .store
            .cart_by_user(user_id)
            .await?
            .ok_or(CartError::CartNotFound)?;

        cart.lines.clear();
        cart.total_price = Decimal::ZERO;

        let saved = self.store.save_cart(&cart).await?;
        Ok(saved.total_price)
    }
}

/// Validate and narrow a wire quantity.
fn positive_quantity(quantity: i64) -> Result<u32, CartError> {
    if quantity <= 0 {
        return Err(CartError::Validation(
            "quantity must be greater than zero".to_owned(),
        ));
    }

    u32::try_from(quantity).map_err(|_| CartError::Validation("quantity too large".to_owned()))
}
