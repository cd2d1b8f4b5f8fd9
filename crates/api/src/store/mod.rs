//! Persistence layer.
//!
//! Each aggregate gets a dyn-safe async trait; [`Store`] bundles them so the
//! rest of the crate can hold a single `Arc<dyn Store>`. Two backends exist:
//!
//! - [`postgres::PgStore`] - production backend over `PostgreSQL`
//! - [`memory::MemoryStore`] - in-process backend for tests and local
//!   development (`SHOPLITE_STORE=memory`)
//!
//! # Concurrency
//!
//! Cart writes are compare-and-swapped on the cart's `version` counter. A
//! save with a stale version fails with [`StoreError::VersionConflict`]
//! instead of silently overwriting a concurrent mutation; callers decide
//! whether to retry. Checkout ([`OrderStore::place_order`]) inserts the
//! order and clears the cart as one atomic step under the same guard.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use rust_decimal::Decimal;
use thiserror::Error;

use shoplite_core::{Email, ProductId, UserId};

use crate::models::{Cart, CartLine, NewProduct, NewUser, Order, OrderLine, Product, ProductPatch, User};

pub use postgres::{PgStore, create_pool};

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email or product name).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// A compare-and-swap write lost against a concurrent one.
    #[error("version conflict")]
    VersionConflict,

    /// Backend error from sqlx.
    #[error("backend error: {0}")]
    Backend(#[from] sqlx::Error),

    /// Data in the store is corrupted or invalid.
    #[error("data corruption: {0}")]
    Corrupt(String),
}

/// Account persistence.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Look up a user by id.
    async fn user_by_id(&self, id: UserId) -> Result<Option<User>, StoreError>;

    /// Look up a user by (normalized) email.
    async fn user_by_email(&self, email: &Email) -> Result<Option<User>, StoreError>;

    /// Create an account. Fails with [`StoreError::Conflict`] if the email
    /// is already registered.
    async fn create_user(&self, new: NewUser) -> Result<User, StoreError>;

    /// Replace a user's password hash.
    async fn update_password(&self, id: UserId, password_hash: &str) -> Result<(), StoreError>;

    /// Set the admin flag, returning the updated user.
    async fn set_admin(&self, id: UserId, is_admin: bool) -> Result<User, StoreError>;
}

/// Catalog persistence.
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Look up a product by id.
    async fn product_by_id(&self, id: ProductId) -> Result<Option<Product>, StoreError>;

    /// Every product, active or not.
    async fn products_all(&self) -> Result<Vec<Product>, StoreError>;

    /// Products with the active flag set.
    async fn products_active(&self) -> Result<Vec<Product>, StoreError>;

    /// Case-insensitive substring search on the product name.
    async fn products_by_name(&self, needle: &str) -> Result<Vec<Product>, StoreError>;

    /// Products priced within `[min, max]` inclusive.
    async fn products_in_price_range(
        &self,
        min: Decimal,
        max: Decimal,
    ) -> Result<Vec<Product>, StoreError>;

    /// Create a product. Fails with [`StoreError::Conflict`] if the name is
    /// taken.
    async fn create_product(&self, new: NewProduct) -> Result<Product, StoreError>;

    /// Apply a partial update, returning the updated product.
    async fn update_product(
        &self,
        id: ProductId,
        patch: ProductPatch,
    ) -> Result<Product, StoreError>;

    /// Set the active flag, returning the updated product.
    async fn set_product_active(
        &self,
        id: ProductId,
        is_active: bool,
    ) -> Result<Product, StoreError>;

    /// Hard-delete a product. Cart and order lines referencing it survive.
    async fn delete_product(&self, id: ProductId) -> Result<(), StoreError>;
}

/// Cart persistence.
#[async_trait]
pub trait CartStore: Send + Sync {
    /// The user's cart, if one has been created.
    async fn cart_by_user(&self, user_id: UserId) -> Result<Option<Cart>, StoreError>;

    /// Create the user's cart with its initial lines. Fails with
    /// [`StoreError::VersionConflict`] if a concurrent request created one
    /// first (callers re-fetch and merge).
    async fn create_cart(
        &self,
        user_id: UserId,
        lines: Vec<CartLine>,
        total_price: Decimal,
    ) -> Result<Cart, StoreError>;

    /// Persist new lines and total for an existing cart. Compare-and-swap:
    /// fails with [`StoreError::VersionConflict`] unless the stored version
    /// still equals `cart.version`. Returns the saved cart with its bumped
    /// version.
    async fn save_cart(&self, cart: &Cart) -> Result<Cart, StoreError>;
}

/// Order persistence.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Atomically insert a pending order and clear the user's cart.
    ///
    /// The cart clear is guarded by `cart_version`; if the cart was mutated
    /// concurrently, nothing is written and
    /// [`StoreError::VersionConflict`] is returned.
    async fn place_order(
        &self,
        user_id: UserId,
        lines: Vec<OrderLine>,
        total_price: Decimal,
        cart_version: i32,
    ) -> Result<Order, StoreError>;

    /// Every order owned by the user, oldest first.
    async fn orders_by_user(&self, user_id: UserId) -> Result<Vec<Order>, StoreError>;

    /// Every order across all users, oldest first.
    async fn orders_all(&self) -> Result<Vec<Order>, StoreError>;
}

/// The full persistence surface held by application state.
#[async_trait]
pub trait Store: UserStore + ProductStore + CartStore + OrderStore {
    /// Cheap connectivity check for the readiness probe.
    async fn ping(&self) -> Result<(), StoreError>;
}
