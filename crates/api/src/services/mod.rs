//! Business-logic services.
//!
//! Services are cheap per-request constructions over `&dyn Store`:
//!
//! - [`auth::AuthService`] - accounts, passwords, admin promotion
//! - [`cart::CartService`] - the per-user cart engine
//! - [`checkout::CheckoutService`] - cart-to-order snapshots and history
//! - [`catalog::CatalogService`] - product CRUD and search

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod checkout;

pub use auth::{AuthError, AuthService, Claims, TokenError, TokenService};
pub use cart::{CartError, CartService};
pub use catalog::{CatalogError, CatalogService};
pub use checkout::{CheckoutError, CheckoutService};

/// Display name rendered for a line whose product reference no longer
/// resolves.
pub const MISSING_PRODUCT_NAME: &str = "Unknown product";
