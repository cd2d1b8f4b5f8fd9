//! `PostgreSQL` store backend.
//!
//! Uses the sqlx runtime query API; rows are decoded into private row
//! structs and converted into domain types, with stored values re-validated
//! on the way out. Cart and order lines live in JSONB documents on their
//! owning row.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/api/migrations/` and run via:
//! ```bash
//! cargo run -p shoplite-cli -- migrate
//! ```

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use secrecy::ExposeSecret;
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};

use shoplite_core::{Email, MobileNumber, ProductId, UserId};

use crate::models::{
    Cart, CartLine, NewProduct, NewUser, Order, OrderLine, Product, ProductPatch, User,
};

use super::{CartStore, OrderStore, ProductStore, Store, StoreError, UserStore};

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// `PostgreSQL`-backed [`Store`] implementation.
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Wrap an existing connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Access the underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

// =============================================================================
// Row types
// =============================================================================

#[derive(FromRow)]
struct UserRow {
    id: i32,
    first_name: String,
    last_name: String,
    email: String,
    mobile_no: String,
    password_hash: String,
    is_admin: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(row: UserRow) -> Result<Self, StoreError> {
        let email = Email::parse(&row.email)
            .map_err(|e| StoreError::Corrupt(format!("invalid email in store: {e}")))?;
        let mobile_no = MobileNumber::parse(&row.mobile_no)
            .map_err(|e| StoreError::Corrupt(format!("invalid mobile number in store: {e}")))?;

        Ok(Self {
            id: UserId::new(row.id),
            first_name: row.first_name,
            last_name: row.last_name,
            email,
            mobile_no,
            password_hash: row.password_hash,
            is_admin: row.is_admin,
            created_at: row.created_at,
        })
    }
}

#[derive(FromRow)]
struct ProductRow {
    id: i32,
    name: String,
    description: String,
    price: Decimal,
    is_active: bool,
    image_url: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: ProductId::new(row.id),
            name: row.name,
            description: row.description,
            price: row.price,
            is_active: row.is_active,
            image_url: row.image_url,
            created_at: row.created_at,
        }
    }
}

#[derive(FromRow)]
struct CartRow {
    id: i32,
    user_id: i32,
    lines: Json<Vec<CartLine>>,
    total_price: Decimal,
    version: i32,
    created_at: DateTime<Utc>,
}

impl From<CartRow> for Cart {
    fn from(row: CartRow) -> Self {
        Self {
            id: shoplite_core::CartId::new(row.id),
            user_id: UserId::new(row.user_id),
            lines: row.lines.0,
            total_price: row.total_price,
            version: row.version,
            created_at: row.created_at,
        }
    }
}

#[derive(FromRow)]
struct OrderRow {
    id: i32,
    user_id: i32,
    lines: Json<Vec<OrderLine>>,
    total_price: Decimal,
    status: String,
    ordered_on: DateTime<Utc>,
}

impl From<OrderRow> for Order {
    fn from(row: OrderRow) -> Self {
        Self {
            id: shoplite_core::OrderId::new(row.id),
            user_id: UserId::new(row.user_id),
            lines: row.lines.0,
            total_price: row.total_price,
            status: row.status,
            ordered_on: row.ordered_on,
        }
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Map a unique-constraint violation to [`StoreError::Conflict`].
fn conflict_on_unique(e: sqlx::Error, message: &str) -> StoreError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return StoreError::Conflict(message.to_owned());
    }
    StoreError::Backend(e)
}

/// Escape LIKE metacharacters and wrap the needle in wildcards.
fn like_pattern(needle: &str) -> String {
    let escaped = needle
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

const USER_COLUMNS: &str =
    "id, first_name, last_name, email, mobile_no, password_hash, is_admin, created_at";
const PRODUCT_COLUMNS: &str = "id, name, description, price, is_active, image_url, created_at";
const CART_COLUMNS: &str = "id, user_id, lines, total_price, version, created_at";
const ORDER_COLUMNS: &str = "id, user_id, lines, total_price, status, ordered_on";

// =============================================================================
// Trait implementations
// =============================================================================

#[async_trait]
impl UserStore for PgStore {
    async fn user_by_id(&self, id: UserId) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id.as_i32())
        .fetch_optional(&self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    async fn user_by_email(&self, email: &Email) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    async fn create_user(&self, new: NewUser) -> Result<User, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "INSERT INTO users (first_name, last_name, email, mobile_no, password_hash)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {USER_COLUMNS}"
        ))
        .bind(&new.first_name)
        .bind(&new.last_name)
        .bind(new.email.as_str())
        .bind(new.mobile_no.as_str())
        .bind(&new.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "email already registered"))?;

        User::try_from(row)
    }

    async fn update_password(&self, id: UserId, password_hash: &str) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE users SET password_hash = $1 WHERE id = $2")
            .bind(password_hash)
            .bind(id.as_i32())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }

        Ok(())
    }

    async fn set_admin(&self, id: UserId, is_admin: bool) -> Result<User, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "UPDATE users SET is_admin = $1 WHERE id = $2 RETURNING {USER_COLUMNS}"
        ))
        .bind(is_admin)
        .bind(id.as_i32())
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound)?;

        User::try_from(row)
    }
}

#[async_trait]
impl ProductStore for PgStore {
    async fn product_by_id(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id.as_i32())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Product::from))
    }

    async fn products_all(&self) -> Result<Vec<Product>, StoreError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    async fn products_active(&self) -> Result<Vec<Product>, StoreError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE is_active ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    async fn products_by_name(&self, needle: &str) -> Result<Vec<Product>, StoreError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE name ILIKE $1 ORDER BY id"
        ))
        .bind(like_pattern(needle))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    async fn products_in_price_range(
        &self,
        min: Decimal,
        max: Decimal,
    ) -> Result<Vec<Product>, StoreError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE price BETWEEN $1 AND $2 ORDER BY id"
        ))
        .bind(min)
        .bind(max)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    async fn create_product(&self, new: NewProduct) -> Result<Product, StoreError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "INSERT INTO products (name, description, price, image_url)
             VALUES ($1, $2, $3, $4)
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(&new.name)
        .bind(&new.description)
        .bind(new.price)
        .bind(&new.image_url)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "product name already exists"))?;

        Ok(Product::from(row))
    }

    async fn update_product(
        &self,
        id: ProductId,
        patch: ProductPatch,
    ) -> Result<Product, StoreError> {
        let current = self.product_by_id(id).await?.ok_or(StoreError::NotFound)?;

        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "UPDATE products SET name = $1, description = $2, price = $3, image_url = $4
             WHERE id = $5
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(patch.name.unwrap_or(current.name))
        .bind(patch.description.unwrap_or(current.description))
        .bind(patch.price.unwrap_or(current.price))
        .bind(patch.image_url.or(current.image_url))
        .bind(id.as_i32())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "product name already exists"))?
        .ok_or(StoreError::NotFound)?;

        Ok(Product::from(row))
    }

    async fn set_product_active(
        &self,
        id: ProductId,
        is_active: bool,
    ) -> Result<Product, StoreError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "UPDATE products SET is_active = $1 WHERE id = $2 RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(is_active)
        .bind(id.as_i32())
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound)?;

        Ok(Product::from(row))
    }

    async fn delete_product(&self, id: ProductId) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id.as_i32())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }

        Ok(())
    }
}

#[async_trait]
impl CartStore for PgStore {
    async fn cart_by_user(&self, user_id: UserId) -> Result<Option<Cart>, StoreError> {
        let row = sqlx::query_as::<_, CartRow>(&format!(
            "SELECT {CART_COLUMNS} FROM carts WHERE user_id = $1"
        ))
        .bind(user_id.as_i32())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Cart::from))
    }

    async fn create_cart(
        &self,
        user_id: UserId,
        lines: Vec<CartLine>,
        total_price: Decimal,
    ) -> Result<Cart, StoreError> {
        let row = sqlx::query_as::<_, CartRow>(&format!(
            "INSERT INTO carts (user_id, lines, total_price)
             VALUES ($1, $2, $3)
             RETURNING {CART_COLUMNS}"
        ))
        .bind(user_id.as_i32())
        .bind(Json(lines))
        .bind(total_price)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            // A second request created the cart first; callers re-fetch and
            // merge, so this surfaces as a retryable version conflict.
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return StoreError::VersionConflict;
            }
            StoreError::Backend(e)
        })?;

        Ok(Cart::from(row))
    }

    async fn save_cart(&self, cart: &Cart) -> Result<Cart, StoreError> {
        let row = sqlx::query_as::<_, CartRow>(&format!(
            "UPDATE carts SET lines = $1, total_price = $2, version = version + 1
             WHERE id = $3 AND version = $4
             RETURNING {CART_COLUMNS}"
        ))
        .bind(Json(cart.lines.clone()))
        .bind(cart.total_price)
        .bind(cart.id.as_i32())
        .bind(cart.version)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Cart::from(row)),
            None => {
                let exists = sqlx::query_scalar::<_, i32>("SELECT id FROM carts WHERE id = $1")
                    .bind(cart.id.as_i32())
                    .fetch_optional(&self.pool)
                    .await?;

                match exists {
                    Some(_) => Err(StoreError::VersionConflict),
                    None => Err(StoreError::NotFound),
                }
            }
        }
    }
}

#[async_trait]
impl OrderStore for PgStore {
    async fn place_order(
        &self,
        user_id: UserId,
        lines: Vec<OrderLine>,
        total_price: Decimal,
        cart_version: i32,
    ) -> Result<Order, StoreError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "INSERT INTO orders (user_id, lines, total_price)
             VALUES ($1, $2, $3)
             RETURNING {ORDER_COLUMNS}"
        ))
        .bind(user_id.as_i32())
        .bind(Json(lines))
        .bind(total_price)
        .fetch_one(&mut *tx)
        .await?;

        let cleared = sqlx::query(
            "UPDATE carts SET lines = '[]'::jsonb, total_price = 0, version = version + 1
             WHERE user_id = $1 AND version = $2",
        )
        .bind(user_id.as_i32())
        .bind(cart_version)
        .execute(&mut *tx)
        .await?;

        if cleared.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(StoreError::VersionConflict);
        }

        tx.commit().await?;

        Ok(Order::from(row))
    }

    async fn orders_by_user(&self, user_id: UserId) -> Result<Vec<Order>, StoreError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 ORDER BY id"
        ))
        .bind(user_id.as_i32())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Order::from).collect())
    }

    async fn orders_all(&self) -> Result<Vec<Order>, StoreError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Order::from).collect())
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_escapes_metacharacters() {
        assert_eq!(like_pattern("plain"), "%plain%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(like_pattern("back\\slash"), "%back\\\\slash%");
    }
}
