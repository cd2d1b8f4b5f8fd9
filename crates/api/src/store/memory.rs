//! In-memory store backend.
//!
//! Backs the test suite and the `SHOPLITE_STORE=memory` development mode.
//! Semantics mirror the `PostgreSQL` backend, including unique-constraint
//! conflicts and compare-and-swap cart saves.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;

use shoplite_core::{CartId, Email, OrderId, ProductId, UserId};

use crate::models::{
    Cart, CartLine, NewProduct, NewUser, Order, OrderLine, Product, ProductPatch, User,
    order::ORDER_STATUS_PENDING,
};

use super::{CartStore, OrderStore, ProductStore, Store, StoreError, UserStore};

#[derive(Default)]
struct Inner {
    users: HashMap<i32, User>,
    products: HashMap<i32, Product>,
    carts: HashMap<i32, Cart>,
    orders: HashMap<i32, Order>,
    next_id: i32,
}

impl Inner {
    fn next_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }
}

/// In-process [`Store`] implementation.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn locked(&self) -> MutexGuard<'_, Inner> {
        // A poisoned lock only means another test panicked mid-write.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn sorted_by_id<T>(mut items: Vec<T>, id_of: impl Fn(&T) -> i32) -> Vec<T> {
    items.sort_by_key(|item| id_of(item));
    items
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn user_by_id(&self, id: UserId) -> Result<Option<User>, StoreError> {
        Ok(self.locked().users.get(&id.as_i32()).cloned())
    }

    async fn user_by_email(&self, email: &Email) -> Result<Option<User>, StoreError> {
        Ok(self
            .locked()
            .users
            .values()
            .find(|user| &user.email == email)
            .cloned())
    }

    async fn create_user(&self, new: NewUser) -> Result<User, StoreError> {
        let mut inner = self.locked();

        if inner.users.values().any(|user| user.email == new.email) {
            return Err(StoreError::Conflict("email already registered".to_owned()));
        }

        let id = inner.next_id();
        let user = User {
            id: UserId::new(id),
            first_name: new.first_name,
            last_name: new.last_name,
            email: new.email,
            mobile_no: new.mobile_no,
            password_hash: new.password_hash,
            is_admin: false,
            created_at: Utc::now(),
        };
        inner.users.insert(id, user.clone());

        Ok(user)
    }

    async fn update_password(&self, id: UserId, password_hash: &str) -> Result<(), StoreError> {
        let mut inner = self.locked();
        let user = inner
            .users
            .get_mut(&id.as_i32())
            .ok_or(StoreError::NotFound)?;
        user.password_hash = password_hash.to_owned();
        Ok(())
    }

    async fn set_admin(&self, id: UserId, is_admin: bool) -> Result<User, StoreError> {
        let mut inner = self.locked();
        let user = inner
            .users
            .get_mut(&id.as_i32())
            .ok_or(StoreError::NotFound)?;
        user.is_admin = is_admin;
        Ok(user.clone())
    }
}

#[async_trait]
impl ProductStore for MemoryStore {
    async fn product_by_id(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        Ok(self.locked().products.get(&id.as_i32()).cloned())
    }

    async fn products_all(&self) -> Result<Vec<Product>, StoreError> {
        let products = self.locked().products.values().cloned().collect();
        Ok(sorted_by_id(products, |p: &Product| p.id.as_i32()))
    }

    async fn products_active(&self) -> Result<Vec<Product>, StoreError> {
        let products = self
            .locked()
            .products
            .values()
            .filter(|product| product.is_active)
            .cloned()
            .collect();
        Ok(sorted_by_id(products, |p: &Product| p.id.as_i32()))
    }

    async fn products_by_name(&self, needle: &str) -> Result<Vec<Product>, StoreError> {
        let needle = needle.to_lowercase();
        let products = self
            .locked()
            .products
            .values()
            .filter(|product| product.name.to_lowercase().contains(&needle))
            .cloned()
            .collect();
        Ok(sorted_by_id(products, |p: &Product| p.id.as_i32()))
    }

    async fn products_in_price_range(
        &self,
        min: Decimal,
        max: Decimal,
    ) -> Result<Vec<Product>, StoreError> {
        let products = self
            .locked()
            .products
            .values()
            .filter(|product| product.price >= min && product.price <= max)
            .cloned()
            .collect();
        Ok(sorted_by_id(products, |p: &Product| p.id.as_i32()))
    }

    async fn create_product(&self, new: NewProduct) -> Result<Product, StoreError> {
        let mut inner = self.locked();

        if inner.products.values().any(|product| product.name == new.name) {
            return Err(StoreError::Conflict("product name already exists".to_owned()));
        }

        let id = inner.next_id();
        let product = Product {
            id: ProductId::new(id),
            name: new.name,
            description: new.description,
            price: new.price,
            is_active: true,
            image_url: new.image_url,
            created_at: Utc::now(),
        };
        inner.products.insert(id, product.clone());

        Ok(product)
    }

    async fn update_product(
        &self,
        id: ProductId,
        patch: ProductPatch,
    ) -> Result<Product, StoreError> {
        let mut inner = self.locked();

        if let Some(new_name) = &patch.name
            && inner
                .products
                .values()
                .any(|product| product.id != id && &product.name == new_name)
        {
            return Err(StoreError::Conflict("product name already exists".to_owned()));
        }

        let product = inner
            .products
            .get_mut(&id.as_i32())
            .ok_or(StoreError::NotFound)?;

        if let Some(name) = patch.name {
            product.name = name;
        }
        if let Some(description) = patch.description {
            product.description = description;
        }
        if let Some(price) = patch.price {
            product.price = price;
        }
        if let Some(image_url) = patch.image_url {
            product.image_url = Some(image_url);
        }

        Ok(product.clone())
    }

    async fn set_product_active(
        &self,
        id: ProductId,
        is_active: bool,
    ) -> Result<Product, StoreError> {
        let mut inner = self.locked();
        let product = inner
            .products
            .get_mut(&id.as_i32())
            .ok_or(StoreError::NotFound)?;
        product.is_active = is_active;
        Ok(product.clone())
    }

    async fn delete_product(&self, id: ProductId) -> Result<(), StoreError> {
        self.locked()
            .products
            .remove(&id.as_i32())
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }
}

#[async_trait]
impl CartStore for MemoryStore {
    async fn cart_by_user(&self, user_id: UserId) -> Result<Option<Cart>, StoreError> {
        Ok(self
            .locked()
            .carts
            .values()
            .find(|cart| cart.user_id == user_id)
            .cloned())
    }

    async fn create_cart(
        &self,
        user_id: UserId,
        lines: Vec<CartLine>,
        total_price: Decimal,
    ) -> Result<Cart, StoreError> {
        let mut inner = self.locked();

        if inner.carts.values().any(|cart| cart.user_id == user_id) {
            return Err(StoreError::VersionConflict);
        }

        let id = inner.next_id();
        let cart = Cart {
            id: CartId::new(id),
            user_id,
            lines,
            total_price,
            version: 0,
            created_at: Utc::now(),
        };
        inner.carts.insert(id, cart.clone());

        Ok(cart)
    }

    async fn save_cart(&self, cart: &Cart) -> Result<Cart, StoreError> {
        let mut inner = self.locked();
        let stored = inner
            .carts
            .get_mut(&cart.id.as_i32())
            .ok_or(StoreError::NotFound)?;

        if stored.version != cart.version {
            return Err(StoreError::VersionConflict);
        }

        stored.lines = cart.lines.clone();
        stored.total_price = cart.total_price;
        stored.version += 1;

        Ok(stored.clone())
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn place_order(
        &self,
        user_id: UserId,
        lines: Vec<OrderLine>,
        total_price: Decimal,
        cart_version: i32,
    ) -> Result<Order, StoreError> {
        let mut inner = self.locked();

        // Guard the cart clear before writing anything, so a conflict
        // leaves the store untouched.
        let cart_id = {
            let cart = inner
                .carts
                .values()
                .find(|cart| cart.user_id == user_id)
                .ok_or(StoreError::VersionConflict)?;
            if cart.version != cart_version {
                return Err(StoreError::VersionConflict);
            }
            cart.id.as_i32()
        };

        let id = inner.next_id();
        let order = Order {
            id: OrderId::new(id),
            user_id,
            lines,
            total_price,
            status: ORDER_STATUS_PENDING.to_owned(),
            ordered_on: Utc::now(),
        };
        inner.orders.insert(id, order.clone());

        if let Some(cart) = inner.carts.get_mut(&cart_id) {
            cart.lines.clear();
            cart.total_price = Decimal::ZERO;
            cart.version += 1;
        }

        Ok(order)
    }

    async fn orders_by_user(&self, user_id: UserId) -> Result<Vec<Order>, StoreError> {
        let orders = self
            .locked()
            .orders
            .values()
            .filter(|order| order.user_id == user_id)
            .cloned()
            .collect();
        Ok(sorted_by_id(orders, |o: &Order| o.id.as_i32()))
    }

    async fn orders_all(&self) -> Result<Vec<Order>, StoreError> {
        let orders = self.locked().orders.values().cloned().collect();
        Ok(sorted_by_id(orders, |o: &Order| o.id.as_i32()))
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample_product(name: &str, price: u32) -> NewProduct {
        NewProduct {
            name: name.to_owned(),
            description: format!("{name} description"),
            price: Decimal::from(price),
            image_url: None,
        }
    }

    #[tokio::test]
    async fn test_duplicate_product_name_conflicts() {
        let store = MemoryStore::new();
        store.create_product(sample_product("Mug", 10)).await.unwrap();

        let err = store
            .create_product(sample_product("Mug", 12))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_save_cart_rejects_stale_version() {
        let store = MemoryStore::new();
        let user = UserId::new(1);
        let cart = store
            .create_cart(user, Vec::new(), Decimal::ZERO)
            .await
            .unwrap();

        let first = store.save_cart(&cart).await.unwrap();
        assert_eq!(first.version, 1);

        // Saving from the original (stale) snapshot must fail.
        let err = store.save_cart(&cart).await.unwrap_err();
        assert!(matches!(err, StoreError::VersionConflict));
    }

    #[tokio::test]
    async fn test_place_order_clears_cart_atomically() {
        let store = MemoryStore::new();
        let user = UserId::new(1);
        let product = store.create_product(sample_product("Mug", 10)).await.unwrap();

        let line = CartLine {
            product_id: product.id,
            quantity: 2,
            subtotal: Decimal::from(20),
        };
        let cart = store
            .create_cart(user, vec![line.clone()], Decimal::from(20))
            .await
            .unwrap();

        let order = store
            .place_order(
                user,
                vec![OrderLine::from(line)],
                Decimal::from(20),
                cart.version,
            )
            .await
            .unwrap();
        assert_eq!(order.status, ORDER_STATUS_PENDING);

        let cleared = store.cart_by_user(user).await.unwrap().unwrap();
        assert!(cleared.lines.is_empty());
        assert_eq!(cleared.total_price, Decimal::ZERO);
        assert_eq!(cleared.version, cart.version + 1);
    }

    #[tokio::test]
    async fn test_place_order_stale_cart_version_writes_nothing() {
        let store = MemoryStore::new();
        let user = UserId::new(1);
        let cart = store
            .create_cart(user, Vec::new(), Decimal::ZERO)
            .await
            .unwrap();

        let err = store
            .place_order(user, Vec::new(), Decimal::from(5), cart.version + 1)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::VersionConflict));
        assert!(store.orders_by_user(user).await.unwrap().is_empty());
    }
}
