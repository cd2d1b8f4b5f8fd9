//! Catalog service.
//!
//! Product create/read/update/archive/delete and the two public search
//! operations. Mutation is admin-gated at the route layer; this service only
//! enforces data rules.

use rust_decimal::Decimal;
use thiserror::Error;

use shoplite_core::ProductId;

use crate::models::{NewProduct, Product, ProductPatch};
use crate::store::{Store, StoreError};

/// Errors returned by the catalog service.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Malformed request field.
    #[error("{0}")]
    Validation(String),

    /// No product with the requested id.
    #[error("product not found")]
    NotFound,

    /// A product with this name already exists.
    #[error("product already exists")]
    DuplicateName,

    /// Store operation failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Catalog service.
pub struct CatalogService<'a> {
    store: &'a dyn Store,
}

impl<'a> CatalogService<'a> {
    /// Create a new catalog service.
    #[must_use]
    pub const fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    /// Create a product.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Validation` for empty fields or a negative
    /// price and `CatalogError::DuplicateName` if the name is taken.
    pub async fn create(&self, new: NewProduct) -> Result<Product, CatalogError> {
        if new.name.trim().is_empty() {
            return Err(CatalogError::Validation("name is required".to_owned()));
        }
        if new.description.trim().is_empty() {
            return Err(CatalogError::Validation(
                "description is required".to_owned(),
            ));
        }
        validate_price(new.price)?;

        self.store.create_product(new).await.map_err(|e| match e {
            StoreError::Conflict(_) => CatalogError::DuplicateName,
            other => CatalogError::Store(other),
        })
    }

    /// Fetch a product by id.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` if the product doesn't exist.
    pub async fn get(&self, id: ProductId) -> Result<Product, CatalogError> {
        self.store
            .product_by_id(id)
            .await?
            .ok_or(CatalogError::NotFound)
    }

    /// Every product, active or not.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Store` if the store fails.
    pub async fn list_all(&self) -> Result<Vec<Product>, CatalogError> {
        Ok(self.store.products_all().await?)
    }

    /// Products visible to the public listing.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Store` if the store fails.
    pub async fn list_active(&self) -> Result<Vec<Product>, CatalogError> {
        Ok(self.store.products_active().await?)
    }

    /// Case-insensitive substring search on the product name.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Validation` for an empty query.
    pub async fn search_by_name(&self, name: &str) -> Result<Vec<Product>, CatalogError> {
        let needle = name.trim();
        if needle.is_empty() {
            return Err(CatalogError::Validation(
                "'name' must be a non-empty string".to_owned(),
            ));
        }

        Ok(self.store.products_by_name(needle).await?)
    }

    /// Products priced within `[min, max]` inclusive.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Validation` for a negative bound or an
    /// inverted range.
    pub async fn search_by_price(
        &self,
        min: Decimal,
        max: Decimal,
    ) -> Result<Vec<Product>, CatalogError> {
        if min.is_sign_negative() || max.is_sign_negative() {
            return Err(CatalogError::Validation(
                "price bounds must be non-negative".to_owned(),
            ));
        }
        if min > max {
            return Err(CatalogError::Validation(
                "'minPrice' must not exceed 'maxPrice'".to_owned(),
            ));
        }

        Ok(self.store.products_in_price_range(min, max).await?)
    }

    /// Apply a partial update.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` if the product doesn't exist,
    /// `CatalogError::Validation` for bad fields, and
    /// `CatalogError::DuplicateName` if the new name is taken.
    pub async fn update(
        &self,
        id: ProductId,
        patch: ProductPatch,
    ) -> Result<Product, CatalogError> {
        if let Some(name) = &patch.name
            && name.trim().is_empty()
        {
            return Err(CatalogError::Validation("name cannot be empty".to_owned()));
        }
        if let Some(price) = patch.price {
            validate_price(price)?;
        }

        self.store
            .update_product(id, patch)
            .await
            .map_err(|e| match e {
                StoreError::NotFound => CatalogError::NotFound,
                StoreError::Conflict(_) => CatalogError::DuplicateName,
                other => CatalogError::Store(other),
            })
    }

    /// Archive a product (hide it from the public listing).
    ///
    /// Returns the product and whether anything changed; archiving an
    /// already-archived product is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` if the product doesn't exist.
    pub async fn archive(&self, id: ProductId) -> Result<(Product, bool), CatalogError> {
        self.set_active(id, false).await
    }

    /// Activate a product. The inverse of [`Self::archive`].
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` if the product doesn't exist.
    pub async fn activate(&self, id: ProductId) -> Result<(Product, bool), CatalogError> {
        self.set_active(id, true).await
    }

    async fn set_active(
        &self,
        id: ProductId,
        is_active: bool,
    ) -> Result<(Product, bool), CatalogError> {
        let current = self.get(id).await?;
        if current.is_active == is_active {
            return Ok((current, false));
        }

        let updated = self
            .store
            .set_product_active(id, is_active)
            .await
            .map_err(|e| match e {
                StoreError::NotFound => CatalogError::NotFound,
                other => CatalogError::Store(other),
            })?;

        Ok((updated, true))
    }

    /// Hard-delete a product. Existing cart and order lines keep their weak
    /// reference and degrade on display.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` if the product doesn't exist.
    pub async fn delete(&self, id: ProductId) -> Result<(), CatalogError> {
        self.store.delete_product(id).await.map_err(|e| match e {
            StoreError::NotFound => CatalogError::NotFound,
            other => CatalogError::Store(other),
        })
    }
}

/// Reject negative prices.
fn validate_price(price: Decimal) -> Result<(), CatalogError> {
    if price.is_sign_negative() {
        return Err(CatalogError::Validation(
            "price must be non-negative".to_owned(),
        ));
    }
    Ok(())
}
