//! Product catalog route handlers.
//!
//! Create and update accept `multipart/form-data` so an image file can ride
//! along with the product fields. Uploaded images are written under the
//! configured upload directory with a fresh UUID filename and served
//! statically from `/uploads`.

use std::ffi::OsStr;
use std::path::Path as FsPath;

use axum::{
    Json,
    extract::{Multipart, Path, State, multipart::Field},
    http::StatusCode,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shoplite_core::ProductId;

use crate::error::{ApiError, Result};
use crate::middleware::RequireAdmin;
use crate::models::{NewProduct, Product, ProductPatch};
use crate::services::CatalogService;
use crate::state::AppState;

/// Public view of a product.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductView {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub is_active: bool,
    pub image_url: Option<String>,
}

impl From<Product> for ProductView {
    fn from(product: Product) -> Self {
        Self {
            id: product.id,
            name: product.name,
            description: product.description,
            price: product.price,
            is_active: product.is_active,
            image_url: product.image_url,
        }
    }
}

/// Response carrying a single product.
#[derive(Debug, Serialize)]
pub struct ProductEnvelope {
    pub success: bool,
    pub product: ProductView,
}

/// Response carrying only an outcome message.
#[derive(Debug, Serialize)]
pub struct StatusEnvelope {
    pub success: bool,
    pub message: String,
}

/// Name-search request body.
#[derive(Debug, Deserialize)]
pub struct SearchByNameRequest {
    pub name: String,
}

/// Price-range-search request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchByPriceRequest {
    pub min_price: Decimal,
    pub max_price: Decimal,
}

// =============================================================================
// Multipart handling
// =============================================================================

/// Product fields collected from a multipart body.
#[derive(Default)]
struct ProductForm {
    name: Option<String>,
    description: Option<String>,
    price: Option<Decimal>,
    image: Option<(String, axum::body::Bytes)>,
}

async fn field_text(field: Field<'_>) -> Result<String> {
    field
        .text()
        .await
        .map_err(|e| ApiError::validation(format!("invalid multipart field: {e}")))
}

/// Walk the multipart body, collecting known fields and ignoring the rest.
async fn read_product_form(multipart: &mut Multipart) -> Result<ProductForm> {
    let mut form = ProductForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::validation(format!("invalid multipart body: {e}")))?
    {
        let Some(field_name) = field.name().map(ToOwned::to_owned) else {
            continue;
        };

        match field_name.as_str() {
            "name" => form.name = Some(field_text(field).await?),
            "description" => form.description = Some(field_text(field).await?),
            "price" => {
                let raw = field_text(field).await?;
                let price = raw
                    .trim()
                    .parse::<Decimal>()
                    .map_err(|_| ApiError::validation("price must be a number"))?;
                form.price = Some(price);
            }
            "image" => {
                let original_name = field.file_name().map(ToOwned::to_owned).unwrap_or_default();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::validation(format!("invalid image upload: {e}")))?;
                if !bytes.is_empty() {
                    form.image = Some((original_name, bytes));
                }
            }
            _ => {}
        }
    }

    Ok(form)
}

/// Write an uploaded image under the upload directory and return its public
/// path. The stored filename is a fresh UUID keeping the original
/// extension.
async fn store_image(upload_dir: &FsPath, original_name: &str, bytes: &[u8]) -> Result<String> {
    tokio::fs::create_dir_all(upload_dir)
        .await
        .map_err(|e| ApiError::Internal(format!("failed to create upload dir: {e}")))?;

    let extension = FsPath::new(original_name)
        .extension()
        .and_then(OsStr::to_str)
        .map(|ext| format!(".{ext}"))
        .unwrap_or_default();
    let file_name = format!("{}{extension}", Uuid::new_v4());

    tokio::fs::write(upload_dir.join(&file_name), bytes)
        .await
        .map_err(|e| ApiError::Internal(format!("failed to store image: {e}")))?;

    Ok(format!("/uploads/{file_name}"))
}

// =============================================================================
// Handlers
// =============================================================================

/// Create a product.
///
/// POST /products (admin, multipart)
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ProductEnvelope>)> {
    let form = read_product_form(&mut multipart).await?;

    let (Some(name), Some(description), Some(price)) = (form.name, form.description, form.price)
    else {
        return Err(ApiError::validation(
            "name, description, and price are required",
        ));
    };

    let image_url = match form.image {
        Some((original_name, bytes)) => {
            Some(store_image(&state.config().upload_dir, &original_name, &bytes).await?)
        }
        None => None,
    };

    let product = CatalogService::new(state.store())
        .create(NewProduct {
            name,
            description,
            price,
            image_url,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ProductEnvelope {
            success: true,
            product: ProductView::from(product),
        }),
    ))
}

/// Every product, active or not.
///
/// GET /products/all (admin)
pub async fn all(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
) -> Result<Json<Vec<ProductView>>> {
    let products = CatalogService::new(state.store()).list_all().await?;

    Ok(Json(products.into_iter().map(ProductView::from).collect()))
}

/// Products visible to the public listing.
///
/// GET /products/active
pub async fn active(State(state): State<AppState>) -> Result<Json<Vec<ProductView>>> {
    let products = CatalogService::new(state.store()).list_active().await?;

    Ok(Json(products.into_iter().map(ProductView::from).collect()))
}

/// One product by id.
///
/// GET /products/{productId}
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ProductView>> {
    let product = CatalogService::new(state.store())
        .get(ProductId::new(id))
        .await?;

    Ok(Json(ProductView::from(product)))
}

/// Partially update a product, optionally replacing its image.
///
/// PATCH /products/{productId}/update (admin, multipart)
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<i32>,
    mut multipart: Multipart,
) -> Result<Json<ProductEnvelope>> {
    let form = read_product_form(&mut multipart).await?;

    let image_url = match form.image {
        Some((original_name, bytes)) => {
            Some(store_image(&state.config().upload_dir, &original_name, &bytes).await?)
        }
        None => None,
    };

    let product = CatalogService::new(state.store())
        .update(
            ProductId::new(id),
            ProductPatch {
                name: form.name,
                description: form.description,
                price: form.price,
                image_url,
            },
        )
        .await?;

    Ok(Json(ProductEnvelope {
        success: true,
        product: ProductView::from(product),
    }))
}

/// Hide a product from the public listing.
///
/// PATCH /products/{productId}/archive (admin)
pub async fn archive(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<i32>,
) -> Result<Json<StatusEnvelope>> {
    let (_, changed) = CatalogService::new(state.store())
        .archive(ProductId::new(id))
        .await?;

    Ok(Json(StatusEnvelope {
        success: true,
        message: if changed {
            "Product archived successfully".to_owned()
        } else {
            "Product already archived".to_owned()
        },
    }))
}

/// Restore a product to the public listing.
///
/// PATCH /products/{productId}/activate (admin)
pub async fn activate(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<i32>,
) -> Result<Json<StatusEnvelope>> {
    let (_, changed) = CatalogService::new(state.store())
        .activate(ProductId::new(id))
        .await?;

    Ok(Json(StatusEnvelope {
        success: true,
        message: if changed {
            "Product activated successfully".to_owned()
        } else {
            "Product already active".to_owned()
        },
    }))
}

/// Hard-delete a product.
///
/// DELETE /products/{productId}/delete (admin)
pub async fn remove(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<i32>,
) -> Result<Json<StatusEnvelope>> {
    CatalogService::new(state.store())
        .delete(ProductId::new(id))
        .await?;

    Ok(Json(StatusEnvelope {
        success: true,
        message: "Product deleted successfully".to_owned(),
    }))
}

/// Substring search on product names.
///
/// POST /products/search-by-name
pub async fn search_by_name(
    State(state): State<AppState>,
    Json(body): Json<SearchByNameRequest>,
) -> Result<Json<Vec<ProductView>>> {
    let found = CatalogService::new(state.store())
        .search_by_name(&body.name)
        .await?;

    if found.is_empty() {
        return Err(ApiError::NotFound("no products found".to_owned()));
    }

    Ok(Json(found.into_iter().map(ProductView::from).collect()))
}

/// Price range search.
///
/// POST /products/search-by-price
pub async fn search_by_price(
    State(state): State<AppState>,
    Json(body): Json<SearchByPriceRequest>,
) -> Result<Json<Vec<ProductView>>> {
    let found = CatalogService::new(state.store())
        .search_by_price(body.min_price, body.max_price)
        .await?;

    if found.is_empty() {
        return Err(ApiError::NotFound("no products found".to_owned()));
    }

    Ok(Json(found.into_iter().map(ProductView::from).collect()))
}
