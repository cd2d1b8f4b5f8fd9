//! Cart route handlers.
//!
//! All cart routes operate on the authenticated user's own cart. Mutation
//! responses mirror the engine: add returns the refreshed cart, the other
//! mutations return the new total only.

use axum::{Json, extract::Path, extract::State};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use shoplite_core::ProductId;

use crate::error::{ApiError, Result};
use crate::middleware::CurrentUser;
use crate::services::{CartService, cart::CartView};
use crate::state::AppState;

/// Add-to-cart request body.
///
/// Fields are validated in the handler so that a missing field reports the
/// same error shape as any other validation failure. `subtotal` is accepted
/// for wire compatibility with older clients but is ignored; subtotals are
/// always derived from the stored product price.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest {
    pub product_id: Option<ProductId>,
    pub quantity: Option<i64>,
    #[allow(dead_code)]
    pub subtotal: Option<Decimal>,
}

/// Quantity-update request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateQuantityRequest {
    pub product_id: Option<ProductId>,
    pub new_quantity: Option<i64>,
}

/// Response carrying the full cart view.
#[derive(Debug, Serialize)]
pub struct CartEnvelope {
    pub success: bool,
    pub cart: CartView,
}

/// Response carrying the full cart view plus a message.
#[derive(Debug, Serialize)]
pub struct AddToCartEnvelope {
    pub success: bool,
    pub message: String,
    pub cart: CartView,
}

/// Response carrying the recomputed cart total.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalEnvelope {
    pub success: bool,
    pub message: String,
    pub new_total_price: Decimal,
}

/// Current user's cart, joined with product data.
///
/// GET /cart/get-cart
pub async fn get_cart(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
) -> Result<Json<CartEnvelope>> {
    let cart = CartService::new(state.store()).get_cart(claims.id).await?;

    Ok(Json(CartEnvelope {
        success: true,
        cart,
    }))
}

/// Add a product to the cart, merging into an existing line.
///
/// POST /cart/add-to-cart
pub async fn add_to_cart(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    Json(body): Json<AddToCartRequest>,
) -> Result<Json<AddToCartEnvelope>> {
    let (Some(product_id), Some(quantity)) = (body.product_id, body.quantity) else {
        return Err(ApiError::validation(
            "productId and quantity are required",
        ));
    };

    let carts = CartService::new(state.store());

    carts.add_item(claims.id, product_id, quantity).await?;
    let cart = carts.get_cart(claims.id).await?;

    Ok(Json(AddToCartEnvelope {
        success: true,
        message: "Item added to cart successfully".to_owned(),
        cart,
    }))
}

/// Set a line's quantity, repricing from the current product price.
///
/// PATCH /cart/update-cart-quantity
pub async fn update_quantity(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    Json(body): Json<UpdateQuantityRequest>,
) -> Result<Json<TotalEnvelope>> {
    let (Some(product_id), Some(new_quantity)) = (body.product_id, body.new_quantity) else {
        return Err(ApiError::validation(
            "productId and newQuantity are required",
        ));
    };

    let new_total_price = CartService::new(state.store())
        .update_quantity(claims.id, product_id, new_quantity)
        .await?;

    Ok(Json(TotalEnvelope {
        success: true,
        message: "Cart updated successfully".to_owned(),
        new_total_price,
    }))
}

/// Remove a line from the cart.
///
/// PATCH /cart/{productId}/remove-from-cart
pub async fn remove_item(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    Path(product_id): Path<i32>,
) -> Result<Json<TotalEnvelope>> {
    let new_total_price = CartService::new(state.store())
        .remove_item(claims.id, ProductId::new(product_id))
        .await?;

    Ok(Json(TotalEnvelope {
        success: true,
        message: "Item removed from cart successfully".to_owned(),
        new_total_price,
    }))
}

/// Empty the cart.
///
/// PUT /cart/clear-cart
pub async fn clear(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
) -> Result<Json<TotalEnvelope>> {
    let new_total_price = CartService::new(state.store()).clear_cart(claims.id).await?;

    Ok(Json(TotalEnvelope {
        success: true,
        message: "Cart cleared successfully".to_owned(),
        new_total_price,
    }))
}
