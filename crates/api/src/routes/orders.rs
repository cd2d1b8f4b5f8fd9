//! Order route handlers.

use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;

use crate::error::Result;
use crate::middleware::{CurrentUser, RequireAdmin};
use crate::services::{CheckoutService, checkout::OrderView};
use crate::state::AppState;

/// Checkout response body. The created order is not returned; clients fetch
/// it from the history endpoints.
#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub success: bool,
    pub message: String,
}

/// Order history wrapper.
#[derive(Debug, Serialize)]
pub struct OrdersResponse {
    pub orders: Vec<OrderView>,
}

/// Snapshot the current user's cart into a pending order and clear the
/// cart.
///
/// POST /orders/checkout
pub async fn checkout(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
) -> Result<(StatusCode, Json<CheckoutResponse>)> {
    CheckoutService::new(state.store()).checkout(claims.id).await?;

    Ok((
        StatusCode::CREATED,
        Json(CheckoutResponse {
            success: true,
            message: "Order placed successfully".to_owned(),
        }),
    ))
}

/// Current user's order history.
///
/// GET /orders/my-orders
pub async fn my_orders(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
) -> Result<Json<OrdersResponse>> {
    let orders = CheckoutService::new(state.store()).my_orders(claims.id).await?;

    Ok(Json(OrdersResponse { orders }))
}

/// Every user's order history.
///
/// GET /orders/all-orders (admin)
pub async fn all_orders(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
) -> Result<Json<OrdersResponse>> {
    let orders = CheckoutService::new(state.store()).all_orders().await?;

    Ok(Json(OrdersResponse { orders }))
}
