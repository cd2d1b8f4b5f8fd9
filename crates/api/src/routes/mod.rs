//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                            - Liveness check
//! GET    /health/ready                      - Readiness check (store ping)
//!
//! # Users
//! POST   /users/register                    - Create an account
//! POST   /users/login                       - Issue an access token
//! GET    /users/details                     - Current user's profile
//! PATCH  /users/update-password             - Replace the password
//! PATCH  /users/{id}/set-as-admin           - Grant admin (admin)
//!
//! # Products
//! POST   /products                          - Create product (admin, multipart)
//! GET    /products/all                      - Every product (admin)
//! GET    /products/active                   - Active products
//! GET    /products/{productId}              - One product
//! PATCH  /products/{productId}/update       - Partial update (admin, multipart)
//! PATCH  /products/{productId}/archive      - Hide from listing (admin)
//! PATCH  /products/{productId}/activate     - Restore to listing (admin)
//! DELETE /products/{productId}/delete       - Hard delete (admin)
//! POST   /products/search-by-name           - Substring search
//! POST   /products/search-by-price          - Price range search
//!
//! # Cart
//! GET    /cart/get-cart                     - Current user's cart
//! POST   /cart/add-to-cart                  - Add (or merge) a line
//! PATCH  /cart/update-cart-quantity         - Reprice a line
//! PATCH  /cart/{productId}/remove-from-cart - Drop a line
//! PUT    /cart/clear-cart                   - Empty the cart
//!
//! # Orders
//! POST   /orders/checkout                   - Snapshot the cart into an order
//! GET    /orders/my-orders                  - Current user's history
//! GET    /orders/all-orders                 - Everyone's history (admin)
//! ```

pub mod cart;
pub mod orders;
pub mod products;
pub mod users;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    routing::{delete, get, patch, post, put},
};

use crate::state::AppState;

/// Create the user-account routes router.
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(users::register))
        .route("/login", post(users::login))
        .route("/details", get(users::details))
        .route("/update-password", patch(users::update_password))
        .route("/{id}/set-as-admin", patch(users::set_as_admin))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(products::create))
        .route("/all", get(products::all))
        .route("/active", get(products::active))
        .route("/search-by-name", post(products::search_by_name))
        .route("/search-by-price", post(products::search_by_price))
        .route("/{productId}", get(products::show))
        .route("/{productId}/update", patch(products::update))
        .route("/{productId}/archive", patch(products::archive))
        .route("/{productId}/activate", patch(products::activate))
        .route("/{productId}/delete", delete(products::remove))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/get-cart", get(cart::get_cart))
        .route("/add-to-cart", post(cart::add_to_cart))
        .route("/update-cart-quantity", patch(cart::update_quantity))
        .route("/{productId}/remove-from-cart", patch(cart::remove_item))
        .route("/clear-cart", put(cart::clear))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/checkout", post(orders::checkout))
        .route("/my-orders", get(orders::my_orders))
        .route("/all-orders", get(orders::all_orders))
}

/// Create all routes for the API.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .nest("/users", user_routes())
        .nest("/products", product_routes())
        .nest("/cart", cart_routes())
        .nest("/orders", order_routes())
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Verifies store connectivity before returning OK.
/// Returns 503 Service Unavailable if the store is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.store().ping().await {
        Ok(()) => StatusCode::OK,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}
