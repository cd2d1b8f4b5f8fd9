//! End-to-end API tests.
//!
//! Drive the full router in-process against the in-memory store backend:
//! register -> login -> catalog -> cart -> checkout -> history, plus the
//! auth gating and the unified error body.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use secrecy::SecretString;
use serde_json::{Value, json};
use tower::ServiceExt;

use shoplite_api::config::{ApiConfig, StoreBackend};
use shoplite_api::state::AppState;
use shoplite_api::store::UserStore;
use shoplite_api::store::memory::MemoryStore;
use shoplite_core::Email;

// =============================================================================
// Harness
// =============================================================================

fn test_config() -> ApiConfig {
    ApiConfig {
        database_url: None,
        store: StoreBackend::Memory,
        host: "127.0.0.1".parse().unwrap(),
        port: 0,
        jwt_secret: SecretString::from("kq6vR2mX8pL4wN9jB3tY7cF1hD5gZ0aS"),
        token_ttl_hours: 72,
        upload_dir: std::env::temp_dir().join(format!("shoplite-test-{}", uuid::Uuid::new_v4())),
        cors_origins: Vec::new(),
        sentry_dsn: None,
        sentry_environment: None,
    }
}

fn test_app() -> (Router, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let state = AppState::new(test_config(), store.clone());
    (shoplite_api::app(state), store)
}

async fn send(
    app: &Router,
    method: &str,
    path: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(path);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }

    let request = match body {
        Some(value) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(value.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };

    (status, value)
}

const BOUNDARY: &str = "shoplite-test-boundary";

/// Build a multipart/form-data body from plain text fields, optionally with
/// one file part named `image`.
fn multipart_body(fields: &[(&str, &str)], image: Option<(&str, &[u8])>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some((filename, bytes)) = image {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

async fn send_multipart(
    app: &Router,
    method: &str,
    path: &str,
    token: &str,
    fields: &[(&str, &str)],
    image: Option<(&str, &[u8])>,
) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(path)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(fields, image)))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

    (status, value)
}

async fn register(app: &Router, email: &str) -> StatusCode {
    let (status, _) = send(
        app,
        "POST",
        "/users/register",
        None,
        Some(json!({
            "firstName": "Jo",
            "lastName": "Reyes",
            "email": email,
            "mobileNo": "09171234567",
            "password": "correct horse",
        })),
    )
    .await;
    status
}

async fn login(app: &Router, email: &str, password: &str) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/users/login",
        None,
        Some(json!({ "email": email, "password": password })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["access"].as_str().unwrap().to_owned()
}

async fn user_token(app: &Router, email: &str) -> String {
    assert_eq!(register(app, email).await, StatusCode::CREATED);
    login(app, email, "correct horse").await
}

/// Register an account, flip its admin flag directly in the store, and log
/// in again so the token carries the admin claim.
async fn admin_token(app: &Router, store: &Arc<MemoryStore>, email: &str) -> String {
    assert_eq!(register(app, email).await, StatusCode::CREATED);

    let user = store
        .user_by_email(&Email::parse(email).unwrap())
        .await
        .unwrap()
        .unwrap();
    store.set_admin(user.id, true).await.unwrap();

    login(app, email, "correct horse").await
}

async fn create_product(app: &Router, admin: &str, name: &str, price: &str) -> i64 {
    let (status, body) = send_multipart(
        app,
        "POST",
        "/products",
        admin,
        &[
            ("name", name),
            ("description", "A test product"),
            ("price", price),
        ],
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create product: {body}");
    body["product"]["id"].as_i64().unwrap()
}

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn health_endpoints_respond() {
    let (app, _) = test_app();

    let (status, _) = send(&app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, "GET", "/health/ready", None, None).await;
    assert_eq!(status, StatusCode::OK);
}

// =============================================================================
// Accounts & auth
// =============================================================================

#[tokio::test]
async fn register_login_and_profile() {
    let (app, _) = test_app();

    assert_eq!(register(&app, "jo@example.com").await, StatusCode::CREATED);

    // Duplicate email conflicts
    let (status, body) = send(
        &app,
        "POST",
        "/users/register",
        None,
        Some(json!({
            "firstName": "Jo",
            "lastName": "Reyes",
            "email": "jo@example.com",
            "mobileNo": "09171234567",
            "password": "correct horse",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["kind"], "conflict");

    // Bad credentials
    let (status, _) = send(
        &app,
        "POST",
        "/users/login",
        None,
        Some(json!({ "email": "jo@example.com", "password": "wrong password" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        "POST",
        "/users/login",
        None,
        Some(json!({ "email": "nobody@example.com", "password": "correct horse" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Good credentials
    let token = login(&app, "jo@example.com", "correct horse").await;

    let (status, body) = send(&app, "GET", "/users/details", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["email"], "jo@example.com");
    assert_eq!(body["user"]["isAdmin"], false);
    assert!(body["user"].get("passwordHash").is_none());
}

#[tokio::test]
async fn register_validation_failures() {
    let (app, _) = test_app();

    for (field, value) in [
        ("email", "not-an-email"),
        ("mobileNo", "123"),
        ("password", "short"),
    ] {
        let mut payload = json!({
            "firstName": "Jo",
            "lastName": "Reyes",
            "email": "jo@example.com",
            "mobileNo": "09171234567",
            "password": "correct horse",
        });
        payload[field] = json!(value);

        let (status, body) = send(&app, "POST", "/users/register", None, Some(payload)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "field {field}");
        assert_eq!(body["kind"], "validation");
        assert!(body["message"].is_string());
    }
}

#[tokio::test]
async fn update_password_replaces_credentials() {
    let (app, _) = test_app();
    let token = user_token(&app, "jo@example.com").await;

    let (status, _) = send(
        &app,
        "PATCH",
        "/users/update-password",
        Some(&token),
        Some(json!({ "newPassword": "fresh password" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = send(
        &app,
        "POST",
        "/users/login",
        None,
        Some(json!({ "email": "jo@example.com", "password": "correct horse" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    login(&app, "jo@example.com", "fresh password").await;
}

#[tokio::test]
async fn token_gating() {
    let (app, store) = test_app();

    // Missing token
    let (status, body) = send(&app, "GET", "/users/details", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["kind"], "unauthorized");

    // Garbage token
    let (status, _) = send(&app, "GET", "/users/details", Some("not.a.jwt"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Valid token without the admin claim
    let token = user_token(&app, "jo@example.com").await;
    let (status, body) = send(&app, "GET", "/products/all", Some(&token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["kind"], "forbidden");

    let (status, _) = send(
        &app,
        "PATCH",
        "/users/1/set-as-admin",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Admin promotion through the API
    let admin = admin_token(&app, &store, "root@example.com").await;
    let (status, body) = send(
        &app,
        "PATCH",
        "/users/1/set-as-admin",
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["updatedUser"]["isAdmin"], true);
}

// =============================================================================
// Catalog
// =============================================================================

#[tokio::test]
async fn product_crud_and_search() {
    let (app, store) = test_app();
    let admin = admin_token(&app, &store, "root@example.com").await;
    let user = user_token(&app, "jo@example.com").await;

    // Non-admin cannot create
    let (status, _) = send_multipart(
        &app,
        "POST",
        "/products",
        &user,
        &[("name", "Nope"), ("description", "x"), ("price", "1")],
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Missing fields rejected
    let (status, body) =
        send_multipart(&app, "POST", "/products", &admin, &[("name", "Mug")], None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "validation");

    let mug = create_product(&app, &admin, "Enamel Mug", "12.50").await;
    create_product(&app, &admin, "Canvas Tote", "18.00").await;

    // Duplicate name conflicts
    let (status, _) = send_multipart(
        &app,
        "POST",
        "/products",
        &admin,
        &[
            ("name", "Enamel Mug"),
            ("description", "again"),
            ("price", "5"),
        ],
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Public reads
    let (status, body) = send(&app, "GET", "/products/active", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);

    let (status, body) = send(&app, "GET", &format!("/products/{mug}"), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Enamel Mug");
    assert_eq!(body["price"], "12.50");

    // Search by name: case-insensitive substring
    let (status, body) = send(
        &app,
        "POST",
        "/products/search-by-name",
        None,
        Some(json!({ "name": "mug" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, _) = send(
        &app,
        "POST",
        "/products/search-by-name",
        None,
        Some(json!({ "name": "no such thing" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Search by price range (inclusive bounds)
    let (status, body) = send(
        &app,
        "POST",
        "/products/search-by-price",
        None,
        Some(json!({ "minPrice": 12.5, "maxPrice": 18 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);

    let (status, _) = send(
        &app,
        "POST",
        "/products/search-by-price",
        None,
        Some(json!({ "minPrice": 20, "maxPrice": 10 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Archive hides from the public listing; activate restores
    let (status, body) = send(
        &app,
        "PATCH",
        &format!("/products/{mug}/archive"),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Product archived successfully");

    let (_, body) = send(
        &app,
        "PATCH",
        &format!("/products/{mug}/archive"),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(body["message"], "Product already archived");

    let (_, body) = send(&app, "GET", "/products/active", None, None).await;
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (_, body) = send(&app, "GET", "/products/all", Some(&admin), None).await;
    assert_eq!(body.as_array().unwrap().len(), 2);

    let (status, _) = send(
        &app,
        "PATCH",
        &format!("/products/{mug}/activate"),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Partial update
    let (status, body) = send_multipart(
        &app,
        "PATCH",
        &format!("/products/{mug}/update"),
        &admin,
        &[("price", "14.00")],
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["product"]["price"], "14.00");
    assert_eq!(body["product"]["name"], "Enamel Mug");

    // Delete
    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/products/{mug}/delete"),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, "GET", &format!("/products/{mug}"), None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn product_image_upload_is_served() {
    let (app, store) = test_app();
    let admin = admin_token(&app, &store, "root@example.com").await;

    let (status, body) = send_multipart(
        &app,
        "POST",
        "/products",
        &admin,
        &[
            ("name", "Poster"),
            ("description", "A2 wall poster"),
            ("price", "6.00"),
        ],
        Some(("poster.png", b"not-really-a-png")),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let image_url = body["product"]["imageUrl"].as_str().unwrap();
    assert!(image_url.starts_with("/uploads/"));
    assert!(image_url.ends_with(".png"));

    // The uploaded file is served back from /uploads
    let (status, _) = send(&app, "GET", image_url, None, None).await;
    assert_eq!(status, StatusCode::OK);
}

// =============================================================================
// Cart
// =============================================================================

#[tokio::test]
async fn cart_flow() {
    let (app, store) = test_app();
    let admin = admin_token(&app, &store, "root@example.com").await;
    let user = user_token(&app, "jo@example.com").await;

    let mug = create_product(&app, &admin, "Enamel Mug", "12.50").await;
    let tote = create_product(&app, &admin, "Canvas Tote", "18.00").await;

    // No cart yet
    let (status, _) = send(&app, "GET", "/cart/get-cart", Some(&user), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // First add creates the cart; the client-supplied subtotal is ignored
    let (status, body) = send(
        &app,
        "POST",
        "/cart/add-to-cart",
        Some(&user),
        Some(json!({ "productId": mug, "quantity": 2, "subtotal": 999 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cart"]["cartItems"].as_array().unwrap().len(), 1);
    assert_eq!(body["cart"]["totalPrice"], "25.00");

    // Repeated add merges instead of duplicating the line
    let (_, body) = send(
        &app,
        "POST",
        "/cart/add-to-cart",
        Some(&user),
        Some(json!({ "productId": mug, "quantity": 1 })),
    )
    .await;
    let items = body["cart"]["cartItems"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["quantity"], 3);
    assert_eq!(body["cart"]["totalPrice"], "37.50");

    // A different product gets its own line
    let (_, body) = send(
        &app,
        "POST",
        "/cart/add-to-cart",
        Some(&user),
        Some(json!({ "productId": tote, "quantity": 1 })),
    )
    .await;
    assert_eq!(body["cart"]["cartItems"].as_array().unwrap().len(), 2);
    assert_eq!(body["cart"]["totalPrice"], "55.50");

    // Missing fields report the unified validation shape
    let (status, body) = send(
        &app,
        "POST",
        "/cart/add-to-cart",
        Some(&user),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "validation");

    // Unknown product rejected with the offending id in detail
    let (status, body) = send(
        &app,
        "POST",
        "/cart/add-to-cart",
        Some(&user),
        Some(json!({ "productId": 999, "quantity": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "999");

    // Quantity update reprices from the current price
    let (status, body) = send(
        &app,
        "PATCH",
        "/cart/update-cart-quantity",
        Some(&user),
        Some(json!({ "productId": mug, "newQuantity": 5 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["newTotalPrice"], "80.50");

    // Non-positive quantity rejected
    let (status, body) = send(
        &app,
        "PATCH",
        "/cart/update-cart-quantity",
        Some(&user),
        Some(json!({ "productId": mug, "newQuantity": 0 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "validation");

    // Remove one line
    let (status, body) = send(
        &app,
        "PATCH",
        &format!("/cart/{tote}/remove-from-cart"),
        Some(&user),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["newTotalPrice"], "62.50");

    // Removing a line that isn't there is a 404
    let (status, _) = send(
        &app,
        "PATCH",
        &format!("/cart/{tote}/remove-from-cart"),
        Some(&user),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Clear empties the cart
    let (status, body) = send(&app, "PUT", "/cart/clear-cart", Some(&user), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["newTotalPrice"], "0");

    let (status, body) = send(&app, "GET", "/cart/get-cart", Some(&user), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cart"]["cartItems"].as_array().unwrap().len(), 0);
    assert_eq!(body["cart"]["totalPrice"], "0");

    // Carts are per-user: another user still has none
    let other = user_token(&app, "sam@example.com").await;
    let (status, _) = send(&app, "GET", "/cart/get-cart", Some(&other), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// =============================================================================
// Checkout & history
// =============================================================================

#[tokio::test]
async fn checkout_flow() {
    let (app, store) = test_app();
    let admin = admin_token(&app, &store, "root@example.com").await;
    let user = user_token(&app, "jo@example.com").await;

    let mug = create_product(&app, &admin, "Enamel Mug", "10.00").await;

    // Checkout without a cart
    let (status, _) = send(&app, "POST", "/orders/checkout", Some(&user), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Checkout of an emptied cart
    send(
        &app,
        "POST",
        "/cart/add-to-cart",
        Some(&user),
        Some(json!({ "productId": mug, "quantity": 1 })),
    )
    .await;
    send(&app, "PUT", "/cart/clear-cart", Some(&user), None).await;

    let (status, body) = send(&app, "POST", "/orders/checkout", Some(&user), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "validation");

    // A real checkout snapshots the cart and clears it
    send(
        &app,
        "POST",
        "/cart/add-to-cart",
        Some(&user),
        Some(json!({ "productId": mug, "quantity": 5 })),
    )
    .await;

    let (status, body) = send(&app, "POST", "/orders/checkout", Some(&user), None).await;
    assert_eq!(status, StatusCode::CREATED, "checkout: {body}");
    assert_eq!(body["success"], true);

    let (_, body) = send(&app, "GET", "/cart/get-cart", Some(&user), None).await;
    assert_eq!(body["cart"]["cartItems"].as_array().unwrap().len(), 0);

    // History carries the snapshot with the product name attached
    let (status, body) = send(&app, "GET", "/orders/my-orders", Some(&user), None).await;
    assert_eq!(status, StatusCode::OK);
    let orders = body["orders"].as_array().unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0]["status"], "pending");
    assert_eq!(orders[0]["totalPrice"], "50.00");
    let line = &orders[0]["productsOrdered"][0];
    assert_eq!(line["productName"], "Enamel Mug");
    assert_eq!(line["quantity"], 5);
    assert_eq!(line["subtotal"], "50.00");

    // Deleting the product degrades the view instead of failing it
    send(
        &app,
        "DELETE",
        &format!("/products/{mug}/delete"),
        Some(&admin),
        None,
    )
    .await;

    let (status, body) = send(&app, "GET", "/orders/my-orders", Some(&user), None).await;
    assert_eq!(status, StatusCode::OK);
    let line = &body["orders"][0]["productsOrdered"][0];
    assert_eq!(line["productId"], Value::Null);
    assert_eq!(line["productName"], "Unknown product");

    // all-orders is admin-gated and spans users
    let (status, _) = send(&app, "GET", "/orders/all-orders", Some(&user), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&app, "GET", "/orders/all-orders", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["orders"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn checkout_rejects_dangling_product_reference() {
    let (app, store) = test_app();
    let admin = admin_token(&app, &store, "root@example.com").await;
    let user = user_token(&app, "jo@example.com").await;

    let mug = create_product(&app, &admin, "Enamel Mug", "10.00").await;
    send(
        &app,
        "POST",
        "/cart/add-to-cart",
        Some(&user),
        Some(json!({ "productId": mug, "quantity": 1 })),
    )
    .await;

    send(
        &app,
        "DELETE",
        &format!("/products/{mug}/delete"),
        Some(&admin),
        None,
    )
    .await;

    let (status, body) = send(&app, "POST", "/orders/checkout", Some(&user), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "validation");
    assert_eq!(body["detail"], mug.to_string());

    let (_, body) = send(&app, "GET", "/orders/my-orders", Some(&user), None).await;
    assert_eq!(body["orders"].as_array().unwrap().len(), 0);
}
