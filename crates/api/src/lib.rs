//! Shoplite API library.
//!
//! This crate provides the API server as a library, allowing the router to
//! be driven in-process by tests and reused by the thin binary entry point.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;

use axum::Router;
use tower_http::services::ServeDir;

use state::AppState;

/// Build the application router: every API route plus static serving of
/// uploaded product images.
///
/// Operational layers (tracing, CORS, Sentry) are attached by the binary.
#[must_use]
pub fn app(state: AppState) -> Router {
    let upload_dir = state.config().upload_dir.clone();

    routes::routes()
        .nest_service("/uploads", ServeDir::new(upload_dir))
        .with_state(state)
}
