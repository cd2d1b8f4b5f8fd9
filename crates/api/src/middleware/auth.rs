//! Authentication extractors.
//!
//! Provides extractors for requiring a verified bearer token in route
//! handlers. The admin claim is taken from the token itself and is not
//! re-verified against the store per request.

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::error::ApiError;
use crate::services::Claims;
use crate::state::AppState;

/// Extractor that requires a valid bearer token.
///
/// Rejects with 401 when the `Authorization: Bearer` header is missing,
/// malformed, or fails verification.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     CurrentUser(claims): CurrentUser,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", claims.email)
/// }
/// ```
pub struct CurrentUser(pub Claims);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);

        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| ApiError::Unauthorized("missing bearer token".to_owned()))?;

        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| ApiError::Unauthorized("missing bearer token".to_owned()))?;

        let claims = state.tokens().verify(token)?;

        Ok(Self(claims))
    }
}

/// Extractor that requires a valid bearer token with the admin claim.
///
/// Rejects with 401 for token problems and 403 for a valid token without
/// the admin claim.
pub struct RequireAdmin(pub Claims);

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let CurrentUser(claims) = CurrentUser::from_request_parts(parts, state).await?;

        if !claims.is_admin {
            return Err(ApiError::Forbidden("admin access required".to_owned()));
        }

        Ok(Self(claims))
    }
}
