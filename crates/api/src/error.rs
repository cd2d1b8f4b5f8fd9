//! Unified error handling with Sentry integration.
//!
//! Every handler returns `Result<T, ApiError>`, and every error renders the
//! same JSON body:
//!
//! ```json
//! { "kind": "validation", "message": "quantity must be greater than zero" }
//! ```
//!
//! with an optional `detail` carrying a machine-usable identifier (e.g. the
//! missing product id). Server-side failures are captured to Sentry and
//! logged; their real cause is never leaked to the client.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::services::{AuthError, CartError, CatalogError, CheckoutError, TokenError};
use crate::store::StoreError;

/// Application-level error type for the API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or malformed request field.
    #[error("{message}")]
    Validation {
        message: String,
        /// Machine-usable identifier (e.g. an offending id).
        detail: Option<String>,
    },

    /// Missing, malformed, or expired credentials.
    #[error("{0}")]
    Unauthorized(String),

    /// Authenticated but not allowed.
    #[error("{0}")]
    Forbidden(String),

    /// Resource not found.
    #[error("{0}")]
    NotFound(String),

    /// State conflict (duplicate key, concurrent modification).
    #[error("{0}")]
    Conflict(String),

    /// Store operation failed.
    #[error("store error: {0}")]
    Store(StoreError),

    /// Internal server error.
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    /// A validation error without a machine detail.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            detail: None,
        }
    }

    const fn kind(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "validation",
            Self::Unauthorized(_) => "unauthorized",
            Self::Forbidden(_) => "forbidden",
            Self::NotFound(_) => "not_found",
            Self::Conflict(_) => "conflict",
            Self::Store(_) | Self::Internal(_) => "internal",
        }
    }

    const fn status(&self) -> StatusCode {
        match self {
            Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Store(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// The one wire shape every error renders as.
#[derive(Debug, Serialize)]
struct ErrorBody {
    kind: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if matches!(self, Self::Store(_) | Self::Internal(_)) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = self.status();
        let kind = self.kind();

        // Don't expose internal error details to clients
        let (message, detail) = match self {
            Self::Store(_) | Self::Internal(_) => ("Internal server error".to_owned(), None),
            Self::Validation { message, detail } => (message, detail),
            other => (other.to_string(), None),
        };

        (
            status,
            Json(ErrorBody {
                kind,
                message,
                detail,
            }),
        )
            .into_response()
    }
}

/// Result type alias for `ApiError`.
pub type Result<T> = std::result::Result<T, ApiError>;

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => Self::NotFound("not found".to_owned()),
            StoreError::Conflict(message) => Self::Conflict(message),
            StoreError::VersionConflict => {
                Self::Conflict("resource was modified concurrently".to_owned())
            }
            other => Self::Store(other),
        }
    }
}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Invalid(_) => Self::Unauthorized("invalid or expired token".to_owned()),
            TokenError::Sign(_) => Self::Internal("failed to sign token".to_owned()),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidEmail(_) | AuthError::InvalidMobile(_) | AuthError::WeakPassword(_) => {
                Self::validation(err.to_string())
            }
            AuthError::EmailTaken => Self::Conflict(err.to_string()),
            AuthError::EmailNotFound | AuthError::UserNotFound => Self::NotFound(err.to_string()),
            AuthError::WrongPassword => Self::Unauthorized(err.to_string()),
            AuthError::PasswordHash => Self::Internal(err.to_string()),
            AuthError::Store(store) => store.into(),
        }
    }
}

impl From<CartError> for ApiError {
    fn from(err: CartError) -> Self {
        match err {
            CartError::Validation(message) => Self::validation(message),
            CartError::CartNotFound | CartError::LineNotFound => Self::NotFound(err.to_string()),
            CartError::ProductNotFound(id) => Self::Validation {
                message: err.to_string(),
                detail: Some(id.to_string()),
            },
            CartError::Conflict => Self::Conflict(err.to_string()),
            CartError::Store(store) => store.into(),
        }
    }
}

impl From<CheckoutError> for ApiError {
    fn from(err: CheckoutError) -> Self {
        match err {
            CheckoutError::CartNotFound => Self::NotFound(err.to_string()),
            CheckoutError::EmptyCart | CheckoutError::ZeroTotal => Self::validation(err.to_string()),
            CheckoutError::MissingProduct(id) => Self::Validation {
                message: err.to_string(),
                detail: Some(id.to_string()),
            },
            CheckoutError::Conflict => Self::Conflict(err.to_string()),
            CheckoutError::Store(store) => store.into(),
        }
    }
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::Validation(message) => Self::validation(message),
            CatalogError::NotFound => Self::NotFound(err.to_string()),
            CatalogError::DuplicateName => Self::Conflict(err.to_string()),
            CatalogError::Store(store) => store.into(),
        }
    }
}
