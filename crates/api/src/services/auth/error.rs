//! Authentication error type.

use thiserror::Error;

use shoplite_core::{EmailError, MobileNumberError};

use crate::store::StoreError;

/// Errors returned by the authentication service.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The email failed validation.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// The mobile number failed validation.
    #[error("invalid mobile number: {0}")]
    InvalidMobile(#[from] MobileNumberError),

    /// The password does not meet requirements.
    #[error("{0}")]
    WeakPassword(String),

    /// An account with this email already exists.
    #[error("email already registered")]
    EmailTaken,

    /// No account exists for the given email.
    #[error("no account found for that email")]
    EmailNotFound,

    /// The password does not match the stored hash.
    #[error("email and password do not match")]
    WrongPassword,

    /// The user record no longer exists.
    #[error("user not found")]
    UserNotFound,

    /// Password hashing failed.
    #[error("password hashing failed")]
    PasswordHash,

    /// Store operation failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}
