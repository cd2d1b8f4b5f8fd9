//! User domain types.

use chrono::{DateTime, Utc};

use shoplite_core::{Email, MobileNumber, UserId};

/// A registered account.
#[derive(Debug, Clone)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Email address (unique across accounts).
    pub email: Email,
    /// Contact mobile number.
    pub mobile_no: MobileNumber,
    /// Argon2id password hash.
    pub password_hash: String,
    /// Whether this account may perform admin-gated operations.
    pub is_admin: bool,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
}

/// Fields required to create an account.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: Email,
    pub mobile_no: MobileNumber,
    pub password_hash: String,
}
