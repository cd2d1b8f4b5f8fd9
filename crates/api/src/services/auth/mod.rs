//! Authentication and account service.
//!
//! Registration, login, profile access, password changes, and admin
//! promotion, plus the argon2id password-hashing helpers.

mod error;
pub mod token;

pub use error::AuthError;
pub use token::{Claims, TokenError, TokenService};

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use shoplite_core::{Email, MobileNumber, UserId};

use crate::models::{NewUser, User};
use crate::store::{Store, StoreError};

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// A registration request after transport decoding, before validation.
#[derive(Debug, Clone)]
pub struct Registration {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub mobile_no: String,
    pub password: String,
}

/// Account service.
pub struct AuthService<'a> {
    store: &'a dyn Store,
}

impl<'a> AuthService<'a> {
    /// Create a new account service.
    #[must_use]
    pub const fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    /// Register a new account.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` / `InvalidMobile` / `WeakPassword`
    /// on validation failure and `AuthError::EmailTaken` if the email is
    /// already registered.
    pub async fn register(&self, registration: Registration) -> Result<User, AuthError> {
        let email = Email::parse(&registration.email)?;
        let mobile_no = MobileNumber::parse(&registration.mobile_no)?;
        validate_password(&registration.password)?;

        let password_hash = hash_password(&registration.password)?;

        let user = self
            .store
            .create_user(NewUser {
                first_name: registration.first_name,
                last_name: registration.last_name,
                email,
                mobile_no,
                password_hash,
            })
            .await
            .map_err(|e| match e {
                StoreError::Conflict(_) => AuthError::EmailTaken,
                other => AuthError::Store(other),
            })?;

        Ok(user)
    }

    /// Authenticate with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::EmailNotFound` if no account exists for the email
    /// and `AuthError::WrongPassword` if the password does not match.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let email = Email::parse(email)?;

        let user = self
            .store
            .user_by_email(&email)
            .await?
            .ok_or(AuthError::EmailNotFound)?;

        verify_password(password, &user.password_hash)?;

        Ok(user)
    }

    /// Fetch a user by id.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if the user doesn't exist.
    pub async fn user(&self, user_id: UserId) -> Result<User, AuthError> {
        self.store
            .user_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    /// Replace the user's password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::WeakPassword` on validation failure and
    /// `AuthError::UserNotFound` if the user doesn't exist.
    pub async fn change_password(
        &self,
        user_id: UserId,
        new_password: &str,
    ) -> Result<(), AuthError> {
        validate_password(new_password)?;

        let password_hash = hash_password(new_password)?;

        self.store
            .update_password(user_id, &password_hash)
            .await
            .map_err(|e| match e {
                StoreError::NotFound => AuthError::UserNotFound,
                other => AuthError::Store(other),
            })
    }

    /// Grant the admin flag to a user.
    ///
    /// The caller is responsible for checking that the requester is an
    /// admin; this only performs the update.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if the user doesn't exist.
    pub async fn promote_to_admin(&self, user_id: UserId) -> Result<User, AuthError> {
        self.store
            .set_admin(user_id, true)
            .await
            .map_err(|e| match e {
                StoreError::NotFound => AuthError::UserNotFound,
                other => AuthError::Store(other),
            })
    }
}

/// Validate password meets requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    Ok(())
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::WrongPassword)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::WrongPassword)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use crate::store::memory::MemoryStore;

    use super::*;

    fn registration(email: &str) -> Registration {
        Registration {
            first_name: "Jo".to_owned(),
            last_name: "Reyes".to_owned(),
            email: email.to_owned(),
            mobile_no: "09171234567".to_owned(),
            password: "correct horse".to_owned(),
        }
    }

    #[tokio::test]
    async fn test_register_and_login() {
        let store = MemoryStore::new();
        let auth = AuthService::new(&store);

        let user = auth.register(registration("jo@example.com")).await.unwrap();
        assert!(!user.is_admin);
        assert_ne!(user.password_hash, "correct horse");

        let logged_in = auth.login("jo@example.com", "correct horse").await.unwrap();
        assert_eq!(logged_in.id, user.id);
    }

    #[tokio::test]
    async fn test_register_rejects_bad_input() {
        let store = MemoryStore::new();
        let auth = AuthService::new(&store);

        let mut bad_email = registration("not-an-email");
        bad_email.email = "not-an-email".to_owned();
        assert!(matches!(
            auth.register(bad_email).await,
            Err(AuthError::InvalidEmail(_))
        ));

        let mut bad_mobile = registration("a@example.com");
        bad_mobile.mobile_no = "12345".to_owned();
        assert!(matches!(
            auth.register(bad_mobile).await,
            Err(AuthError::InvalidMobile(_))
        ));

        let mut short_password = registration("b@example.com");
        short_password.password = "short".to_owned();
        assert!(matches!(
            auth.register(short_password).await,
            Err(AuthError::WeakPassword(_))
        ));
    }

    #[tokio::test]
    async fn test_register_duplicate_email() {
        let store = MemoryStore::new();
        let auth = AuthService::new(&store);

        auth.register(registration("jo@example.com")).await.unwrap();
        assert!(matches!(
            auth.register(registration("jo@example.com")).await,
            Err(AuthError::EmailTaken)
        ));
    }

    #[tokio::test]
    async fn test_login_failures() {
        let store = MemoryStore::new();
        let auth = AuthService::new(&store);
        auth.register(registration("jo@example.com")).await.unwrap();

        assert!(matches!(
            auth.login("nobody@example.com", "correct horse").await,
            Err(AuthError::EmailNotFound)
        ));
        assert!(matches!(
            auth.login("jo@example.com", "wrong password").await,
            Err(AuthError::WrongPassword)
        ));
    }

    #[tokio::test]
    async fn test_change_password() {
        let store = MemoryStore::new();
        let auth = AuthService::new(&store);
        let user = auth.register(registration("jo@example.com")).await.unwrap();

        auth.change_password(user.id, "new password!").await.unwrap();
        assert!(auth.login("jo@example.com", "correct horse").await.is_err());
        assert!(auth.login("jo@example.com", "new password!").await.is_ok());
    }

    #[tokio::test]
    async fn test_promote_to_admin() {
        let store = MemoryStore::new();
        let auth = AuthService::new(&store);
        let user = auth.register(registration("jo@example.com")).await.unwrap();

        let promoted = auth.promote_to_admin(user.id).await.unwrap();
        assert!(promoted.is_admin);

        assert!(matches!(
            auth.promote_to_admin(UserId::new(999)).await,
            Err(AuthError::UserNotFound)
        ));
    }
}
