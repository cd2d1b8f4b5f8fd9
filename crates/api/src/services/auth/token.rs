//! Bearer token issuance and verification.
//!
//! Tokens are HS256 JWTs carrying the claims the rest of the API trusts:
//! `{id, email, isAdmin, iat, exp}`. The admin claim is read from the token
//! by gated routes and is not re-verified against the store per request.

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use shoplite_core::UserId;

use crate::models::User;

/// Errors from token handling.
#[derive(Debug, Error)]
pub enum TokenError {
    /// Signing a new token failed.
    #[error("failed to sign token")]
    Sign(#[source] jsonwebtoken::errors::Error),

    /// The presented token is malformed, tampered with, or expired.
    #[error("invalid or expired token")]
    Invalid(#[source] jsonwebtoken::errors::Error),
}

/// Claims carried by every access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    /// Owning user's id.
    pub id: UserId,
    /// Owning user's email at issue time.
    pub email: String,
    /// Whether the user held the admin flag at issue time.
    pub is_admin: bool,
    /// Issued-at, seconds since the epoch.
    pub iat: i64,
    /// Expiry, seconds since the epoch.
    pub exp: i64,
}

/// Issues and verifies access tokens with a shared HS256 secret.
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_hours: i64,
}

impl TokenService {
    /// Build a token service from the configured signing secret.
    #[must_use]
    pub fn new(secret: &SecretString, ttl_hours: i64) -> Self {
        let secret = secret.expose_secret().as_bytes();
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl_hours,
        }
    }

    /// Issue a token for a freshly authenticated user.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Sign` if signing fails.
    pub fn issue(&self, user: &User) -> Result<String, TokenError> {
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            id: user.id,
            email: user.email.as_str().to_owned(),
            is_admin: user.is_admin,
            iat: now,
            exp: now + self.ttl_hours * 3600,
        };

        encode(&Header::default(), &claims, &self.encoding).map_err(TokenError::Sign)
    }

    /// Verify a presented token and return its claims.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Invalid` for any malformed, tampered, or expired
    /// token.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let validation = Validation::new(Algorithm::HS256);
        decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(TokenError::Invalid)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use shoplite_core::{Email, MobileNumber};

    use super::*;

    fn service(ttl_hours: i64) -> TokenService {
        TokenService::new(&SecretString::from("0123456789abcdef0123456789abcdef"), ttl_hours)
    }

    fn sample_user(is_admin: bool) -> User {
        User {
            id: UserId::new(7),
            first_name: "Jo".to_owned(),
            last_name: "Reyes".to_owned(),
            email: Email::parse("jo@example.com").unwrap(),
            mobile_no: MobileNumber::parse("09171234567").unwrap(),
            password_hash: "hash".to_owned(),
            is_admin,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_issue_verify_roundtrip() {
        let tokens = service(72);
        let token = tokens.issue(&sample_user(true)).unwrap();

        let claims = tokens.verify(&token).unwrap();
        assert_eq!(claims.id, UserId::new(7));
        assert_eq!(claims.email, "jo@example.com");
        assert!(claims.is_admin);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_tampered_token_rejected() {
        let tokens = service(72);
        let token = tokens.issue(&sample_user(false)).unwrap();

        let mut tampered = token;
        tampered.pop();
        assert!(matches!(
            tokens.verify(&tampered),
            Err(TokenError::Invalid(_))
        ));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = service(72).issue(&sample_user(false)).unwrap();

        let other =
            TokenService::new(&SecretString::from("ffffffffffffffffffffffffffffffff"), 72);
        assert!(matches!(other.verify(&token), Err(TokenError::Invalid(_))));
    }

    #[test]
    fn test_expired_token_rejected() {
        // Negative TTL backdates the expiry past the validation leeway.
        let tokens = service(-1);
        let token = tokens.issue(&sample_user(false)).unwrap();
        assert!(matches!(tokens.verify(&token), Err(TokenError::Invalid(_))));
    }

    #[test]
    fn test_claims_wire_shape() {
        let claims = Claims {
            id: UserId::new(1),
            email: "jo@example.com".to_owned(),
            is_admin: false,
            iat: 0,
            exp: 1,
        };
        let json = serde_json::to_value(&claims).unwrap();
        assert!(json.get("isAdmin").is_some());
        assert!(json.get("is_admin").is_none());
    }
}
