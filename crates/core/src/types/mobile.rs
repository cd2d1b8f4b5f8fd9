//! Mobile number type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`MobileNumber`].
#[derive(thiserror::Error, Debug, Clone)]
pub enum MobileNumberError {
    /// The input is not exactly the required number of digits long.
    #[error("mobile number must be exactly {expected} digits")]
    WrongLength {
        /// Required digit count.
        expected: usize,
    },
    /// The input contains a non-digit character.
    #[error("mobile number must contain only digits")]
    NonDigit,
}

/// A local-format mobile number.
///
/// Registration requires an 11-digit number (e.g. `09171234567`); the exact
/// prefix conventions are left to the client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct MobileNumber(String);

impl MobileNumber {
    /// Required digit count.
    pub const DIGITS: usize = 11;

    /// Parse a `MobileNumber` from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not exactly [`Self::DIGITS`] ASCII
    /// digits.
    pub fn parse(s: &str) -> Result<Self, MobileNumberError> {
        let s = s.trim();

        if !s.chars().all(|c| c.is_ascii_digit()) {
            return Err(MobileNumberError::NonDigit);
        }

        if s.len() != Self::DIGITS {
            return Err(MobileNumberError::WrongLength {
                expected: Self::DIGITS,
            });
        }

        Ok(Self(s.to_owned()))
    }

    /// Returns the mobile number as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `MobileNumber` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for MobileNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for MobileNumber {
    type Err = MobileNumberError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for MobileNumber {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// SQLx support (with postgres feature)
#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for MobileNumber {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for MobileNumber {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        // Database values are assumed valid
        Ok(Self(s))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for MobileNumber {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid() {
        let number = MobileNumber::parse("09171234567").unwrap();
        assert_eq!(number.as_str(), "09171234567");
    }

    #[test]
    fn test_parse_trims_whitespace() {
        assert!(MobileNumber::parse(" 09171234567 ").is_ok());
    }

    #[test]
    fn test_parse_wrong_length() {
        assert!(matches!(
            MobileNumber::parse("0917123456"),
            Err(MobileNumberError::WrongLength { expected: 11 })
        ));
        assert!(matches!(
            MobileNumber::parse("091712345678"),
            Err(MobileNumberError::WrongLength { .. })
        ));
    }

    #[test]
    fn test_parse_non_digit() {
        assert!(matches!(
            MobileNumber::parse("0917-123-456"),
            Err(MobileNumberError::NonDigit)
        ));
        assert!(matches!(
            MobileNumber::parse("+6391712345"),
            Err(MobileNumberError::NonDigit)
        ));
    }
}
