//! QR code short codes.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`ShortCode`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ShortCodeError {
    #[error("short code cannot be empty")]
    Empty,
    #[error("short code must be at most {max} characters")]
    TooLong { max: usize },
    #[error("short code may only contain ASCII letters and digits")]
    InvalidCharacter,
}

/// The compact identifier printed into a QR code's URL.
///
/// Codes are `[A-Za-z0-9]`, 1 to [`ShortCode::MAX_LENGTH`] characters.
/// Generated codes are [`ShortCode::GENERATED_LENGTH`] long.
///
/// ```
/// use snaplist_core::ShortCode;
///
/// assert!(ShortCode::parse("aZ3kP9qL").is_ok());
/// assert!(ShortCode::parse("spring-sale").is_err());
/// assert!(ShortCode::parse("../etc").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct ShortCode(String);

impl ShortCode {
    /// Maximum accepted length.
    pub const MAX_LENGTH: usize = 32;

    /// Length of generated codes.
    pub const GENERATED_LENGTH: usize = 8;

    /// Parse a short code.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, too long, or contains
    /// characters outside `[A-Za-z0-9]`.
    pub fn parse(s: &str) -> Result<Self, ShortCodeError> {
        if s.is_empty() {
            return Err(ShortCodeError::Empty);
        }
        if s.len() > Self::MAX_LENGTH {
            return Err(ShortCodeError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }
        if !s.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(ShortCodeError::InvalidCharacter);
        }
        Ok(Self(s.to_owned()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ShortCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ShortCode {
    type Error = ShortCodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ShortCode> for String {
    fn from(code: ShortCode) -> Self {
        code.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rejects_bad_input() {
        assert_eq!(ShortCode::parse(""), Err(ShortCodeError::Empty));
        assert_eq!(
            ShortCode::parse(&"a".repeat(33)),
            Err(ShortCodeError::TooLong { max: 32 })
        );
        assert_eq!(
            ShortCode::parse("has space"),
            Err(ShortCodeError::InvalidCharacter)
        );
    }

    #[test]
    fn test_parse_accepts_only_alphanumerics() {
        assert!(ShortCode::parse("aZ3kP9qL").is_ok());
        for bad in ["spring-sale", "spring_sale", "caf\u{e9}", "a.b"] {
            assert_eq!(
                ShortCode::parse(bad),
                Err(ShortCodeError::InvalidCharacter),
                "{bad}"
            );
        }
    }

    #[test]
    fn test_parse_is_case_sensitive() {
        let upper = ShortCode::parse("ABC123").expect("valid");
        let lower = ShortCode::parse("abc123").expect("valid");
        assert_ne!(upper, lower);
    }
}
