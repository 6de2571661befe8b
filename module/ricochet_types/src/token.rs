//! Token newtype enforcing a fixed shape: exactly 16 lowercase-hex characters.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Length of a valid Ricochet correlation token.
pub const TOKEN_LEN: usize = 16;

/// A 16-character lowercase-hex correlation token.
///
/// Construction always validates length and alphabet, so a `Token` in hand is
/// known-good everywhere else in the workspace — no module re-checks token
/// format once it has been parsed into this type. Tokens are URL-safe and
/// DNS-label-safe by construction (16 ASCII hex chars, well under the 63-byte
/// label limit) and are embedded verbatim, with no further encoding.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Token(String);

/// Reason a candidate string failed token validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidToken {
    /// Length was not exactly [`TOKEN_LEN`].
    WrongLength(usize),
    /// At least one character was outside `[0-9a-f]`.
    NotLowercaseHex,
}

impl fmt::Display for InvalidToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WrongLength(n) => write!(f, "expected {TOKEN_LEN} characters, got {n}"),
            Self::NotLowercaseHex => write!(f, "token must be lowercase hex ([0-9a-f])"),
        }
    }
}

impl Token {
    /// Validates `candidate`'s length and alphabet, then wraps it.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidToken`] if the length is wrong or any character is
    /// outside `[0-9a-f]` (uppercase hex is rejected — lowercase-only).
    pub fn parse(candidate: &str) -> Result<Self, InvalidToken> {
        if candidate.len() != TOKEN_LEN {
            return Err(InvalidToken::WrongLength(candidate.len()));
        }
        if !candidate.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b)) {
            return Err(InvalidToken::NotLowercaseHex);
        }
        Ok(Self(candidate.to_string()))
    }

    /// Wraps a string already known to be valid (e.g. freshly minted),
    /// skipping validation. Only call this from a trusted producer.
    #[must_use]
    pub fn from_trusted(value: String) -> Self {
        debug_assert_eq!(value.len(), TOKEN_LEN);
        debug_assert!(value.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b)));
        Self(value)
    }

    /// Borrows the underlying hex string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Token {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_valid_lowercase_hex() {
        assert!(Token::parse("aaaaaaaaaaaaaaaa").is_ok());
        assert!(Token::parse("0123456789abcdef").is_ok());
    }

    #[test]
    fn rejects_wrong_length() {
        assert_eq!(
            Token::parse("aaaaaaaaaaaaaaa").unwrap_err(),
            InvalidToken::WrongLength(15)
        );
    }

    #[test]
    fn rejects_uppercase_hex() {
        assert_eq!(
            Token::parse("AAAAAAAAAAAAAAAA").unwrap_err(),
            InvalidToken::NotLowercaseHex
        );
    }

    #[test]
    fn rejects_non_hex_characters() {
        assert!(Token::parse("zzzzzzzzzzzzzzzz").is_err());
    }
}
