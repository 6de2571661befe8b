//! Error types for store operations.
//!
//! Preserves the underlying `sqlx::Error` instead of collapsing every
//! database failure into one opaque variant, so a foreign-key violation
//! (expected — an unknown callback token) stays distinguishable from a
//! genuine I/O failure (fatal).

use ricochet_types::RicochetError;

/// Store error type, preserving the `sqlx` cause for every database failure.
#[derive(Debug)]
pub enum StoreError {
    /// The path to the store file could not be opened or written.
    Io(sqlx::Error),
    /// `record_injection` was called with a token that already exists.
    DuplicateToken(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "store I/O error: {e}"),
            Self::DuplicateToken(t) => write!(f, "duplicate token: {t}"),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::DuplicateToken(_) => None,
        }
    }
}

impl From<StoreError> for RicochetError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Io(inner) => Self::StoreIo(inner.to_string()),
            StoreError::DuplicateToken(t) => Self::DuplicateToken(t),
        }
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
