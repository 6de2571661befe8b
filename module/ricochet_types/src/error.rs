//! Error taxonomy shared by every Ricochet crate.
//!
//! Never discards the underlying cause when converting between error
//! types, so callers can distinguish (for example) a foreign-key
//! violation from a plain I/O failure.

use thiserror::Error;

/// Result alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, RicochetError>;

/// Top-level error type returned by Ricochet's core components.
#[derive(Debug, Error)]
pub enum RicochetError {
    /// The store's backing file could not be opened or written.
    #[error("store I/O error: {0}")]
    StoreIo(String),

    /// `record_injection` was called with a token that already exists.
    #[error("duplicate token: {0}")]
    DuplicateToken(String),

    /// DNS, TCP, or TLS failure while sending an outbound request.
    #[error("network error: {0}")]
    Network(String),

    /// The outbound request did not complete within its configured timeout.
    #[error("request timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// A CLI flag or argument combination was invalid.
    #[error("usage error: {0}")]
    Usage(String),

    /// A Burp-style request file failed to parse.
    #[error("malformed request at {context}: {reason}")]
    RequestParse {
        /// Where in the request parsing failed (e.g. a header name).
        context: String,
        /// Human-readable reason.
        reason: String,
    },
}

impl RicochetError {
    /// Maps this error onto a process exit code: 2 for usage/parse errors,
    /// 1 for everything else considered fatal.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Usage(_) | Self::RequestParse { .. } => 2,
            _ => 1,
        }
    }
}
