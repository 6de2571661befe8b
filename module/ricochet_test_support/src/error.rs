//! Error types for test support helpers.

use thiserror::Error;

/// Result type for test support operations.
pub type Result<T> = std::result::Result<T, TestSupportError>;

/// Errors a test helper can fail with.
#[derive(Debug, Error)]
pub enum TestSupportError {
    /// Opening the backing store failed.
    #[error("store error: {0}")]
    Store(#[from] ricochet_store::StoreError),

    /// A filesystem operation (creating the temp directory) failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// No OS-assigned port was available to bind a test listener to.
    #[error("no free port available: {0}")]
    NoFreePort(String),
}
