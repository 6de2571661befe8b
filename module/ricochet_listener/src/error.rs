//! Error types for the HTTP and DNS callback listeners.

use thiserror::Error;

/// Result type for listener operations.
pub type Result<T> = std::result::Result<T, ListenerError>;

/// Errors a callback listener can fail with.
///
/// These only ever surface from listener *startup* (binding a socket) — once
/// a listener is serving, a malformed request or query is logged and
/// dropped, never propagated as an error.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// The listener could not bind its configured address.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// The address that could not be bound.
        addr: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The listener's backing store rejected an operation it did not expect
    /// to fail (anything other than "unknown token", which is not an error).
    #[error("store error: {0}")]
    Store(#[from] ricochet_store::StoreError),
}
