//! Error types for configuration loading.

use std::path::PathBuf;

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The config file's contents were not valid TOML.
    #[error("invalid TOML in {path}: {error}")]
    InvalidToml {
        /// Path to the offending file.
        path: PathBuf,
        /// Underlying parse error.
        error: String,
    },

    /// Reading the config file failed for a reason other than "not found".
    #[error("failed to read {path}: {error}")]
    Io {
        /// Path that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        error: String,
    },

    /// An environment variable held a value of the wrong type.
    #[error("failed to parse {var}: {error}")]
    EnvParse {
        /// Variable name.
        var: String,
        /// Parse error.
        error: String,
    },
}
