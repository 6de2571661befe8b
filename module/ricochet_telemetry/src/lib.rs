//! Logging setup shared by every Ricochet binary.
//!
//! All logs go to stderr — stdout is reserved for JSONL findings so a
//! findings stream can be piped without scraping log noise out of it.

use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Output format for the process's log stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable, one line per event.
    Text,
    /// One JSON object per event, for ingestion by another tool.
    Json,
}

/// Verbosity floor, overridable per-module via `RUST_LOG`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Everything, including per-request tracing.
    Debug,
    /// Lifecycle events: injections sent, callbacks received, findings emitted.
    Info,
    /// Dropped callbacks, retried requests, degraded listeners.
    Warn,
    /// Failures that abort a command.
    Error,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Info => Self::INFO,
            LogLevel::Warn => Self::WARN,
            LogLevel::Error => Self::ERROR,
        }
    }
}

/// Initializes the global tracing subscriber. Call once, at process startup.
///
/// `RUST_LOG` overrides `level` when set.
///
/// # Errors
///
/// Returns an error if a global subscriber has already been installed.
pub fn init_logging(level: LogLevel, format: LogFormat) -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(LevelFilter::from(level).to_string()));

    match format {
        LogFormat::Text => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .try_init()?;
        }
        LogFormat::Json => {
            tracing_subscriber::fmt()
                .json()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .try_init()?;
        }
    }

    Ok(())
}
