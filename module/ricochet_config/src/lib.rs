//! Layered configuration for the Ricochet CLI.
//!
//! Precedence, highest to lowest: an explicit CLI flag, a `RICOCHET_*`
//! environment variable, `~/.ricochet/config.toml`, then the crate's
//! built-in defaults. Callers pass their parsed CLI flags in as `Option`
//! overrides; [`RicochetConfig::load`] fills every gap from the layers
//! below.

pub mod error;
pub mod layer;

pub use error::{ConfigError, Result};

use layer::{default_layers, resolve, ConfigLayer};
use std::path::PathBuf;

/// Resolved runtime configuration for a single Ricochet invocation.
#[derive(Debug, Clone)]
pub struct RicochetConfig {
    /// Path to the `SQLite` findings database.
    pub db_path: PathBuf,
    /// Bind address for the HTTP callback listener.
    pub http_listen_addr: String,
    /// Bind address for the DNS callback listener.
    pub dns_listen_addr: String,
    /// Outbound requests allowed per second during injection.
    pub rate_limit_per_second: u32,
    /// Per-request HTTP timeout, in seconds.
    pub http_timeout_secs: u64,
    /// Starting poll interval before adaptive backoff kicks in.
    pub poll_base_interval_secs: u64,
    /// Ceiling the adaptive poll interval backs off to.
    pub poll_max_interval_secs: u64,
}

/// Per-field overrides sourced from parsed CLI flags.
///
/// Every field left `None` falls through to the environment, the config
/// file, then the built-in default, in that order.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    /// Overrides [`RicochetConfig::db_path`].
    pub db_path: Option<PathBuf>,
    /// Overrides [`RicochetConfig::http_listen_addr`].
    pub http_listen_addr: Option<String>,
    /// Overrides [`RicochetConfig::dns_listen_addr`].
    pub dns_listen_addr: Option<String>,
    /// Overrides [`RicochetConfig::rate_limit_per_second`].
    pub rate_limit_per_second: Option<u32>,
    /// Overrides [`RicochetConfig::http_timeout_secs`].
    pub http_timeout_secs: Option<u64>,
}

impl Default for RicochetConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            http_listen_addr: "0.0.0.0:8080".to_string(),
            dns_listen_addr: "0.0.0.0:5353".to_string(),
            rate_limit_per_second: 10,
            http_timeout_secs: 10,
            poll_base_interval_secs: 5,
            poll_max_interval_secs: 60,
        }
    }
}

impl RicochetConfig {
    /// Resolves a full configuration from the default layer stack plus
    /// `overrides` taken from the CLI.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if `~/.ricochet/config.toml` exists but is
    /// malformed.
    pub fn load(overrides: &ConfigOverrides) -> Result<Self> {
        Self::load_with_layers(&default_layers(), overrides)
    }

    /// As [`Self::load`], but against an explicit layer stack — the seam
    /// tests use to inject a temp-file `FileLayer` instead of the real
    /// `~/.ricochet/config.toml`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a layer's backing store is corrupt.
    pub fn load_with_layers(
        layers: &[Box<dyn ConfigLayer>],
        overrides: &ConfigOverrides,
    ) -> Result<Self> {
        let defaults = Self::default();

        let db_path = overrides
            .db_path
            .clone()
            .or_else(|| resolve(layers, "store.db_path").and_then(as_path))
            .unwrap_or(defaults.db_path);

        let http_listen_addr = overrides
            .http_listen_addr
            .clone()
            .or_else(|| resolve(layers, "listener.http_addr").and_then(as_string))
            .unwrap_or(defaults.http_listen_addr);

        let dns_listen_addr = overrides
            .dns_listen_addr
            .clone()
            .or_else(|| resolve(layers, "listener.dns_addr").and_then(as_string))
            .unwrap_or(defaults.dns_listen_addr);

        let rate_limit_per_second = overrides
            .rate_limit_per_second
            .or_else(|| resolve(layers, "net.rate_limit").and_then(as_u32))
            .unwrap_or(defaults.rate_limit_per_second);

        let http_timeout_secs = overrides
            .http_timeout_secs
            .or_else(|| resolve(layers, "net.timeout_secs").and_then(as_u64))
            .unwrap_or(defaults.http_timeout_secs);

        Ok(Self {
            db_path,
            http_listen_addr,
            dns_listen_addr,
            rate_limit_per_second,
            http_timeout_secs,
            ..defaults
        })
    }
}

fn as_string(v: layer::ConfigValue) -> Option<String> {
    v.value.as_str().map(ToString::to_string)
}

fn as_path(v: layer::ConfigValue) -> Option<PathBuf> {
    v.value.as_str().map(PathBuf::from)
}

fn as_u32(v: layer::ConfigValue) -> Option<u32> {
    v.value.as_integer().and_then(|i| u32::try_from(i).ok())
}

fn as_u64(v: layer::ConfigValue) -> Option<u64> {
    v.value.as_integer().and_then(|i| u64::try_from(i).ok())
}

/// `~/.ricochet/ricochet.db`, falling back to `./ricochet.db` if the home
/// directory cannot be determined.
fn default_db_path() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(".ricochet").join("ricochet.db"))
        .unwrap_or_else(|| PathBuf::from("ricochet.db"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use layer::{FileLayer, ConfigLayer};

    #[test]
    fn defaults_apply_when_nothing_overrides_them() {
        let config = RicochetConfig::load_with_layers(&[], &ConfigOverrides::default()).unwrap();
        assert_eq!(config.http_listen_addr, "0.0.0.0:8080");
        assert_eq!(config.rate_limit_per_second, 10);
    }

    #[test]
    fn explicit_override_beats_every_layer() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[net]\nrate_limit = 99\n").unwrap();
        let layers: Vec<Box<dyn ConfigLayer>> =
            vec![Box::new(FileLayer::from_file("test", path).unwrap())];

        let overrides = ConfigOverrides {
            rate_limit_per_second: Some(5),
            ..Default::default()
        };
        let config = RicochetConfig::load_with_layers(&layers, &overrides).unwrap();
        assert_eq!(config.rate_limit_per_second, 5);
    }

    #[test]
    fn file_layer_applies_when_no_override_given() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[net]\nrate_limit = 42\n").unwrap();
        let layers: Vec<Box<dyn ConfigLayer>> =
            vec![Box::new(FileLayer::from_file("test", path).unwrap())];

        let config =
            RicochetConfig::load_with_layers(&layers, &ConfigOverrides::default()).unwrap();
        assert_eq!(config.rate_limit_per_second, 42);
    }
}
