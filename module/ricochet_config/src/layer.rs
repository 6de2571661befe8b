//! Configuration layer abstraction.
//!
//! Scoped down from the workspace's 5-layer precedence system (env > project
//! config > user config > workspace defaults > crate defaults) to the three
//! layers a standalone CLI tool actually has: a `RICOCHET_*` environment
//! variable, an optional `~/.ricochet/config.toml`, and the crate's
//! defaults. There is no "project" or "workspace" for a scanner invoked
//! against an arbitrary target, so those two layers have no Ricochet
//! equivalent.

use crate::error::{ConfigError, Result};
use std::collections::HashMap;
use std::path::PathBuf;

/// A configuration value read from one layer, with provenance for
/// diagnostics (`ricochet config --show-sources`).
#[derive(Debug, Clone)]
pub struct ConfigValue {
    /// The raw value.
    pub value: toml::Value,
    /// Which layer produced it, for debugging precedence surprises.
    pub source: String,
}

/// A source of configuration values, consulted in priority order.
pub trait ConfigLayer {
    /// Looks up `key` (dotted path, e.g. `"net.rate_limit"`).
    ///
    /// # Errors
    ///
    /// Returns an error if the layer's backing store exists but is corrupt.
    fn get(&self, key: &str) -> Result<Option<ConfigValue>>;

    /// Layer name, for `--show-sources` output.
    fn name(&self) -> &str;

    /// Priority; higher wins when more than one layer defines the same key.
    fn priority(&self) -> u8;
}

/// `RICOCHET_`-prefixed environment variables (priority 3, highest).
#[derive(Debug)]
pub struct EnvLayer {
    prefix: String,
    vars: HashMap<String, String>,
}

impl EnvLayer {
    /// Captures every currently-set environment variable starting with
    /// `prefix` (e.g. `"RICOCHET_"`).
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        let vars = std::env::vars()
            .filter(|(k, _)| k.starts_with(&prefix))
            .collect();
        Self { prefix, vars }
    }

    fn key_to_env(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key.replace('.', "_").to_uppercase())
    }

    fn parse_value(value: &str) -> toml::Value {
        if value.eq_ignore_ascii_case("true") {
            return toml::Value::Boolean(true);
        }
        if value.eq_ignore_ascii_case("false") {
            return toml::Value::Boolean(false);
        }
        if let Ok(i) = value.parse::<i64>() {
            return toml::Value::Integer(i);
        }
        if let Ok(f) = value.parse::<f64>() {
            return toml::Value::Float(f);
        }
        toml::Value::String(value.to_string())
    }
}

impl ConfigLayer for EnvLayer {
    fn get(&self, key: &str) -> Result<Option<ConfigValue>> {
        let env_var = self.key_to_env(key);
        Ok(self.vars.get(&env_var).map(|value| ConfigValue {
            value: Self::parse_value(value),
            source: format!("env:{env_var}"),
        }))
    }

    fn name(&self) -> &str {
        "environment"
    }

    fn priority(&self) -> u8 {
        3
    }
}

/// An optional TOML file on disk (priority 2).
#[derive(Debug)]
pub struct FileLayer {
    name: String,
    content: Option<toml::Table>,
    source_path: PathBuf,
}

impl FileLayer {
    /// Loads `path` if it exists; a missing file is not an error, it just
    /// produces an empty layer that never answers `get`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file exists but cannot be read, or
    /// [`ConfigError::InvalidToml`] if its contents do not parse.
    pub fn from_file(name: impl Into<String>, path: PathBuf) -> Result<Self> {
        let name = name.into();
        if !path.exists() {
            return Ok(Self {
                name,
                content: None,
                source_path: path,
            });
        }

        let raw = std::fs::read_to_string(&path).map_err(|e| ConfigError::Io {
            path: path.clone(),
            error: e.to_string(),
        })?;
        let content = toml::from_str(&raw).map_err(|e| ConfigError::InvalidToml {
            path: path.clone(),
            error: e.to_string(),
        })?;

        Ok(Self {
            name,
            content: Some(content),
            source_path: path,
        })
    }

    fn get_nested(table: &toml::Table, key_path: &str) -> Option<toml::Value> {
        let mut current = toml::Value::Table(table.clone());
        for part in key_path.split('.') {
            current = current.as_table()?.get(part)?.clone();
        }
        Some(current)
    }
}

impl ConfigLayer for FileLayer {
    fn get(&self, key: &str) -> Result<Option<ConfigValue>> {
        let Some(content) = &self.content else {
            return Ok(None);
        };
        Ok(Self::get_nested(content, key).map(|value| ConfigValue {
            value,
            source: format!("{}:{}", self.name, self.source_path.display()),
        }))
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn priority(&self) -> u8 {
        2
    }
}

/// Assembles the standard Ricochet layer stack: environment over the user's
/// `~/.ricochet/config.toml`.
#[must_use]
pub fn default_layers() -> Vec<Box<dyn ConfigLayer>> {
    let mut layers: Vec<Box<dyn ConfigLayer>> = vec![Box::new(EnvLayer::new("RICOCHET_"))];

    if let Some(home) = dirs::home_dir() {
        let path = home.join(".ricochet").join("config.toml");
        if let Ok(layer) = FileLayer::from_file("user config", path) {
            layers.push(Box::new(layer));
        }
    }

    layers.sort_by_key(|l| std::cmp::Reverse(l.priority()));
    layers
}

/// Looks `key` up across `layers` in priority order, returning the first hit.
#[must_use]
pub fn resolve(layers: &[Box<dyn ConfigLayer>], key: &str) -> Option<ConfigValue> {
    layers.iter().find_map(|layer| layer.get(key).ok().flatten())
}
