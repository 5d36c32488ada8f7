//! Target registry for the gateway.
//!
//! Handles loading the set of named database targets from a TOML file.
//! The registry is loaded once at startup and is read-only afterwards.

use crate::error::{RelayError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Reserved target name identifying the audit store.
///
/// Audit records and report reads always go through this entry; its absence
/// from the registry is a distinct, detectable failure for those operations.
pub const AUDIT_TARGET: &str = "Local Database";

/// Main configuration structure: the full set of database targets.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Named database targets, in declaration order.
    #[serde(default)]
    pub targets: Vec<TargetConfig>,
}

/// Connection parameters for one named database target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    /// Unique human-readable target name.
    pub name: String,

    /// Database host.
    pub host: String,

    /// Database port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Database name.
    pub database: String,

    /// Database user.
    pub user: String,

    /// Database password.
    pub password: String,
}

fn default_port() -> u16 {
    5432
}

impl TargetConfig {
    /// Returns a display-safe string (no password) for logs and errors.
    pub fn display_string(&self) -> String {
        format!("{} @ {}:{}", self.database, self.host, self.port)
    }
}

impl Config {
    /// Returns the default config file path for the current platform.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("db-relay")
            .join("targets.toml")
    }

    /// Loads the target registry from a TOML file.
    ///
    /// A missing or malformed file is fatal: the gateway cannot operate
    /// without target definitions.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            RelayError::config(format!(
                "Failed to read config file {}: {e}",
                path.display()
            ))
        })?;

        Self::parse_toml(&content, path)
    }

    /// Parses the target registry from a TOML string.
    fn parse_toml(content: &str, path: &Path) -> Result<Self> {
        toml::from_str(content).map_err(|e| {
            RelayError::config(format!(
                "Configuration error in {}:\n  {}",
                path.display(),
                e
            ))
        })
    }

    /// Looks up a target by name. First match wins.
    pub fn lookup(&self, name: &str) -> Option<&TargetConfig> {
        self.targets.iter().find(|t| t.name == name)
    }

    /// Resolves the designated audit-store target.
    pub fn audit_target(&self) -> Option<&TargetConfig> {
        self.lookup(AUDIT_TARGET)
    }
}
