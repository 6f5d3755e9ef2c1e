//! Host configuration loaded from TOML.
//!
//! The file has a single `[retrieval]` table mirroring
//! [`RetrievalConfig`]. Missing fields fall back to defaults.

use std::path::{Path, PathBuf};

use bookrank_fusion::RetrievalConfig;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Top-level host configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Fusion and retrieval settings.
    pub retrieval: RetrievalConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file, falling back to defaults for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, cannot be parsed, or
    /// fails validation.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse and validate configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Config`] on a parse error and
    /// [`AppError::Fusion`] if validation fails.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(|e| AppError::Config(e.to_string()))?;
        config.retrieval.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the config cannot be serialized.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| AppError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Returns the default config file path: `~/.config/bookrank/config.toml`.
    pub fn default_config_path() -> PathBuf {
        if let Some(config) = std::env::var_os("XDG_CONFIG_HOME") {
            PathBuf::from(config).join("bookrank").join("config.toml")
        } else if let Some(home) = std::env::var_os("HOME") {
            PathBuf::from(home)
                .join(".config")
                .join("bookrank")
                .join("config.toml")
        } else {
            PathBuf::from("/tmp/bookrank-config/config.toml")
        }
    }
}
