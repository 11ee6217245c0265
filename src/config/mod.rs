//! Configuration management for podpatch

use crate::error::{PodpatchError, PodpatchResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub runtime: RuntimeConfig,
    pub update: UpdateConfig,
}

/// Container runtime settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Container engine binary
    pub binary: String,

    /// Extra /etc/hosts entries for spawned containers, host:ip format
    pub extra_hosts: Vec<String>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            binary: "podman".to_string(),
            extra_hosts: vec![],
        }
    }
}

/// Defaults for committed images
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateConfig {
    /// Author recorded on committed images
    pub author: String,

    /// Commit message; empty means a generated one
    pub comment: String,
}

impl Default for UpdateConfig {
    fn default() -> Self {
        Self {
            author: "podpatch".to_string(),
            comment: String::new(),
        }
    }
}

/// Configuration manager
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a new config manager with default path
    pub fn new() -> Self {
        Self {
            config_path: Self::default_config_path(),
        }
    }

    /// Create a config manager with a custom path
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("podpatch")
            .join("config.toml")
    }

    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Load configuration, falling back to defaults when absent
    pub async fn load(&self) -> PodpatchResult<Config> {
        if !self.config_path.exists() {
            debug!("Config file not found, using defaults");
            return Ok(Config::default());
        }

        let content = fs::read_to_string(&self.config_path).await.map_err(|e| {
            PodpatchError::io(
                format!("reading config from {}", self.config_path.display()),
                e,
            )
        })?;

        toml::from_str(&content).map_err(|e| PodpatchError::ConfigInvalid {
            path: self.config_path.clone(),
            reason: e.to_string(),
        })
    }

    /// Save configuration to file
    pub async fn save(&self, config: &Config) -> PodpatchResult<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| PodpatchError::io("creating config directory", e))?;
        }

        let content = toml::to_string_pretty(config)?;
        fs::write(&self.config_path, content).await.map_err(|e| {
            PodpatchError::io(
                format!("writing config to {}", self.config_path.display()),
                e,
            )
        })
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}
