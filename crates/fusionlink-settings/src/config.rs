//! Configuration management for FusionLink
//!
//! Provides configuration file handling and validation. Supports JSON and
//! TOML file formats stored in platform-specific directories.
//!
//! Configuration is organized into logical sections:
//! - Server settings (address, token, category, timeouts)
//! - Sync preferences (default-name prefixes, progress forwarding)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{SettingsError, SettingsResult};

/// InvenTree server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Server root address, e.g. `http://inventree.local:8000`
    pub address: String,
    /// API token
    pub token: String,
    /// Category name assigned to newly created parts
    pub category: Option<String>,
    /// Request timeout in milliseconds
    pub timeout_ms: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            address: String::new(),
            token: String::new(),
            category: None,
            timeout_ms: 30_000,
        }
    }
}

/// Sync behavior settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncSettings {
    /// Part-number prefixes treated as host-generated, never matched
    pub default_name_prefixes: Vec<String>,
    /// Whether to stream per-component progress while a run is in flight
    pub forward_progress: bool,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            default_name_prefixes: vec![
                "Component".to_string(),
                "Körper".to_string(),
                "Body".to_string(),
                "Occurrence".to_string(),
            ],
            forward_progress: true,
        }
    }
}

/// Complete application configuration
///
/// Aggregates all settings sections and provides file I/O operations.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Server settings
    pub server: ServerSettings,
    /// Sync preferences
    pub sync: SyncSettings,
}

impl Config {
    /// Create new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Load config from file (JSON or TOML, by extension)
    pub fn load_from_file(path: &Path) -> SettingsResult<Self> {
        if !path.exists() {
            return Err(SettingsError::NotFound {
                path: path.display().to_string(),
            });
        }
        let content = std::fs::read_to_string(path)
            .map_err(|e| SettingsError::LoadError(format!("failed to read config file: {}", e)))?;

        let config: Self = if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(&content)?
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            toml::from_str(&content)?
        } else {
            return Err(SettingsError::UnsupportedFormat(
                path.display().to_string(),
            ));
        };

        config.validate()?;
        Ok(config)
    }

    /// Save config to file (JSON or TOML, by extension)
    pub fn save_to_file(&self, path: &Path) -> SettingsResult<()> {
        let content = if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::to_string_pretty(self)?
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            toml::to_string_pretty(self)
                .map_err(|e| SettingsError::SaveError(format!("failed to serialize: {}", e)))?
        } else {
            return Err(SettingsError::UnsupportedFormat(
                path.display().to_string(),
            ));
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate configuration
    ///
    /// A run must not start with an unreachable or unauthenticated server,
    /// so an empty address or token is rejected up front.
    pub fn validate(&self) -> SettingsResult<()> {
        if self.server.address.trim().is_empty() {
            return Err(SettingsError::InvalidSetting {
                key: "server.address".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        if !self.server.address.starts_with("http://")
            && !self.server.address.starts_with("https://")
        {
            return Err(SettingsError::InvalidSetting {
                key: "server.address".to_string(),
                reason: "must start with http:// or https://".to_string(),
            });
        }
        if self.server.token.trim().is_empty() {
            return Err(SettingsError::InvalidSetting {
                key: "server.token".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        if self.server.timeout_ms == 0 {
            return Err(SettingsError::InvalidSetting {
                key: "server.timeout_ms".to_string(),
                reason: "must be > 0".to_string(),
            });
        }
        Ok(())
    }
}

/// Platform-specific configuration directory
pub fn config_dir() -> SettingsResult<PathBuf> {
    dirs::config_dir()
        .map(|dir| dir.join("fusionlink"))
        .ok_or_else(|| {
            SettingsError::ConfigDirectory("no config directory on this platform".to_string())
        })
}

/// Default configuration file path
pub fn default_path() -> SettingsResult<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}
