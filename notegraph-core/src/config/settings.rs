//! `config.toml` parsing and first-run creation.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

const DEFAULT_CONFIG_TOML: &str = r#"# notegraph configuration

[store]
# root = "/path/to/notes"   # Falls back to $NOTEGRAPH_DATA_DIR, then the XDG data dir
recent_limit = 20
idea_title_max = 60

[logging]
level = "info"
"#;

/// Settings loaded from TOML configuration file.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Settings {
    /// Storage engine configuration
    #[serde(default)]
    pub store: StoreToolsSettings,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// User-facing store settings; every field is optional and resolved into
/// [`crate::StoreSettings`].
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StoreToolsSettings {
    /// Root directory of the note store
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<String>,

    /// Number of notes returned by the recent-notes list
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recent_limit: Option<usize>,

    /// Longest first line kept verbatim as an idea title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idea_title_max: Option<usize>,
}

/// Logging settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingSettings {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Errors that can occur when loading settings
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Config directory not found")]
    ConfigDirNotFound,
}

impl Settings {
    /// Load `config.toml`, writing the commented default on first run.
    pub fn load() -> Result<Self, SettingsError> {
        let config_path = Self::config_path()?;
        Self::load_from_path(&config_path)
    }

    /// Load settings from a specific path, creating a default file if missing.
    pub fn load_from_path(config_path: &Path) -> Result<Self, SettingsError> {
        if !config_path.exists() {
            tracing::info!("Creating default configuration at {:?}", config_path);
            Self::create_default_config(config_path)?;
        }

        let content = fs::read_to_string(config_path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, SettingsError> {
        let settings: Self = toml::from_str(content)?;
        Ok(settings)
    }

    /// `$NOTEGRAPH_CONFIG_DIR/config.toml`, else `~/.config/notegraph/config.toml`.
    pub fn config_path() -> Result<PathBuf, SettingsError> {
        if let Ok(override_dir) = std::env::var("NOTEGRAPH_CONFIG_DIR") {
            let dir = PathBuf::from(override_dir);
            return Ok(dir.join("config.toml"));
        }

        let config_dir = dirs::config_dir()
            .ok_or(SettingsError::ConfigDirNotFound)?
            .join("notegraph");

        Ok(config_dir.join("config.toml"))
    }

    fn create_default_config(path: &Path) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, DEFAULT_CONFIG_TOML)?;
        Ok(())
    }
}
