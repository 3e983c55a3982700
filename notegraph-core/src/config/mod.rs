//! Configuration management for notegraph.
//!
//! Settings live in a TOML file in the XDG config directory
//! (`~/.config/notegraph/config.toml`):
//! ```toml
//! [store]
//! root = "/home/me/notes"
//! recent_limit = 20
//! idea_title_max = 60
//!
//! [logging]
//! level = "info"
//! ```
//!
//! ## Environment overrides
//! - `NOTEGRAPH_CONFIG_DIR` - directory holding `config.toml`
//! - `NOTEGRAPH_DATA_DIR` - storage root when `[store].root` is unset

mod settings;
pub mod store;

pub use settings::{LoggingSettings, Settings, SettingsError, StoreToolsSettings};
pub use store::StoreSettings;

/// Loaded configuration: the raw settings plus the resolved store settings.
#[derive(Debug, Clone)]
pub struct Config {
    /// Settings loaded from the TOML configuration file
    pub settings: Settings,
    /// Store settings with every default filled in
    pub store: StoreSettings,
}

/// Errors that can occur when loading configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),
}

impl Config {
    /// Load `.env`, then the settings file, and resolve store settings.
    pub fn load() -> Result<Self, ConfigError> {
        load_dotenv();
        let settings = Settings::load()?;
        Ok(Self::from_settings(settings))
    }

    /// Build a config from already-parsed settings.
    pub fn from_settings(settings: Settings) -> Self {
        let store = StoreSettings::from(&settings.store);
        Self { settings, store }
    }

    /// Configured log level (error, warn, info, debug, trace).
    pub fn log_level(&self) -> &str {
        &self.settings.logging.level
    }
}

/// Load .env file if it exists (for development convenience).
///
/// This is called automatically by `Config::load()` but is also
/// exported for use in other contexts.
pub fn load_dotenv() {
    let _ = dotenvy::dotenv();
}
