pub mod config;

// Config re-exports
pub use config::{
    Config,
    ConfigError,
    LoggingSettings,
    Settings,
    SettingsError,
    StoreSettings,
    StoreToolsSettings,
    load_dotenv,
};
