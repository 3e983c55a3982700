//! Store configuration types.
//!
//! These types define the resolved (non-optional) settings used by
//! `notegraph-store`. They are created from the user-facing
//! `StoreToolsSettings` TOML structs via `From`.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::settings::StoreToolsSettings;

/// Resolved store settings (all values filled with defaults).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSettings {
    /// Explicit storage root. When unset, the root derives from
    /// `NOTEGRAPH_DATA_DIR` or the XDG data directory.
    #[serde(default)]
    pub root_override: Option<PathBuf>,
    #[serde(default = "default_recent_limit")]
    pub recent_limit: usize,
    #[serde(default = "default_idea_title_max")]
    pub idea_title_max: usize,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            root_override: None,
            recent_limit: default_recent_limit(),
            idea_title_max: default_idea_title_max(),
        }
    }
}

impl StoreSettings {
    /// Settings rooted at an explicit directory. Primarily for testing.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root_override: Some(root.into()),
            ..Default::default()
        }
    }

    /// Resolve the storage root: override, then `NOTEGRAPH_DATA_DIR`,
    /// then `<data_dir>/notegraph`.
    pub fn resolve_root(&self) -> Option<PathBuf> {
        if let Some(path) = &self.root_override {
            return Some(path.clone());
        }
        if let Ok(dir) = std::env::var("NOTEGRAPH_DATA_DIR") {
            return Some(PathBuf::from(dir));
        }
        dirs::data_dir().map(|dir| dir.join("notegraph"))
    }
}

fn default_recent_limit() -> usize {
    20
}

fn default_idea_title_max() -> usize {
    60
}

impl From<&StoreToolsSettings> for StoreSettings {
    fn from(value: &StoreToolsSettings) -> Self {
        let mut settings = StoreSettings::default();
        if let Some(root) = &value.root {
            settings.root_override = Some(PathBuf::from(root));
        }
        if let Some(limit) = value.recent_limit {
            settings.recent_limit = limit;
        }
        if let Some(max) = value.idea_title_max {
            settings.idea_title_max = max.max(4);
        }
        settings
    }
}
