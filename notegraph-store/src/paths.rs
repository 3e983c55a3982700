use std::path::{Path, PathBuf};

use notegraph_core::StoreSettings;

use crate::errors::{StoreError, StoreResult};

pub const INBOX_DIR: &str = "inbox";
pub const CONCEPTS_DIR: &str = "concepts";
pub const METADATA_DIR: &str = ".notes-metadata";
pub const PREFERENCES_FILE: &str = "preferences.json";
pub const CONCEPT_EXT: &str = ".txt";

/// Resolve the storage root from settings.
pub fn store_root(settings: &StoreSettings) -> StoreResult<PathBuf> {
    settings.resolve_root().ok_or(StoreError::MissingDataDir)
}

/// On-disk layout of a store rooted at one directory.
#[derive(Debug, Clone)]
pub struct StoreLayout {
    root: PathBuf,
}

impl StoreLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn notes_dir(&self) -> &Path {
        &self.root
    }

    pub fn inbox_dir(&self) -> PathBuf {
        self.root.join(INBOX_DIR)
    }

    pub fn concepts_dir(&self) -> PathBuf {
        self.root.join(CONCEPTS_DIR)
    }

    pub fn metadata_dir(&self) -> PathBuf {
        self.root.join(METADATA_DIR)
    }

    pub fn preferences_path(&self) -> PathBuf {
        self.metadata_dir().join(PREFERENCES_FILE)
    }

    pub fn note_path(&self, filename: &str) -> PathBuf {
        self.root.join(filename)
    }

    pub fn inbox_path(&self, filename: &str) -> PathBuf {
        self.inbox_dir().join(filename)
    }

    pub fn concept_path(&self, name: &str) -> PathBuf {
        self.concepts_dir().join(format!("{name}{CONCEPT_EXT}"))
    }

    /// Directories sharing the flat filename namespace.
    pub fn namespace_dirs(&self) -> [PathBuf; 2] {
        [self.root.clone(), self.inbox_dir()]
    }

    /// Create the directory skeleton if missing.
    pub async fn ensure_dirs(&self) -> StoreResult<()> {
        tokio::fs::create_dir_all(&self.root).await?;
        tokio::fs::create_dir_all(self.inbox_dir()).await?;
        tokio::fs::create_dir_all(self.concepts_dir()).await?;
        tokio::fs::create_dir_all(self.metadata_dir()).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_paths() {
        let layout = StoreLayout::new("/kb");
        assert_eq!(layout.inbox_path("idea.txt"), PathBuf::from("/kb/inbox/idea.txt"));
        assert_eq!(
            layout.concept_path("rust"),
            PathBuf::from("/kb/concepts/rust.txt")
        );
        assert_eq!(
            layout.preferences_path(),
            PathBuf::from("/kb/.notes-metadata/preferences.json")
        );
        assert_eq!(layout.note_path("a.md"), PathBuf::from("/kb/a.md"));
    }
}
