#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("missing storage root: no override and no data directory")]
    MissingDataDir,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid filename '{0}': expected letters, digits, spaces, '_', '-', '.' ending in .txt or .md (max 255 chars)")]
    InvalidFilename(String),
    #[error("invalid concept name '{0}'")]
    InvalidConceptName(String),
    #[error("invalid title: {0}")]
    InvalidTitle(String),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("note not found: {0}")]
    NoteNotFound(String),
    #[error("idea not found: {0}")]
    IdeaNotFound(String),
    #[error("concept not found: {0}")]
    ConceptNotFound(String),
    #[error("media file not found: {0}")]
    MediaNotFound(String),
    #[error("a file named '{0}' already exists")]
    FilenameConflict(String),
    #[error("concept '{0}' already exists")]
    ConceptExists(String),
    #[error("cannot delete concept '{concept}': still referenced by {}", .notes.join(", "))]
    ConceptInUse { concept: String, notes: Vec<String> },
}

impl StoreError {
    /// Whether this error reports a missing entity or file.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NoteNotFound(_)
            | Self::IdeaNotFound(_)
            | Self::ConceptNotFound(_)
            | Self::MediaNotFound(_) => true,
            Self::Io(err) => err.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn concept_in_use_lists_every_blocking_note() {
        let err = StoreError::ConceptInUse {
            concept: "project".to_string(),
            notes: vec!["a.txt".to_string(), "b.md".to_string()],
        };
        let message = err.to_string();
        assert!(message.contains("project"));
        assert!(message.contains("a.txt, b.md"));
    }

    #[test]
    fn io_not_found_counts_as_not_found() {
        let err = StoreError::from(std::io::Error::from(std::io::ErrorKind::NotFound));
        assert!(err.is_not_found());
        assert!(!StoreError::FilenameConflict("x.txt".into()).is_not_found());
    }
}
