use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Where a note-like file lives.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Location {
    Inbox,
    Notes,
}

impl Location {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inbox => "inbox",
            Self::Notes => "notes",
        }
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata carried by an idea. Concepts and links are informational.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IdeaMetadata {
    pub title: String,
    #[serde(default)]
    pub concepts: Vec<String>,
    #[serde(default)]
    pub links: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Idea {
    pub id: String,
    pub filename: String,
    pub content: String,
    pub metadata: IdeaMetadata,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
    pub location: Location,
}

/// Optional metadata supplied when capturing an idea.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdeaInput {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub concepts: Vec<String>,
    #[serde(default)]
    pub links: Vec<String>,
    #[serde(default)]
    pub source: Option<String>,
}

/// Partial update of an idea; `None` keeps the stored value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdeaUpdate {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub concepts: Option<Vec<String>>,
    #[serde(default)]
    pub links: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NoteMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub concepts: Vec<String>,
    #[serde(default)]
    pub links: Vec<String>,
    #[serde(default)]
    pub backlinks: Vec<String>,
    /// Derived from the body on every read.
    #[serde(default)]
    pub urls: Vec<String>,
    pub created: Option<DateTime<Utc>>,
    pub modified: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Note {
    pub filename: String,
    pub content: String,
    pub metadata: NoteMetadata,
    pub location: Location,
}

impl Note {
    /// Title from metadata, falling back to the filename stem.
    pub fn display_title(&self) -> String {
        self.metadata
            .title
            .clone()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| crate::naming::file_stem(&self.filename).to_string())
    }
}

/// Input for `save_note`. Backlinks are owned by other notes and are never
/// taken from the caller.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SaveNoteRequest {
    pub filename: String,
    pub content: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub concepts: Vec<String>,
    #[serde(default)]
    pub links: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConceptMetadata {
    #[serde(default)]
    pub linked_notes: Vec<String>,
    #[serde(default)]
    pub related_concepts: Vec<String>,
    pub created: Option<DateTime<Utc>>,
    pub modified: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Concept {
    pub name: String,
    pub content: String,
    pub metadata: ConceptMetadata,
}

/// Media attachment category, encoded in sidecar filenames.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Audio,
    Video,
    File,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Audio => "audio",
            Self::Video => "video",
            Self::File => "file",
        }
    }

    pub fn from_mime(mime: &str) -> Self {
        match mime.split('/').next() {
            Some("image") => Self::Image,
            Some("audio") => Self::Audio,
            Some("video") => Self::Video,
            _ => Self::File,
        }
    }
}

impl FromStr for MediaKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "image" => Ok(Self::Image),
            "audio" => Ok(Self::Audio),
            "video" => Ok(Self::Video),
            "file" => Ok(Self::File),
            _ => Err(()),
        }
    }
}

/// MIME type guessed from a file extension (with or without the dot).
pub fn mime_for_extension(ext: &str) -> &'static str {
    match ext.trim_start_matches('.').to_ascii_lowercase().as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "bmp" => "image/bmp",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "ogg" => "audio/ogg",
        "m4a" => "audio/mp4",
        "flac" => "audio/flac",
        "webm" => "video/webm",
        "mp4" => "video/mp4",
        "mov" => "video/quicktime",
        "mkv" => "video/x-matroska",
        "pdf" => "application/pdf",
        "txt" => "text/plain",
        "md" => "text/markdown",
        "json" => "application/json",
        "zip" => "application/zip",
        _ => "application/octet-stream",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MediaFile {
    pub filename: String,
    pub mime_type: String,
    pub size: u64,
    pub modified: Option<DateTime<Utc>>,
    /// Owning note base name, when the filename follows the sidecar pattern.
    pub owner: Option<String>,
    pub location: Location,
}

/// Address of a stored entity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "name", rename_all = "lowercase")]
pub enum EntityRef {
    Idea(String),
    Note(String),
    Concept(String),
}

/// Any stored entity, discriminated explicitly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Entity {
    Idea(Idea),
    Note(Note),
    Concept(Concept),
}

impl Entity {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Idea(_) => "idea",
            Self::Note(_) => "note",
            Self::Concept(_) => "concept",
        }
    }

    /// Filename for ideas and notes, name for concepts.
    pub fn name(&self) -> &str {
        match self {
            Self::Idea(idea) => &idea.filename,
            Self::Note(note) => &note.filename,
            Self::Concept(concept) => &concept.name,
        }
    }
}

/// Listing row for notes and ideas.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NoteSummary {
    pub filename: String,
    pub title: String,
    pub location: Location,
    pub modified: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub snippet: String,
}

/// Which pinned list an item belongs to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PinKind {
    Note,
    Concept,
}

impl FromStr for PinKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "note" | "notes" => Ok(Self::Note),
            "concept" | "concepts" => Ok(Self::Concept),
            other => Err(format!("unknown pin kind: {other}")),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PinnedItems {
    #[serde(default)]
    pub notes: Vec<String>,
    #[serde(default)]
    pub concepts: Vec<String>,
}

/// Contents of `.notes-metadata/preferences.json`. Unknown keys are kept.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Preferences {
    #[serde(default)]
    pub pinned: PinnedItems,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Category of an integrity problem.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum IssueKind {
    OrphanedBacklink,
    MissingBacklink,
    InvalidConcept,
    BrokenLink,
    OrphanedMedia,
}

impl IssueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OrphanedBacklink => "orphaned-backlink",
            Self::MissingBacklink => "missing-backlink",
            Self::InvalidConcept => "invalid-concept",
            Self::BrokenLink => "broken-link",
            Self::OrphanedMedia => "orphaned-media",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Self::OrphanedMedia => Severity::Warning,
            _ => Severity::Error,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// Corrective action attached to an issue when it is detected.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum RepairAction {
    RemoveLinkedNote { concept: String, note: String },
    AddLinkedNote { concept: String, note: String },
    RemoveNoteConcept { note: String, concept: String },
    RemoveRelatedConcept { concept: String, related: String },
    AddRelatedConcept { concept: String, related: String },
    AddBacklink { note: String, source: String },
    RemoveBacklink { note: String, source: String },
    ReportOnly,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IntegrityIssue {
    pub kind: IssueKind,
    pub severity: Severity,
    /// Entity whose metadata holds the offending endpoint.
    pub source: String,
    pub target: String,
    pub description: String,
    pub repair: RepairAction,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValidationStats {
    pub notes_checked: usize,
    pub concepts_checked: usize,
    pub relations_checked: usize,
    pub media_checked: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ValidationReport {
    pub has_issues: bool,
    pub issues: Vec<IntegrityIssue>,
    pub stats: ValidationStats,
}

impl ValidationReport {
    pub fn count(&self, kind: IssueKind) -> usize {
        self.issues.iter().filter(|issue| issue.kind == kind).count()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RepairReport {
    pub fixed: usize,
    /// Human-readable log of actions taken.
    pub issues: Vec<String>,
}

pub fn generate_idea_id() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_kind_from_mime() {
        assert_eq!(MediaKind::from_mime("image/png"), MediaKind::Image);
        assert_eq!(MediaKind::from_mime("audio/mpeg"), MediaKind::Audio);
        assert_eq!(MediaKind::from_mime("video/mp4"), MediaKind::Video);
        assert_eq!(MediaKind::from_mime("application/pdf"), MediaKind::File);
        assert_eq!(mime_for_extension(".JPG"), "image/jpeg");
        assert_eq!(mime_for_extension("weird"), "application/octet-stream");
    }

    #[test]
    fn entity_serializes_with_kind_tag() {
        let entity = Entity::Concept(Concept {
            name: "rust".to_string(),
            content: String::new(),
            metadata: ConceptMetadata::default(),
        });
        let value = serde_json::to_value(&entity).unwrap();
        assert_eq!(value["kind"], "concept");
        assert_eq!(value["name"], "rust");
        assert_eq!(value["metadata"]["linkedNotes"], serde_json::json!([]));
        assert_eq!(entity.name(), "rust");
    }

    #[test]
    fn preferences_keep_unknown_keys() {
        let raw = r#"{"pinned":{"notes":["a.txt"],"concepts":[]},"theme":"dark"}"#;
        let prefs: Preferences = serde_json::from_str(raw).unwrap();
        assert_eq!(prefs.pinned.notes, vec!["a.txt".to_string()]);
        let back = serde_json::to_value(&prefs).unwrap();
        assert_eq!(back["theme"], "dark");
    }

    #[test]
    fn issue_kind_strings() {
        assert_eq!(IssueKind::OrphanedBacklink.as_str(), "orphaned-backlink");
        assert_eq!(
            serde_json::to_value(IssueKind::MissingBacklink).unwrap(),
            "missing-backlink"
        );
        assert_eq!(IssueKind::OrphanedMedia.severity(), Severity::Warning);
        assert_eq!(IssueKind::InvalidConcept.severity(), Severity::Error);
        assert_eq!(IssueKind::BrokenLink.severity(), Severity::Error);
    }
}
