//! File-backed storage and relation-integrity engine for notegraph.

pub mod engine;
pub mod errors;
pub mod lock;
pub mod models;
pub mod naming;
pub mod parser;
pub mod paths;
pub mod storage;

pub use engine::NoteStore;
pub use errors::{StoreError, StoreResult};
pub use lock::{PathGuard, PathLocks};
pub use models::{
    Concept, ConceptMetadata, Entity, EntityRef, Idea, IdeaInput, IdeaMetadata, IdeaUpdate,
    IntegrityIssue, IssueKind, Location, MediaFile, MediaKind, Note, NoteMetadata, NoteSummary,
    PinKind, PinnedItems, RepairAction, RepairReport, SaveNoteRequest, Severity,
    ValidationReport, ValidationStats,
};
pub use notegraph_core::StoreSettings;
