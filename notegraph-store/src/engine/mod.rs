use std::path::PathBuf;

use notegraph_core::StoreSettings;
use tracing::info;

use crate::errors::StoreResult;
use crate::lock::PathLocks;
use crate::models::{
    Concept, Entity, EntityRef, Idea, IdeaInput, IdeaUpdate, MediaFile, Note, NoteSummary,
    PinKind, PinnedItems, RepairReport, SaveNoteRequest, ValidationReport,
};
use crate::paths::{StoreLayout, store_root};

pub(crate) mod concepts;
pub(crate) mod ideas;
pub(crate) mod integrity;
pub(crate) mod media;
pub(crate) mod notes;
pub(crate) mod preferences;
pub(crate) mod relations;

/// File-backed note, idea and concept store with bidirectional relations.
///
/// Cloning is cheap; clones share the same per-path lock map, so every
/// task writing into one root should use clones of a single instance.
#[derive(Debug, Clone)]
pub struct NoteStore {
    settings: StoreSettings,
    layout: StoreLayout,
    locks: PathLocks,
}

impl NoteStore {
    /// Open a store from settings, creating the directory skeleton.
    pub async fn open(settings: StoreSettings) -> StoreResult<Self> {
        let root = store_root(&settings)?;
        let layout = StoreLayout::new(root);
        layout.ensure_dirs().await?;
        info!(root = %layout.root().display(), "note store opened");
        Ok(Self {
            settings,
            layout,
            locks: PathLocks::new(),
        })
    }

    /// Open a store rooted at `root` with default settings.
    pub async fn open_at(root: impl Into<PathBuf>) -> StoreResult<Self> {
        Self::open(StoreSettings::with_root(root)).await
    }

    pub fn settings(&self) -> &StoreSettings {
        &self.settings
    }

    pub fn layout(&self) -> &StoreLayout {
        &self.layout
    }

    /// Access the per-path lock map.
    pub fn locks(&self) -> &PathLocks {
        &self.locks
    }

    // ── Notes ───────────────────────────────────────────────────────

    /// Write a note and bring concept edges in line before returning.
    pub async fn save_note(&self, request: SaveNoteRequest) -> StoreResult<Note> {
        notes::save_note(self, request).await
    }

    pub async fn load_note(&self, filename: &str) -> StoreResult<Note> {
        notes::load_note(self, filename).await
    }

    /// Sever every edge of the note, then delete it.
    pub async fn delete_note(&self, filename: &str) -> StoreResult<()> {
        notes::delete_note(self, filename).await
    }

    /// Rename a note, migrating edges, media sidecars and pins.
    pub async fn rename_note(&self, old_filename: &str, new_filename: &str) -> StoreResult<Note> {
        notes::rename_note(self, old_filename, new_filename).await
    }

    /// Notes outside the inbox, most recently modified first.
    pub async fn list_notes(&self) -> StoreResult<Vec<NoteSummary>> {
        notes::list_notes(self).await
    }

    /// Case-insensitive substring search over notes and ideas.
    pub async fn search(&self, query: &str) -> StoreResult<Vec<NoteSummary>> {
        notes::search(self, query).await
    }

    /// Combine several notes into a new one and delete the sources.
    pub async fn merge_notes(&self, filenames: &[String], title: &str) -> StoreResult<Note> {
        notes::merge_notes(self, filenames, title).await
    }

    /// Attach the concepts and links mentioned in the note body.
    pub async fn enrich_note(&self, filename: &str) -> StoreResult<Note> {
        notes::enrich_note(self, filename).await
    }

    // ── Ideas ───────────────────────────────────────────────────────

    /// Capture a draft into the inbox.
    pub async fn create_idea(&self, content: &str, input: IdeaInput) -> StoreResult<Idea> {
        ideas::create_idea(self, content, input).await
    }

    pub async fn load_idea(&self, filename: &str) -> StoreResult<Idea> {
        ideas::load_idea(self, filename).await
    }

    pub async fn update_idea(&self, filename: &str, update: IdeaUpdate) -> StoreResult<Idea> {
        ideas::update_idea(self, filename, update).await
    }

    pub async fn delete_idea(&self, filename: &str) -> StoreResult<()> {
        ideas::delete_idea(self, filename).await
    }

    pub async fn list_ideas(&self) -> StoreResult<Vec<NoteSummary>> {
        ideas::list_ideas(self).await
    }

    /// Turn an idea into a permanent note with bidirectional concept edges.
    pub async fn promote_idea_to_note(
        &self,
        idea_filename: &str,
        title: &str,
        concepts: &[String],
    ) -> StoreResult<Note> {
        ideas::promote_idea_to_note(self, idea_filename, title, concepts).await
    }

    // ── Concepts ────────────────────────────────────────────────────

    pub async fn create_concept(&self, name: &str, content: &str) -> StoreResult<Concept> {
        concepts::create_concept(self, name, content).await
    }

    pub async fn get_concept(&self, name: &str) -> StoreResult<Concept> {
        concepts::get_concept(self, name).await
    }

    /// Save concept content; `related` replaces the concept relations.
    pub async fn save_concept(
        &self,
        name: &str,
        content: &str,
        related: Option<Vec<String>>,
    ) -> StoreResult<Concept> {
        concepts::save_concept(self, name, content, related).await
    }

    pub async fn ensure_concept(&self, name: &str) -> StoreResult<Concept> {
        concepts::ensure_concept(self, name).await
    }

    /// Delete a concept no note references.
    pub async fn delete_concept(&self, name: &str) -> StoreResult<()> {
        concepts::delete_concept(self, name).await
    }

    pub async fn list_concepts(&self) -> StoreResult<Vec<Concept>> {
        concepts::list_concepts(self).await
    }

    // ── Media ───────────────────────────────────────────────────────

    pub async fn save_media(
        &self,
        bytes: &[u8],
        original_name: &str,
        parent_note: Option<&str>,
    ) -> StoreResult<MediaFile> {
        media::save_media(self, bytes, original_name, parent_note).await
    }

    pub async fn list_media_for_note(&self, note_filename: &str) -> StoreResult<Vec<MediaFile>> {
        media::list_media_for_note(self, note_filename).await
    }

    pub async fn list_media(&self) -> StoreResult<Vec<MediaFile>> {
        media::list_media(self).await
    }

    pub async fn load_media(&self, filename: &str) -> StoreResult<(MediaFile, Vec<u8>)> {
        media::load_media(self, filename).await
    }

    pub async fn delete_media(&self, filename: &str) -> StoreResult<()> {
        media::delete_media(self, filename).await
    }

    // ── Relations ───────────────────────────────────────────────────
    // Note-side operations reject inbox ideas with `InvalidRequest`.

    pub async fn add_note_concept(&self, note: &str, concept: &str) -> StoreResult<()> {
        relations::add_note_concept(self, note, concept).await
    }

    pub async fn remove_note_concept(&self, note: &str, concept: &str) -> StoreResult<()> {
        relations::remove_note_concept(self, note, concept).await
    }

    pub async fn update_note_concepts(
        &self,
        note: &str,
        old: &[String],
        new: &[String],
    ) -> StoreResult<()> {
        relations::update_note_concepts(self, note, old, new).await
    }

    pub async fn add_note_link(&self, source: &str, target: &str) -> StoreResult<()> {
        relations::add_note_link(self, source, target).await
    }

    pub async fn remove_note_link(&self, source: &str, target: &str) -> StoreResult<()> {
        relations::remove_note_link(self, source, target).await
    }

    pub async fn update_note_links(
        &self,
        note: &str,
        old: &[String],
        new: &[String],
    ) -> StoreResult<()> {
        relations::update_note_links(self, note, old, new).await
    }

    pub async fn add_concept_relation(&self, a: &str, b: &str) -> StoreResult<()> {
        relations::add_concept_relation(self, a, b).await
    }

    pub async fn remove_concept_relation(&self, a: &str, b: &str) -> StoreResult<()> {
        relations::remove_concept_relation(self, a, b).await
    }

    pub async fn update_concept_relations(
        &self,
        concept: &str,
        old: &[String],
        new: &[String],
    ) -> StoreResult<()> {
        relations::update_concept_relations(self, concept, old, new).await
    }

    /// Scan the whole graph for integrity drift.
    pub async fn validate_relations(&self) -> StoreResult<ValidationReport> {
        integrity::validate_relations(self).await
    }

    /// Validate, then apply every issue's repair action.
    pub async fn repair_relations(&self) -> StoreResult<RepairReport> {
        integrity::repair_relations(self).await
    }

    // ── Preferences ─────────────────────────────────────────────────

    pub async fn get_pinned_items(&self) -> StoreResult<PinnedItems> {
        preferences::get_pinned_items(self).await
    }

    pub async fn pin_item(&self, kind: PinKind, name: &str) -> StoreResult<PinnedItems> {
        preferences::pin_item(self, kind, name).await
    }

    pub async fn unpin_item(&self, kind: PinKind, name: &str) -> StoreResult<PinnedItems> {
        preferences::unpin_item(self, kind, name).await
    }

    /// Most recently modified notes; `limit` defaults to the configured value.
    pub async fn get_recent_notes(&self, limit: Option<usize>) -> StoreResult<Vec<NoteSummary>> {
        preferences::get_recent_notes(self, limit).await
    }

    // ── Entities ────────────────────────────────────────────────────

    pub async fn load_entity(&self, entity: &EntityRef) -> StoreResult<Entity> {
        match entity {
            EntityRef::Idea(filename) => self.load_idea(filename).await.map(Entity::Idea),
            EntityRef::Note(filename) => self.load_note(filename).await.map(Entity::Note),
            EntityRef::Concept(name) => self.get_concept(name).await.map(Entity::Concept),
        }
    }
}
