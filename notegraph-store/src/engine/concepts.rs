use std::path::Path;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::errors::{StoreError, StoreResult};
use crate::models::{Concept, ConceptMetadata, Location};
use crate::naming::validate_concept_name;
use crate::parser::{self, RecordMeta};
use crate::paths::CONCEPT_EXT;
use crate::storage::{file_times, list_files, read_text, remove_if_exists, write_atomic};

use super::{NoteStore, notes, preferences, relations};

/// Keep only the header keys a concept file carries.
fn concept_meta(meta: RecordMeta) -> RecordMeta {
    RecordMeta {
        title: meta.title,
        created: meta.created,
        modified: meta.modified,
        linked_notes: Some(meta.linked_notes.unwrap_or_default()),
        related_concepts: Some(meta.related_concepts.unwrap_or_default()),
        ..Default::default()
    }
}

async fn read_concept(path: &Path, name: &str) -> StoreResult<Option<Concept>> {
    let Some(raw) = read_text(path).await? else {
        return Ok(None);
    };
    let (fs_created, fs_modified) = file_times(path).await;
    let record = parser::decode(&raw);
    let meta = record.meta;
    Ok(Some(Concept {
        name: name.to_string(),
        content: record.content,
        metadata: ConceptMetadata {
            linked_notes: meta.linked_notes.unwrap_or_default(),
            related_concepts: meta.related_concepts.unwrap_or_default(),
            created: meta.created.or(fs_created),
            modified: meta.modified.or(fs_modified),
        },
    }))
}

/// Write a fresh concept file. Caller holds the path lock.
async fn write_new_concept(path: &Path, content: &str) -> StoreResult<()> {
    let now = Utc::now();
    let meta = concept_meta(RecordMeta {
        created: Some(now),
        modified: Some(now),
        ..Default::default()
    });
    write_atomic(path, parser::encode(content, &meta).as_bytes()).await
}

pub(crate) async fn require_concept(store: &NoteStore, name: &str) -> StoreResult<()> {
    validate_concept_name(name)?;
    if !tokio::fs::try_exists(store.layout().concept_path(name)).await? {
        return Err(StoreError::ConceptNotFound(name.to_string()));
    }
    Ok(())
}

/// Locked read-modify-write of a concept header.
pub(crate) async fn modify_concept<F>(store: &NoteStore, name: &str, apply: F) -> StoreResult<bool>
where
    F: FnOnce(&mut RecordMeta) -> bool,
{
    validate_concept_name(name)?;
    let path = store.layout().concept_path(name);
    let _guard = store.locks().acquire(&path).await;
    let raw = read_text(&path)
        .await?
        .ok_or_else(|| StoreError::ConceptNotFound(name.to_string()))?;
    let record = parser::decode(&raw);
    let mut meta = concept_meta(record.meta);
    if !apply(&mut meta) {
        return Ok(false);
    }
    write_atomic(&path, parser::encode(&record.content, &meta).as_bytes()).await?;
    debug!(concept = name, "concept header updated");
    Ok(true)
}

pub(crate) async fn get_concept(store: &NoteStore, name: &str) -> StoreResult<Concept> {
    validate_concept_name(name)?;
    read_concept(&store.layout().concept_path(name), name)
        .await?
        .ok_or_else(|| StoreError::ConceptNotFound(name.to_string()))
}

pub(crate) async fn create_concept(
    store: &NoteStore,
    name: &str,
    content: &str,
) -> StoreResult<Concept> {
    validate_concept_name(name)?;
    let path = store.layout().concept_path(name);
    {
        let _guard = store.locks().acquire(&path).await;
        if tokio::fs::try_exists(&path).await? {
            return Err(StoreError::ConceptExists(name.to_string()));
        }
        write_new_concept(&path, content).await?;
    }
    info!(concept = name, "concept created");
    get_concept(store, name).await
}

/// Create the concept with an empty body unless it already exists.
pub(crate) async fn ensure_concept(store: &NoteStore, name: &str) -> StoreResult<Concept> {
    validate_concept_name(name)?;
    let path = store.layout().concept_path(name);
    let created = {
        let _guard = store.locks().acquire(&path).await;
        if tokio::fs::try_exists(&path).await? {
            false
        } else {
            write_new_concept(&path, "").await?;
            true
        }
    };
    if created {
        info!(concept = name, "concept created implicitly");
    }
    get_concept(store, name).await
}

pub(crate) async fn save_concept(
    store: &NoteStore,
    name: &str,
    content: &str,
    related: Option<Vec<String>>,
) -> StoreResult<Concept> {
    validate_concept_name(name)?;
    let path = store.layout().concept_path(name);
    let old_related = {
        let _guard = store.locks().acquire(&path).await;
        let previous = read_text(&path).await?.map(|raw| parser::decode(&raw).meta);
        let now = Utc::now();
        let mut meta = concept_meta(previous.unwrap_or_default());
        meta.created = meta.created.or(Some(now));
        meta.modified = Some(now);
        write_atomic(&path, parser::encode(content, &meta).as_bytes()).await?;
        meta.related_concepts.unwrap_or_default()
    };
    debug!(concept = name, "concept saved");

    if let Some(related) = related {
        relations::update_concept_relations(store, name, &old_related, &related).await?;
    }
    get_concept(store, name).await
}

/// Refuse while any note lists the concept; otherwise detach it from its
/// related concepts and delete the file.
pub(crate) async fn delete_concept(store: &NoteStore, name: &str) -> StoreResult<()> {
    let concept = get_concept(store, name).await?;

    let mut blocking: Vec<String> = notes::notes_in(store, Location::Notes)
        .await?
        .into_iter()
        .filter(|note| note.metadata.concepts.iter().any(|c| c == name))
        .map(|note| note.filename)
        .collect();
    if !blocking.is_empty() {
        blocking.sort();
        return Err(StoreError::ConceptInUse {
            concept: name.to_string(),
            notes: blocking,
        });
    }

    for related in &concept.metadata.related_concepts {
        match modify_concept(store, related, |meta| {
            relations::remove_item(&mut meta.related_concepts, name)
        })
        .await
        {
            Ok(_) => {}
            Err(err) if err.is_not_found() => {
                warn!(concept = name, related = %related, "related concept missing; skipped")
            }
            Err(err) => return Err(err),
        }
    }

    let path = store.layout().concept_path(name);
    let removed = {
        let _guard = store.locks().acquire(&path).await;
        remove_if_exists(&path).await?
    };
    if !removed {
        return Err(StoreError::ConceptNotFound(name.to_string()));
    }
    preferences::forget_concept(store, name).await?;
    info!(concept = name, "concept deleted");
    Ok(())
}

/// Concept names on disk, sorted.
pub(crate) async fn concept_names(store: &NoteStore) -> StoreResult<Vec<String>> {
    Ok(list_files(&store.layout().concepts_dir())
        .await?
        .into_iter()
        .filter_map(|file| file.strip_suffix(CONCEPT_EXT).map(str::to_string))
        .filter(|name| validate_concept_name(name).is_ok())
        .collect())
}

pub(crate) async fn list_concepts(store: &NoteStore) -> StoreResult<Vec<Concept>> {
    let mut concepts = Vec::new();
    for name in concept_names(store).await? {
        if let Some(concept) = read_concept(&store.layout().concept_path(&name), &name).await? {
            concepts.push(concept);
        }
    }
    Ok(concepts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn concept_meta_drops_note_keys() {
        let meta = concept_meta(RecordMeta {
            concepts: Some(vec!["derived".to_string()]),
            links: Some(vec!["x".to_string()]),
            linked_notes: Some(vec!["a.txt".to_string()]),
            ..Default::default()
        });
        assert!(meta.concepts.is_none());
        assert!(meta.links.is_none());
        assert_eq!(meta.linked_notes, Some(vec!["a.txt".to_string()]));
        assert_eq!(meta.related_concepts, Some(Vec::new()));
    }
}
