use std::path::PathBuf;

use chrono::Utc;
use tracing::{debug, info};

use crate::errors::{StoreError, StoreResult};
use crate::models::{Location, Note, NoteMetadata, NoteSummary, SaveNoteRequest};
use crate::naming::{
    slugify_title, unique_filename, validate_concept_name, validate_note_filename,
};
use crate::parser::{self, Record, RecordMeta};
use crate::storage::{file_times, is_note_file, list_files, read_text, remove_if_exists, write_atomic};

use super::{NoteStore, concepts, ideas, media, preferences, relations};

const SNIPPET_CHARS: usize = 120;

/// Locate a note file: the notes root first, then the inbox.
pub(crate) async fn find_note(
    store: &NoteStore,
    filename: &str,
) -> StoreResult<Option<(PathBuf, Location)>> {
    validate_note_filename(filename)?;
    let layout = store.layout();
    let candidates = [
        (layout.note_path(filename), Location::Notes),
        (layout.inbox_path(filename), Location::Inbox),
    ];
    for (path, location) in candidates {
        if tokio::fs::try_exists(&path).await? {
            return Ok(Some((path, location)));
        }
    }
    Ok(None)
}

pub(crate) async fn require_note(
    store: &NoteStore,
    filename: &str,
) -> StoreResult<(PathBuf, Location)> {
    find_note(store, filename)
        .await?
        .ok_or_else(|| StoreError::NoteNotFound(filename.to_string()))
}

/// Locked read-modify-write of a note header. `apply` returns whether it
/// changed anything; unchanged records are not rewritten.
pub(crate) async fn modify_note<F>(store: &NoteStore, filename: &str, apply: F) -> StoreResult<bool>
where
    F: FnOnce(&mut RecordMeta) -> bool,
{
    let (path, _) = require_note(store, filename).await?;
    let _guard = store.locks().acquire(&path).await;
    let raw = read_text(&path)
        .await?
        .ok_or_else(|| StoreError::NoteNotFound(filename.to_string()))?;
    let mut record = parser::decode(&raw);
    if !apply(&mut record.meta) {
        return Ok(false);
    }
    write_atomic(&path, parser::encode(&record.content, &record.meta).as_bytes()).await?;
    debug!(note = filename, "note header updated");
    Ok(true)
}

pub(crate) async fn note_from_file(
    path: &std::path::Path,
    filename: &str,
    location: Location,
) -> StoreResult<Option<Note>> {
    let Some(raw) = read_text(path).await? else {
        return Ok(None);
    };
    let (fs_created, fs_modified) = file_times(path).await;
    let record = parser::decode(&raw);
    Ok(Some(note_from_record(filename, location, record, fs_created, fs_modified)))
}

fn note_from_record(
    filename: &str,
    location: Location,
    record: Record,
    fs_created: Option<chrono::DateTime<Utc>>,
    fs_modified: Option<chrono::DateTime<Utc>>,
) -> Note {
    let meta = record.meta;
    Note {
        filename: filename.to_string(),
        content: record.content,
        metadata: NoteMetadata {
            title: meta.title,
            concepts: meta.concepts.unwrap_or_default(),
            links: meta.links.unwrap_or_default(),
            backlinks: meta.backlinks.unwrap_or_default(),
            urls: record.urls,
            created: meta.created.or(fs_created),
            modified: meta.modified.or(fs_modified),
        },
        location,
    }
}

pub(crate) fn summarize(note: &Note) -> NoteSummary {
    NoteSummary {
        filename: note.filename.clone(),
        title: note.display_title(),
        location: note.location,
        modified: note.metadata.modified,
        snippet: String::new(),
    }
}

pub(crate) fn sort_recent_first(summaries: &mut [NoteSummary]) {
    summaries.sort_by(|a, b| {
        b.modified
            .cmp(&a.modified)
            .then_with(|| a.filename.cmp(&b.filename))
    });
}

/// Read every note file of one directory.
pub(crate) async fn notes_in(
    store: &NoteStore,
    location: Location,
) -> StoreResult<Vec<Note>> {
    let dir = match location {
        Location::Notes => store.layout().notes_dir().to_path_buf(),
        Location::Inbox => store.layout().inbox_dir(),
    };
    let mut notes = Vec::new();
    for filename in list_files(&dir).await? {
        if !is_note_file(&filename) {
            continue;
        }
        if let Some(note) = note_from_file(&dir.join(&filename), &filename, location).await? {
            notes.push(note);
        }
    }
    Ok(notes)
}

pub(crate) async fn save_note(store: &NoteStore, request: SaveNoteRequest) -> StoreResult<Note> {
    validate_note_filename(&request.filename)?;
    for concept in &request.concepts {
        validate_concept_name(concept)?;
    }
    let (path, location) = match find_note(store, &request.filename).await? {
        Some(found) => found,
        None => (store.layout().note_path(&request.filename), Location::Notes),
    };

    let (old_concepts, old_links) = {
        let _guard = store.locks().acquire(&path).await;
        let previous = read_text(&path).await?.map(|raw| parser::decode(&raw).meta);
        let now = Utc::now();

        let (old_concepts, old_links, mut meta) = match previous {
            Some(prev) => (
                prev.concepts.clone().unwrap_or_default(),
                prev.links.clone().unwrap_or_default(),
                prev,
            ),
            None => (Vec::new(), Vec::new(), RecordMeta::default()),
        };
        if request.title.is_some() {
            meta.title = request.title.clone();
        }
        meta.created = meta.created.or(Some(now));
        meta.modified = Some(now);
        meta.concepts = Some(dedup(&request.concepts));
        meta.links = Some(dedup(&request.links));
        meta.backlinks = Some(meta.backlinks.unwrap_or_default());

        write_atomic(&path, parser::encode(&request.content, &meta).as_bytes()).await?;
        (old_concepts, old_links)
    };
    debug!(note = %request.filename, location = %location, "note written");

    if location == Location::Notes {
        relations::update_note_concepts(store, &request.filename, &old_concepts, &request.concepts)
            .await?;
        relations::update_note_links(store, &request.filename, &old_links, &request.links).await?;
    }

    load_note(store, &request.filename).await
}

pub(crate) async fn load_note(store: &NoteStore, filename: &str) -> StoreResult<Note> {
    let (path, location) = require_note(store, filename).await?;
    note_from_file(&path, filename, location)
        .await?
        .ok_or_else(|| StoreError::NoteNotFound(filename.to_string()))
}

pub(crate) async fn delete_note(store: &NoteStore, filename: &str) -> StoreResult<()> {
    let note = load_note(store, filename).await?;
    if note.location == Location::Notes {
        relations::sever_note(store, &note).await?;
    }

    let (path, _) = require_note(store, filename).await?;
    let removed = {
        let _guard = store.locks().acquire(&path).await;
        remove_if_exists(&path).await?
    };
    if !removed {
        return Err(StoreError::NoteNotFound(filename.to_string()));
    }
    preferences::forget_note(store, filename).await?;
    info!(note = filename, "note deleted");
    Ok(())
}

pub(crate) async fn rename_note(
    store: &NoteStore,
    old_filename: &str,
    new_filename: &str,
) -> StoreResult<Note> {
    validate_note_filename(old_filename)?;
    validate_note_filename(new_filename)?;
    if old_filename == new_filename {
        return load_note(store, old_filename).await;
    }

    let note = load_note(store, old_filename).await?;
    let namespace = store.layout().namespace_dirs();
    if crate::naming::name_taken(&namespace, new_filename).await? {
        return Err(StoreError::FilenameConflict(new_filename.to_string()));
    }

    let (old_path, location) = require_note(store, old_filename).await?;
    let dir = old_path
        .parent()
        .map(PathBuf::from)
        .unwrap_or_else(|| store.layout().root().to_path_buf());
    let new_path = dir.join(new_filename);
    {
        let _guard = store.locks().acquire(&old_path).await;
        if tokio::fs::try_exists(&new_path).await? {
            return Err(StoreError::FilenameConflict(new_filename.to_string()));
        }
        tokio::fs::rename(&old_path, &new_path).await?;
    }

    if location == Location::Notes {
        relations::migrate_note_edges(store, &note, new_filename).await?;
    }
    let old_base = crate::naming::file_stem(old_filename);
    let new_base = crate::naming::file_stem(new_filename);
    media::move_sidecars(store, &dir, &dir, old_base, new_base).await?;
    preferences::rename_note(store, old_filename, new_filename).await?;

    info!(from = old_filename, to = new_filename, "note renamed");
    load_note(store, new_filename).await
}

pub(crate) async fn list_notes(store: &NoteStore) -> StoreResult<Vec<NoteSummary>> {
    let notes = notes_in(store, Location::Notes).await?;
    let mut summaries: Vec<NoteSummary> = notes.iter().map(summarize).collect();
    sort_recent_first(&mut summaries);
    Ok(summaries)
}

pub(crate) async fn search(store: &NoteStore, query: &str) -> StoreResult<Vec<NoteSummary>> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return Ok(Vec::new());
    }

    let mut results = Vec::new();
    for location in [Location::Notes, Location::Inbox] {
        for note in notes_in(store, location).await? {
            let title = match location {
                Location::Inbox => ideas::idea_title(store, &note),
                Location::Notes => note.display_title(),
            };
            let snippet = snippet(&note.content, &needle);
            let hit = snippet.is_some()
                || note.filename.to_lowercase().contains(&needle)
                || title.to_lowercase().contains(&needle);
            if hit {
                results.push(NoteSummary {
                    filename: note.filename.clone(),
                    title,
                    location,
                    modified: note.metadata.modified,
                    snippet: snippet.unwrap_or_default(),
                });
            }
        }
    }
    sort_recent_first(&mut results);
    debug!(query, hits = results.len(), "search finished");
    Ok(results)
}

/// First body line containing `needle` (already lowercased), shortened.
fn snippet(content: &str, needle: &str) -> Option<String> {
    let line = content
        .lines()
        .find(|line| line.to_lowercase().contains(needle))?
        .trim();
    if line.chars().count() <= SNIPPET_CHARS {
        return Some(line.to_string());
    }
    let mut short: String = line.chars().take(SNIPPET_CHARS).collect();
    short.push_str("...");
    Some(short)
}

pub(crate) async fn merge_notes(
    store: &NoteStore,
    filenames: &[String],
    title: &str,
) -> StoreResult<Note> {
    let title = title.trim();
    if title.is_empty() {
        return Err(StoreError::InvalidTitle("merged note needs a title".to_string()));
    }
    if filenames.is_empty() {
        return Err(StoreError::InvalidRequest(
            "nothing to merge: no source notes given".to_string(),
        ));
    }

    let filenames = dedup(filenames);
    let mut sources = Vec::with_capacity(filenames.len());
    for filename in &filenames {
        sources.push(load_note(store, filename).await?);
    }

    let mut sections = Vec::with_capacity(sources.len());
    let mut concepts = Vec::new();
    let mut links = Vec::new();
    for note in &sources {
        sections.push(format!("## {}\n\n{}", note.display_title(), note.content.trim_end()));
        concepts.extend(note.metadata.concepts.iter().cloned());
        links.extend(
            note.metadata
                .links
                .iter()
                .filter(|link| !filenames.iter().any(|f| relations::link_matches(link, f)))
                .cloned(),
        );
    }

    let namespace = store.layout().namespace_dirs();
    let filename = unique_filename(&namespace, &slugify_title(title), ".txt").await?;
    let concepts = dedup(&concepts);
    for concept in &concepts {
        concepts::ensure_concept(store, concept).await?;
    }

    let merged = save_note(
        store,
        SaveNoteRequest {
            filename: filename.clone(),
            content: format!("{}\n", sections.join("\n\n")),
            title: Some(title.to_string()),
            concepts,
            links: dedup(&links),
        },
    )
    .await?;

    for source in &filenames {
        delete_note(store, source).await?;
    }
    info!(note = %filename, sources = filenames.len(), "notes merged");
    Ok(merged)
}

pub(crate) async fn enrich_note(store: &NoteStore, filename: &str) -> StoreResult<Note> {
    let note = load_note(store, filename).await?;
    let refs = parser::detect_refs(&note.content);

    let mut concepts = note.metadata.concepts.clone();
    concepts.extend(refs.concepts);
    let mut links = note.metadata.links.clone();
    links.extend(refs.links.into_iter().filter(|link| !relations::link_matches(link, filename)));

    let concepts = dedup(&concepts);
    for concept in &concepts {
        concepts::ensure_concept(store, concept).await?;
    }
    let enriched = save_note(
        store,
        SaveNoteRequest {
            filename: filename.to_string(),
            content: note.content,
            title: note.metadata.title,
            concepts,
            links: dedup(&links),
        },
    )
    .await?;
    info!(note = filename, "note enriched from body references");
    Ok(enriched)
}

pub(crate) fn dedup(items: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(items.len());
    for item in items {
        if !out.contains(item) {
            out.push(item.clone());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snippet_picks_matching_line() {
        let body = "first line\nThe Quick fox\nlast";
        assert_eq!(snippet(body, "quick").as_deref(), Some("The Quick fox"));
        assert!(snippet(body, "absent").is_none());
    }

    #[test]
    fn long_snippets_are_shortened() {
        let body = format!("{} needle", "x".repeat(200));
        let short = snippet(&body, "x").unwrap();
        assert_eq!(short.chars().count(), SNIPPET_CHARS + 3);
        assert!(short.ends_with("..."));
    }

    #[test]
    fn dedup_keeps_first_seen_order() {
        let items = vec!["b".to_string(), "a".to_string(), "b".to_string()];
        assert_eq!(dedup(&items), vec!["b".to_string(), "a".to_string()]);
    }
}
