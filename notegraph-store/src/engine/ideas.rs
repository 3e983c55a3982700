use chrono::Utc;
use tracing::{debug, info};

use crate::errors::{StoreError, StoreResult};
use crate::models::{
    Idea, IdeaInput, IdeaMetadata, IdeaUpdate, Location, Note, NoteSummary, SaveNoteRequest,
    generate_idea_id,
};
use crate::naming::{file_stem, slugify_title, unique_filename, validate_note_filename};
use crate::parser::{self, RecordMeta};
use crate::storage::{file_times, read_text, remove_if_exists, write_atomic};

use super::{NoteStore, concepts, media, notes};

const IDEA_BASE: &str = "idea";
const IDEA_EXT: &str = ".txt";
const ELLIPSIS: &str = "...";

/// Title for a draft: the first non-empty line when it is short and reads
/// like a heading, otherwise a truncated prefix of that line.
pub(crate) fn derive_title(content: &str, max_chars: usize) -> String {
    let Some(line) = content.lines().map(str::trim).find(|line| !line.is_empty()) else {
        return "Untitled idea".to_string();
    };
    let ends_sentence = line.ends_with(['.', '!', '?', ',', ';', ':']);
    if line.chars().count() <= max_chars && !ends_sentence {
        return line.to_string();
    }
    let keep = max_chars.saturating_sub(ELLIPSIS.len());
    let prefix: String = line.chars().take(keep).collect();
    let prefix = prefix.trim_end_matches(|c: char| c.is_whitespace() || c.is_ascii_punctuation());
    format!("{prefix}{ELLIPSIS}")
}

/// Title shown for an inbox file.
pub(crate) fn idea_title(store: &NoteStore, note: &Note) -> String {
    note.metadata
        .title
        .clone()
        .filter(|title| !title.trim().is_empty())
        .unwrap_or_else(|| derive_title(&note.content, store.settings().idea_title_max))
}

pub(crate) async fn create_idea(
    store: &NoteStore,
    content: &str,
    input: IdeaInput,
) -> StoreResult<Idea> {
    let title = input
        .title
        .filter(|title| !title.trim().is_empty())
        .unwrap_or_else(|| derive_title(content, store.settings().idea_title_max));
    let now = Utc::now();
    let meta = RecordMeta {
        title: Some(title),
        id: Some(generate_idea_id()),
        source: input.source,
        created: Some(now),
        modified: Some(now),
        // Absent keys let the body's #tags and @mentions show through.
        concepts: (!input.concepts.is_empty()).then(|| notes::dedup(&input.concepts)),
        links: (!input.links.is_empty()).then(|| notes::dedup(&input.links)),
        ..Default::default()
    };

    // Name selection and the write share one inbox-wide guard.
    let inbox = store.layout().inbox_dir();
    let filename = {
        let _guard = store.locks().acquire(&inbox).await;
        let namespace = store.layout().namespace_dirs();
        let filename = unique_filename(&namespace, IDEA_BASE, IDEA_EXT).await?;
        let path = store.layout().inbox_path(&filename);
        write_atomic(&path, parser::encode(content, &meta).as_bytes()).await?;
        filename
    };
    info!(idea = %filename, "idea captured");
    load_idea(store, &filename).await
}

pub(crate) async fn load_idea(store: &NoteStore, filename: &str) -> StoreResult<Idea> {
    validate_note_filename(filename)?;
    let path = store.layout().inbox_path(filename);
    let raw = read_text(&path)
        .await?
        .ok_or_else(|| StoreError::IdeaNotFound(filename.to_string()))?;
    let (fs_created, fs_modified) = file_times(&path).await;
    let record = parser::decode(&raw);
    let meta = record.meta;
    let title = meta
        .title
        .filter(|title| !title.trim().is_empty())
        .unwrap_or_else(|| derive_title(&record.content, store.settings().idea_title_max));
    let created = meta.created.or(fs_created).unwrap_or_else(Utc::now);

    Ok(Idea {
        id: meta.id.unwrap_or_else(|| file_stem(filename).to_string()),
        filename: filename.to_string(),
        metadata: IdeaMetadata {
            title,
            concepts: meta.concepts.unwrap_or_default(),
            links: meta.links.unwrap_or_default(),
            source: meta.source,
        },
        content: record.content,
        created,
        modified: meta.modified.or(fs_modified).unwrap_or(created),
        location: Location::Inbox,
    })
}

pub(crate) async fn update_idea(
    store: &NoteStore,
    filename: &str,
    update: IdeaUpdate,
) -> StoreResult<Idea> {
    validate_note_filename(filename)?;
    let path = store.layout().inbox_path(filename);
    {
        let _guard = store.locks().acquire(&path).await;
        let raw = read_text(&path)
            .await?
            .ok_or_else(|| StoreError::IdeaNotFound(filename.to_string()))?;
        let record = parser::decode(&raw);
        let mut meta = record.meta;
        let content = update.content.unwrap_or(record.content);
        if let Some(title) = update.title.filter(|title| !title.trim().is_empty()) {
            meta.title = Some(title);
        }
        if let Some(concepts) = update.concepts {
            meta.concepts = Some(notes::dedup(&concepts));
        }
        if let Some(links) = update.links {
            meta.links = Some(notes::dedup(&links));
        }
        meta.modified = Some(Utc::now());
        write_atomic(&path, parser::encode(&content, &meta).as_bytes()).await?;
    }
    debug!(idea = filename, "idea updated");
    load_idea(store, filename).await
}

pub(crate) async fn delete_idea(store: &NoteStore, filename: &str) -> StoreResult<()> {
    validate_note_filename(filename)?;
    let path = store.layout().inbox_path(filename);
    let removed = {
        let _guard = store.locks().acquire(&path).await;
        remove_if_exists(&path).await?
    };
    if !removed {
        return Err(StoreError::IdeaNotFound(filename.to_string()));
    }
    info!(idea = filename, "idea deleted");
    Ok(())
}

pub(crate) async fn list_ideas(store: &NoteStore) -> StoreResult<Vec<NoteSummary>> {
    let mut summaries: Vec<NoteSummary> = notes::notes_in(store, Location::Inbox)
        .await?
        .iter()
        .map(|note| NoteSummary {
            title: idea_title(store, note),
            ..notes::summarize(note)
        })
        .collect();
    notes::sort_recent_first(&mut summaries);
    Ok(summaries)
}

/// Promote an inbox idea into the notes root. Concepts are the explicit
/// ones, then body-detected, then the idea's own; every one is ensured and
/// linked both ways. Media sidecars follow the new note.
pub(crate) async fn promote_idea_to_note(
    store: &NoteStore,
    idea_filename: &str,
    title: &str,
    concepts: &[String],
) -> StoreResult<Note> {
    let idea = load_idea(store, idea_filename).await?;
    let title = match title.trim() {
        "" => idea.metadata.title.clone(),
        given => given.to_string(),
    };

    let refs = parser::detect_refs(&idea.content);
    let mut all_concepts: Vec<String> = concepts.to_vec();
    all_concepts.extend(refs.concepts);
    all_concepts.extend(idea.metadata.concepts.iter().cloned());
    let all_concepts = notes::dedup(&all_concepts);

    let mut links = idea.metadata.links.clone();
    links.extend(refs.links);
    let links = notes::dedup(&links);

    let namespace = store.layout().namespace_dirs();
    let filename = unique_filename(&namespace, &slugify_title(&title), IDEA_EXT).await?;

    for concept in &all_concepts {
        concepts::ensure_concept(store, concept).await?;
    }
    notes::save_note(
        store,
        SaveNoteRequest {
            filename: filename.clone(),
            content: idea.content.clone(),
            title: Some(title),
            concepts: all_concepts,
            links,
        },
    )
    .await?;

    media::move_sidecars(
        store,
        &store.layout().inbox_dir(),
        store.layout().notes_dir(),
        file_stem(idea_filename),
        file_stem(&filename),
    )
    .await?;
    delete_idea(store, idea_filename).await?;

    info!(idea = idea_filename, note = %filename, "idea promoted");
    notes::load_note(store, &filename).await
}
