//! Bidirectional edge transitions between notes and concepts.
//!
//! Every edge touches two files. The far side (concept or link target) is
//! written first, then the source, each in its own locked read-modify-write;
//! a lock is never held while awaiting another.

use tracing::{debug, warn};

use crate::errors::{StoreError, StoreResult};
use crate::models::{Location, Note};
use crate::naming::{slugify_title, validate_concept_name, validate_note_filename};

use super::{NoteStore, concepts, notes};

/// Filenames a link entry may refer to, in resolution order.
pub(crate) fn link_candidates(target: &str) -> Vec<String> {
    let mut candidates = vec![
        target.to_string(),
        format!("{target}.txt"),
        format!("{target}.md"),
        format!("{}.txt", slugify_title(target)),
    ];
    candidates.retain(|name| validate_note_filename(name).is_ok());
    candidates.dedup();
    candidates
}

/// Whether link entry `entry` can refer to the note `filename`.
pub(crate) fn link_matches(entry: &str, filename: &str) -> bool {
    link_candidates(entry).iter().any(|c| c == filename)
}

/// Resolve a link entry to an existing note in the notes root.
pub(crate) async fn resolve_link(store: &NoteStore, target: &str) -> StoreResult<Option<String>> {
    for candidate in link_candidates(target) {
        if tokio::fs::try_exists(store.layout().note_path(&candidate)).await? {
            return Ok(Some(candidate));
        }
    }
    Ok(None)
}

pub(crate) fn insert_item(list: &mut Option<Vec<String>>, item: &str) -> bool {
    let list = list.get_or_insert_with(Vec::new);
    if list.iter().any(|existing| existing == item) {
        return false;
    }
    list.push(item.to_string());
    true
}

pub(crate) fn remove_item(list: &mut Option<Vec<String>>, item: &str) -> bool {
    remove_where(list, |existing| existing == item)
}

fn remove_where(list: &mut Option<Vec<String>>, pred: impl Fn(&str) -> bool) -> bool {
    let Some(list) = list.as_mut() else {
        return false;
    };
    let before = list.len();
    list.retain(|existing| !pred(existing.as_str()));
    list.len() != before
}

/// Replace every entry matching `pred` with `replacement`, keeping set
/// semantics.
fn replace_where(
    list: &mut Option<Vec<String>>,
    pred: impl Fn(&str) -> bool,
    replacement: &str,
) -> bool {
    if !remove_where(list, pred) {
        return false;
    }
    insert_item(list, replacement);
    true
}

/// Far-side update that tolerates a missing or unaddressable entity.
fn skip_missing(result: StoreResult<bool>, side: &str, name: &str) -> StoreResult<bool> {
    match result {
        Err(err) if err.is_not_found() => {
            warn!(side, name, "edge partner missing; skipped");
            Ok(false)
        }
        Err(StoreError::InvalidConceptName(_) | StoreError::InvalidFilename(_)) => {
            warn!(side, name, "edge partner name is invalid; skipped");
            Ok(false)
        }
        other => other,
    }
}

/// Edges only exist between root notes; inbox ideas keep their lists as
/// plain metadata until promotion.
async fn require_root_note(store: &NoteStore, filename: &str) -> StoreResult<()> {
    let (_, location) = notes::require_note(store, filename).await?;
    if location == Location::Inbox {
        return Err(StoreError::InvalidRequest(format!(
            "'{filename}' is an inbox idea; promote it before adding relations"
        )));
    }
    Ok(())
}

fn diff<'a>(from: &'a [String], without: &'a [String]) -> impl Iterator<Item = &'a String> {
    from.iter().filter(move |item| !without.contains(item))
}

pub(crate) async fn add_note_concept(
    store: &NoteStore,
    note: &str,
    concept: &str,
) -> StoreResult<()> {
    validate_concept_name(concept)?;
    require_root_note(store, note).await?;
    concepts::ensure_concept(store, concept).await?;

    concepts::modify_concept(store, concept, |meta| {
        insert_item(&mut meta.linked_notes, note)
    })
    .await?;
    notes::modify_note(store, note, |meta| insert_item(&mut meta.concepts, concept)).await?;
    debug!(note, concept, "note-concept edge added");
    Ok(())
}

pub(crate) async fn remove_note_concept(
    store: &NoteStore,
    note: &str,
    concept: &str,
) -> StoreResult<()> {
    require_root_note(store, note).await?;
    skip_missing(
        concepts::modify_concept(store, concept, |meta| {
            remove_item(&mut meta.linked_notes, note)
        })
        .await,
        "concept",
        concept,
    )?;
    notes::modify_note(store, note, |meta| remove_item(&mut meta.concepts, concept)).await?;
    debug!(note, concept, "note-concept edge removed");
    Ok(())
}

pub(crate) async fn update_note_concepts(
    store: &NoteStore,
    note: &str,
    old: &[String],
    new: &[String],
) -> StoreResult<()> {
    for concept in diff(old, new) {
        remove_note_concept(store, note, concept).await?;
    }
    for concept in diff(new, old) {
        add_note_concept(store, note, concept).await?;
    }
    Ok(())
}

pub(crate) async fn add_note_link(store: &NoteStore, source: &str, target: &str) -> StoreResult<()> {
    require_root_note(store, source).await?;
    match resolve_link(store, target).await? {
        Some(resolved) => {
            notes::modify_note(store, &resolved, |meta| {
                insert_item(&mut meta.backlinks, source)
            })
            .await?;
        }
        None => warn!(source, target, "link target does not resolve; backlink skipped"),
    }
    notes::modify_note(store, source, |meta| insert_item(&mut meta.links, target)).await?;
    debug!(source, target, "note link added");
    Ok(())
}

pub(crate) async fn remove_note_link(
    store: &NoteStore,
    source: &str,
    target: &str,
) -> StoreResult<()> {
    require_root_note(store, source).await?;
    let current = notes::load_note(store, source).await?;
    match resolve_link(store, target).await? {
        Some(resolved) => {
            let mut still_linked = false;
            for entry in current.metadata.links.iter().filter(|entry| *entry != target) {
                if resolve_link(store, entry).await?.as_deref() == Some(resolved.as_str()) {
                    still_linked = true;
                    break;
                }
            }
            if still_linked {
                debug!(source, target, %resolved, "target still linked; backlink kept");
            } else {
                skip_missing(
                    notes::modify_note(store, &resolved, |meta| {
                        remove_item(&mut meta.backlinks, source)
                    })
                    .await,
                    "note",
                    &resolved,
                )?;
            }
        }
        None => warn!(source, target, "link target does not resolve; nothing to unlink"),
    }
    notes::modify_note(store, source, |meta| remove_item(&mut meta.links, target)).await?;
    debug!(source, target, "note link removed");
    Ok(())
}

pub(crate) async fn update_note_links(
    store: &NoteStore,
    note: &str,
    old: &[String],
    new: &[String],
) -> StoreResult<()> {
    for target in diff(old, new) {
        remove_note_link(store, note, target).await?;
    }
    for target in diff(new, old) {
        add_note_link(store, note, target).await?;
    }
    Ok(())
}

pub(crate) async fn add_concept_relation(store: &NoteStore, a: &str, b: &str) -> StoreResult<()> {
    validate_concept_name(a)?;
    validate_concept_name(b)?;
    if a == b {
        return Err(StoreError::InvalidRequest(format!(
            "concept '{a}' cannot relate to itself"
        )));
    }
    concepts::ensure_concept(store, a).await?;
    concepts::ensure_concept(store, b).await?;

    concepts::modify_concept(store, b, |meta| insert_item(&mut meta.related_concepts, a)).await?;
    concepts::modify_concept(store, a, |meta| insert_item(&mut meta.related_concepts, b)).await?;
    debug!(a, b, "concept relation added");
    Ok(())
}

pub(crate) async fn remove_concept_relation(
    store: &NoteStore,
    a: &str,
    b: &str,
) -> StoreResult<()> {
    concepts::require_concept(store, a).await?;
    skip_missing(
        concepts::modify_concept(store, b, |meta| remove_item(&mut meta.related_concepts, a))
            .await,
        "concept",
        b,
    )?;
    concepts::modify_concept(store, a, |meta| remove_item(&mut meta.related_concepts, b)).await?;
    debug!(a, b, "concept relation removed");
    Ok(())
}

pub(crate) async fn update_concept_relations(
    store: &NoteStore,
    concept: &str,
    old: &[String],
    new: &[String],
) -> StoreResult<()> {
    for related in diff(old, new) {
        remove_concept_relation(store, concept, related).await?;
    }
    for related in diff(new, old) {
        add_concept_relation(store, concept, related).await?;
    }
    Ok(())
}

/// Remove `note` from the far side of every edge it participates in.
pub(crate) async fn sever_note(store: &NoteStore, note: &Note) -> StoreResult<()> {
    let name = note.filename.as_str();
    for concept in &note.metadata.concepts {
        skip_missing(
            concepts::modify_concept(store, concept, |meta| {
                remove_item(&mut meta.linked_notes, name)
            })
            .await,
            "concept",
            concept,
        )?;
    }
    for target in &note.metadata.links {
        let Some(resolved) = resolve_link(store, target).await? else {
            continue;
        };
        if resolved == name {
            continue;
        }
        skip_missing(
            notes::modify_note(store, &resolved, |meta| remove_item(&mut meta.backlinks, name))
                .await,
            "note",
            &resolved,
        )?;
    }
    for source in &note.metadata.backlinks {
        let Some(resolved) = resolve_link(store, source).await? else {
            warn!(note = name, source, "backlink source missing; skipped");
            continue;
        };
        if resolved == name {
            continue;
        }
        skip_missing(
            notes::modify_note(store, &resolved, |meta| {
                remove_where(&mut meta.links, |entry| link_matches(entry, name))
            })
            .await,
            "note",
            &resolved,
        )?;
    }
    debug!(note = name, "note edges severed");
    Ok(())
}

/// Point every edge partner of `note` at `new_filename` after a rename.
pub(crate) async fn migrate_note_edges(
    store: &NoteStore,
    note: &Note,
    new_filename: &str,
) -> StoreResult<()> {
    let old = note.filename.as_str();
    let self_linked = note.metadata.backlinks.iter().any(|entry| entry == old)
        || note.metadata.links.iter().any(|entry| link_matches(entry, old));
    if self_linked {
        // Self-references live in the renamed file and no longer resolve.
        notes::modify_note(store, new_filename, |meta| {
            let backlinks =
                replace_where(&mut meta.backlinks, |entry| entry == old, new_filename);
            let links =
                replace_where(&mut meta.links, |entry| link_matches(entry, old), new_filename);
            backlinks || links
        })
        .await?;
    }

    for concept in &note.metadata.concepts {
        skip_missing(
            concepts::modify_concept(store, concept, |meta| {
                replace_where(&mut meta.linked_notes, |entry| entry == old, new_filename)
            })
            .await,
            "concept",
            concept,
        )?;
    }
    for target in note.metadata.links.iter().filter(|t| !link_matches(t, old)) {
        let Some(resolved) = resolve_link(store, target).await? else {
            continue;
        };
        skip_missing(
            notes::modify_note(store, &resolved, |meta| {
                replace_where(&mut meta.backlinks, |entry| entry == old, new_filename)
            })
            .await,
            "note",
            &resolved,
        )?;
    }
    for source in note.metadata.backlinks.iter().filter(|s| *s != old) {
        let Some(resolved) = resolve_link(store, source).await? else {
            warn!(note = old, source, "backlink source missing; skipped");
            continue;
        };
        skip_missing(
            notes::modify_note(store, &resolved, |meta| {
                replace_where(&mut meta.links, |entry| link_matches(entry, old), new_filename)
            })
            .await,
            "note",
            &resolved,
        )?;
    }
    debug!(from = old, to = new_filename, "note edges migrated");
    Ok(())
}
