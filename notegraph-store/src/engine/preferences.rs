//! Pinned items and recent notes, stored in `.notes-metadata/preferences.json`.
//! Independent of the relation graph.

use tracing::debug;

use crate::errors::{StoreError, StoreResult};
use crate::models::{NoteSummary, PinKind, PinnedItems, Preferences};
use crate::storage::{read_text, write_atomic};

use super::{NoteStore, concepts, notes};

async fn read_preferences(store: &NoteStore) -> StoreResult<Preferences> {
    match read_text(&store.layout().preferences_path()).await? {
        Some(raw) if !raw.trim().is_empty() => Ok(serde_json::from_str(&raw)?),
        _ => Ok(Preferences::default()),
    }
}

/// Locked read-modify-write of the preferences file.
async fn modify_preferences<F>(store: &NoteStore, apply: F) -> StoreResult<Preferences>
where
    F: FnOnce(&mut Preferences) -> bool,
{
    let path = store.layout().preferences_path();
    let _guard = store.locks().acquire(&path).await;
    let mut prefs = read_preferences(store).await?;
    if apply(&mut prefs) {
        let json = serde_json::to_vec_pretty(&prefs)?;
        write_atomic(&path, &json).await?;
        debug!("preferences written");
    }
    Ok(prefs)
}

fn pinned_list(pinned: &mut PinnedItems, kind: PinKind) -> &mut Vec<String> {
    match kind {
        PinKind::Note => &mut pinned.notes,
        PinKind::Concept => &mut pinned.concepts,
    }
}

fn unpin(prefs: &mut Preferences, kind: PinKind, name: &str) -> bool {
    let list = pinned_list(&mut prefs.pinned, kind);
    let before = list.len();
    list.retain(|item| item != name);
    list.len() != before
}

pub(crate) async fn get_pinned_items(store: &NoteStore) -> StoreResult<PinnedItems> {
    Ok(read_preferences(store).await?.pinned)
}

pub(crate) async fn pin_item(
    store: &NoteStore,
    kind: PinKind,
    name: &str,
) -> StoreResult<PinnedItems> {
    match kind {
        PinKind::Note => {
            notes::require_note(store, name).await?;
        }
        PinKind::Concept => concepts::require_concept(store, name).await?,
    }
    let prefs = modify_preferences(store, |prefs| {
        let list = pinned_list(&mut prefs.pinned, kind);
        if list.iter().any(|item| item == name) {
            return false;
        }
        list.push(name.to_string());
        true
    })
    .await?;
    Ok(prefs.pinned)
}

pub(crate) async fn unpin_item(
    store: &NoteStore,
    kind: PinKind,
    name: &str,
) -> StoreResult<PinnedItems> {
    let prefs = modify_preferences(store, |prefs| unpin(prefs, kind, name)).await?;
    Ok(prefs.pinned)
}

pub(crate) async fn forget_note(store: &NoteStore, filename: &str) -> StoreResult<()> {
    modify_preferences(store, |prefs| unpin(prefs, PinKind::Note, filename)).await?;
    Ok(())
}

pub(crate) async fn forget_concept(store: &NoteStore, name: &str) -> StoreResult<()> {
    modify_preferences(store, |prefs| unpin(prefs, PinKind::Concept, name)).await?;
    Ok(())
}

/// Keep a pinned note pinned across a rename.
pub(crate) async fn rename_note(store: &NoteStore, old: &str, new: &str) -> StoreResult<()> {
    modify_preferences(store, |prefs| {
        let mut changed = false;
        for item in prefs.pinned.notes.iter_mut().filter(|item| item.as_str() == old) {
            *item = new.to_string();
            changed = true;
        }
        if changed {
            let mut seen = Vec::new();
            prefs.pinned.notes.retain(|item| {
                let fresh = !seen.contains(item);
                seen.push(item.clone());
                fresh
            });
        }
        changed
    })
    .await?;
    Ok(())
}

pub(crate) async fn get_recent_notes(
    store: &NoteStore,
    limit: Option<usize>,
) -> StoreResult<Vec<NoteSummary>> {
    let limit = limit.unwrap_or(store.settings().recent_limit);
    if limit == 0 {
        return Err(StoreError::InvalidRequest(
            "recent notes limit must be positive".to_string(),
        ));
    }
    let mut recent = notes::list_notes(store).await?;
    recent.truncate(limit);
    Ok(recent)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unpin_reports_changes() {
        let mut prefs = Preferences::default();
        prefs.pinned.concepts.push("rust".to_string());
        assert!(unpin(&mut prefs, PinKind::Concept, "rust"));
        assert!(!unpin(&mut prefs, PinKind::Concept, "rust"));
        assert!(!unpin(&mut prefs, PinKind::Note, "a.txt"));
    }
}
