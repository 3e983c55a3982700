use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::errors::{StoreError, StoreResult};
use crate::models::{Location, MediaFile, MediaKind, mime_for_extension};
use crate::naming::{
    file_ext, file_stem, media_filename, next_media_filename, parse_media_filename,
    unique_filename, validate_media_filename,
};
use crate::storage::{is_note_file, list_files, remove_if_exists, size_and_mtime};

use super::{NoteStore, notes};

const FALLBACK_EXT: &str = "bin";

pub(crate) async fn save_media(
    store: &NoteStore,
    bytes: &[u8],
    original_name: &str,
    parent_note: Option<&str>,
) -> StoreResult<MediaFile> {
    let original = Path::new(original_name)
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| StoreError::InvalidFilename(original_name.to_string()))?;
    validate_media_filename(original)?;
    if is_note_file(original) {
        return Err(StoreError::InvalidFilename(original.to_string()));
    }

    let ext = match file_ext(original).trim_start_matches('.') {
        "" => FALLBACK_EXT.to_string(),
        ext => ext.to_ascii_lowercase(),
    };
    let kind = MediaKind::from_mime(mime_for_extension(&ext));

    let (dir, location) = match parent_note {
        Some(parent) => {
            let (path, location) = notes::require_note(store, parent).await?;
            (parent_dir(store, &path), location)
        }
        None => (store.layout().root().to_path_buf(), Location::Notes),
    };

    loop {
        let filename = match parent_note {
            Some(parent) => next_media_filename(&dir, file_stem(parent), kind, &ext).await?,
            None => unique_filename(&[dir.clone()], file_stem(original), &format!(".{ext}")).await?,
        };
        let path = dir.join(&filename);
        match create_new(&path, bytes).await {
            Ok(()) => {
                info!(media = %filename, size = bytes.len(), "media saved");
                return describe(&path, &filename, location).await;
            }
            // Lost a race for the name; pick the next one.
            Err(err) if err.kind() == ErrorKind::AlreadyExists => continue,
            Err(err) => return Err(err.into()),
        }
    }
}

async fn create_new(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = tokio::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await?;
    file.write_all(bytes).await?;
    file.flush().await
}

fn parent_dir(store: &NoteStore, path: &Path) -> PathBuf {
    path.parent()
        .map(PathBuf::from)
        .unwrap_or_else(|| store.layout().root().to_path_buf())
}

async fn describe(path: &Path, filename: &str, location: Location) -> StoreResult<MediaFile> {
    let (size, modified) = size_and_mtime(path)
        .await?
        .ok_or_else(|| StoreError::MediaNotFound(filename.to_string()))?;
    Ok(MediaFile {
        filename: filename.to_string(),
        mime_type: mime_for_extension(file_ext(filename)).to_string(),
        size,
        modified,
        owner: parse_media_filename(filename).map(|name| name.owner_base),
        location,
    })
}

async fn locate_media(store: &NoteStore, filename: &str) -> StoreResult<(PathBuf, Location)> {
    validate_media_filename(filename)?;
    if is_note_file(filename) {
        return Err(StoreError::InvalidFilename(filename.to_string()));
    }
    let layout = store.layout();
    for (path, location) in [
        (layout.note_path(filename), Location::Notes),
        (layout.inbox_path(filename), Location::Inbox),
    ] {
        if tokio::fs::try_exists(&path).await? {
            return Ok((path, location));
        }
    }
    Err(StoreError::MediaNotFound(filename.to_string()))
}

/// Media files of one directory.
async fn media_in(dir: &Path, location: Location) -> StoreResult<Vec<MediaFile>> {
    let mut files = Vec::new();
    for filename in list_files(dir).await? {
        if is_note_file(&filename) {
            continue;
        }
        match describe(&dir.join(&filename), &filename, location).await {
            Ok(file) => files.push(file),
            Err(err) if err.is_not_found() => {}
            Err(err) => return Err(err),
        }
    }
    Ok(files)
}

pub(crate) async fn list_media(store: &NoteStore) -> StoreResult<Vec<MediaFile>> {
    let mut files = media_in(store.layout().notes_dir(), Location::Notes).await?;
    files.extend(media_in(&store.layout().inbox_dir(), Location::Inbox).await?);
    Ok(files)
}

/// Sidecars named after the note, ordered by kind and index.
pub(crate) async fn list_media_for_note(
    store: &NoteStore,
    note_filename: &str,
) -> StoreResult<Vec<MediaFile>> {
    crate::naming::validate_note_filename(note_filename)?;
    let base = file_stem(note_filename);
    let mut owned: Vec<(MediaKind, u32, MediaFile)> = list_media(store)
        .await?
        .into_iter()
        .filter_map(|file| {
            let name = parse_media_filename(&file.filename)?;
            (name.owner_base == base).then_some((name.kind, name.index, file))
        })
        .collect();
    owned.sort_by(|a, b| {
        a.0.as_str()
            .cmp(b.0.as_str())
            .then(a.1.cmp(&b.1))
            .then_with(|| a.2.filename.cmp(&b.2.filename))
    });
    Ok(owned.into_iter().map(|(_, _, file)| file).collect())
}

pub(crate) async fn load_media(
    store: &NoteStore,
    filename: &str,
) -> StoreResult<(MediaFile, Vec<u8>)> {
    let (path, location) = locate_media(store, filename).await?;
    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            return Err(StoreError::MediaNotFound(filename.to_string()));
        }
        Err(err) => return Err(err.into()),
    };
    let file = describe(&path, filename, location).await?;
    Ok((file, bytes))
}

pub(crate) async fn delete_media(store: &NoteStore, filename: &str) -> StoreResult<()> {
    let (path, _) = locate_media(store, filename).await?;
    let removed = {
        let _guard = store.locks().acquire(&path).await;
        remove_if_exists(&path).await?
    };
    if !removed {
        return Err(StoreError::MediaNotFound(filename.to_string()));
    }
    info!(media = filename, "media deleted");
    Ok(())
}

/// Move every `{old_base}-{kind}-{n}.{ext}` sidecar in `from` to
/// `{new_base}-{kind}-{n}.{ext}` in `to`, taking the next free index when
/// the target name is occupied. Returns the new filenames.
pub(crate) async fn move_sidecars(
    store: &NoteStore,
    from: &Path,
    to: &Path,
    old_base: &str,
    new_base: &str,
) -> StoreResult<Vec<String>> {
    let mut moved = Vec::new();
    for filename in list_files(from).await? {
        let Some(name) = parse_media_filename(&filename) else {
            continue;
        };
        if name.owner_base != old_base {
            continue;
        }
        let source = from.join(&filename);
        let _guard = store.locks().acquire(&source).await;
        let mut target_name = media_filename(new_base, name.kind, name.index, &name.ext);
        if tokio::fs::try_exists(to.join(&target_name)).await? {
            target_name = next_media_filename(to, new_base, name.kind, &name.ext).await?;
        }
        tokio::fs::rename(&source, to.join(&target_name)).await?;
        debug!(from = %filename, to = %target_name, "media sidecar moved");
        moved.push(target_name);
    }
    Ok(moved)
}
