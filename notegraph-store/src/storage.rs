//! Low-level file helpers shared by the engine modules.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Utc};

use crate::errors::StoreResult;

/// Read a UTF-8 file, `None` when it does not exist.
pub async fn read_text(path: &Path) -> StoreResult<Option<String>> {
    match tokio::fs::read_to_string(path).await {
        Ok(raw) => Ok(Some(raw)),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err.into()),
    }
}

/// Atomic write: write a hidden sibling tmp file, then rename over `path`.
pub async fn write_atomic(path: &Path, contents: &[u8]) -> StoreResult<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let tmp_path = tmp_path_for(path);
    tokio::fs::write(&tmp_path, contents).await?;
    if let Err(err) = tokio::fs::rename(&tmp_path, path).await {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(err.into());
    }
    Ok(())
}

/// Remove a file; `false` when it was already gone.
pub async fn remove_if_exists(path: &Path) -> StoreResult<bool> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(true),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
        Err(err) => Err(err.into()),
    }
}

/// Creation and modification times from the file system.
pub async fn file_times(path: &Path) -> (Option<DateTime<Utc>>, Option<DateTime<Utc>>) {
    match tokio::fs::metadata(path).await {
        Ok(meta) => (
            meta.created().ok().map(to_utc),
            meta.modified().ok().map(to_utc),
        ),
        Err(_) => (None, None),
    }
}

/// Size and modification time, `None` when the file is missing.
pub async fn size_and_mtime(path: &Path) -> StoreResult<Option<(u64, Option<DateTime<Utc>>)>> {
    match tokio::fs::metadata(path).await {
        Ok(meta) => Ok(Some((meta.len(), meta.modified().ok().map(to_utc)))),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err.into()),
    }
}

/// Names of the regular, non-hidden files directly inside `dir`, sorted.
/// A missing directory yields an empty list.
pub async fn list_files(dir: &Path) -> StoreResult<Vec<String>> {
    let mut names = Vec::new();
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(names),
        Err(err) => return Err(err.into()),
    };
    while let Some(entry) = entries.next_entry().await? {
        if !entry.file_type().await?.is_file() {
            continue;
        }
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            continue;
        };
        if name.starts_with('.') {
            continue;
        }
        names.push(name);
    }
    names.sort();
    Ok(names)
}

/// Whether a filename has a note extension.
pub fn is_note_file(name: &str) -> bool {
    name.ends_with(".txt") || name.ends_with(".md")
}

fn tmp_path_for(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    path.with_file_name(format!(".{name}.tmp"))
}

fn to_utc(time: SystemTime) -> DateTime<Utc> {
    DateTime::<Utc>::from(time)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn atomic_write_leaves_no_tmp_file() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("sub").join("note.txt");
        write_atomic(&path, b"hello").await.unwrap();

        assert_eq!(read_text(&path).await.unwrap().as_deref(), Some("hello"));
        assert!(!temp.path().join("sub").join(".note.txt.tmp").exists());
        assert_eq!(list_files(&temp.path().join("sub")).await.unwrap(), vec!["note.txt"]);
    }

    #[tokio::test]
    async fn missing_files_are_not_errors() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("missing.txt");
        assert!(read_text(&path).await.unwrap().is_none());
        assert!(!remove_if_exists(&path).await.unwrap());
        assert!(list_files(&temp.path().join("nope")).await.unwrap().is_empty());
    }
}
