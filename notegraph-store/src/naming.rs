//! Filename rules: validation, conflict resolution, title slugs and the
//! media attachment naming convention `{base}-{kind}-{index}.{ext}`.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::errors::{StoreError, StoreResult};
use crate::models::MediaKind;

pub const MAX_FILENAME_LEN: usize = 255;
pub const MAX_CONCEPT_NAME_LEN: usize = 200;
/// Leaves room for a `-N` conflict suffix and the extension.
pub const MAX_SLUG_LEN: usize = 200;

static NOTE_FILENAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9_\-\s.]+\.(txt|md)$").expect("note filename regex")
});
static MEDIA_FILENAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.+)-(image|audio|video|file)-(\d+)\.([A-Za-z0-9]+)$")
        .expect("media filename regex")
});

/// Parsed form of a media sidecar filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaName {
    pub owner_base: String,
    pub kind: MediaKind,
    pub index: u32,
    pub ext: String,
}

pub fn validate_note_filename(filename: &str) -> StoreResult<()> {
    if filename.len() > MAX_FILENAME_LEN || !NOTE_FILENAME_RE.is_match(filename) {
        return Err(StoreError::InvalidFilename(filename.to_string()));
    }
    Ok(())
}

pub fn validate_concept_name(name: &str) -> StoreResult<()> {
    let invalid = name.trim().is_empty()
        || name.len() > MAX_CONCEPT_NAME_LEN
        || name.starts_with('.')
        || name.chars().any(|c| c == '/' || c == '\\' || c.is_control());
    if invalid {
        return Err(StoreError::InvalidConceptName(name.to_string()));
    }
    Ok(())
}

/// Media names share the note namespace rules minus the extension whitelist.
pub fn validate_media_filename(filename: &str) -> StoreResult<()> {
    let invalid = filename.is_empty()
        || filename.len() > MAX_FILENAME_LEN
        || filename.starts_with('.')
        || filename.chars().any(|c| c == '/' || c == '\\' || c.is_control());
    if invalid {
        return Err(StoreError::InvalidFilename(filename.to_string()));
    }
    Ok(())
}

/// Base name of a file (everything before the last `.`).
pub fn file_stem(filename: &str) -> &str {
    filename.rsplit_once('.').map(|(stem, _)| stem).unwrap_or(filename)
}

/// Extension including the leading dot, or an empty string.
pub fn file_ext(filename: &str) -> &str {
    filename.rfind('.').map(|idx| &filename[idx..]).unwrap_or("")
}

/// Lowercase, non-alphanumerics to `-`, runs collapsed, ends trimmed,
/// capped at [`MAX_SLUG_LEN`] bytes.
pub fn slugify_title(title: &str) -> String {
    let mut slug = title
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<&str>>()
        .join("-");
    if slug.len() > MAX_SLUG_LEN {
        slug.truncate(MAX_SLUG_LEN);
        let kept = slug.trim_end_matches('-').len();
        slug.truncate(kept);
    }
    if slug.is_empty() {
        "untitled".to_string()
    } else {
        slug
    }
}

/// First free `base{ext}`, `base-1{ext}`, `base-2{ext}`, … across every
/// directory of the namespace. Always restarts from 1.
pub async fn unique_filename(dirs: &[PathBuf], base: &str, ext: &str) -> StoreResult<String> {
    let mut candidate = format!("{base}{ext}");
    let mut counter = 1u32;
    while name_taken(dirs, &candidate).await? {
        candidate = format!("{base}-{counter}{ext}");
        counter += 1;
    }
    Ok(candidate)
}

/// Whether `filename` exists in any of `dirs`.
pub async fn name_taken(dirs: &[PathBuf], filename: &str) -> StoreResult<bool> {
    for dir in dirs {
        if tokio::fs::try_exists(dir.join(filename)).await? {
            return Ok(true);
        }
    }
    Ok(false)
}

pub fn media_filename(note_base: &str, kind: MediaKind, index: u32, ext: &str) -> String {
    let ext = ext.trim_start_matches('.');
    format!("{note_base}-{}-{index}.{ext}", kind.as_str())
}

/// Inverse of [`media_filename`]; names outside the pattern have no owner.
pub fn parse_media_filename(filename: &str) -> Option<MediaName> {
    let caps = MEDIA_FILENAME_RE.captures(filename)?;
    Some(MediaName {
        owner_base: caps.get(1)?.as_str().to_string(),
        kind: caps.get(2)?.as_str().parse().ok()?,
        index: caps.get(3)?.as_str().parse().ok()?,
        ext: caps.get(4)?.as_str().to_string(),
    })
}

/// Next free media index for `note_base` in `dir`.
pub async fn next_media_filename(
    dir: &Path,
    note_base: &str,
    kind: MediaKind,
    ext: &str,
) -> StoreResult<String> {
    let mut index = 1u32;
    loop {
        let candidate = media_filename(note_base, kind, index, ext);
        if !tokio::fs::try_exists(dir.join(&candidate)).await? {
            return Ok(candidate);
        }
        index += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validates_note_filenames() {
        assert!(validate_note_filename("meeting notes.txt").is_ok());
        assert!(validate_note_filename("a_b-c.v2.md").is_ok());
        assert!(validate_note_filename("../escape.txt").is_err());
        assert!(validate_note_filename("note.pdf").is_err());
        assert!(validate_note_filename("").is_err());
        let long = format!("{}.txt", "a".repeat(252));
        assert!(validate_note_filename(&long).is_err());
    }

    #[test]
    fn validates_concept_names() {
        assert!(validate_concept_name("project").is_ok());
        assert!(validate_concept_name("Рust-lang").is_ok());
        assert!(validate_concept_name("").is_err());
        assert!(validate_concept_name("a/b").is_err());
        assert!(validate_concept_name(".hidden").is_err());
    }

    #[test]
    fn slugifies_titles() {
        assert_eq!(slugify_title("Meeting Notes"), "meeting-notes");
        assert_eq!(slugify_title("  Hello,   World!! "), "hello-world");
        assert_eq!(slugify_title("???"), "untitled");
    }

    #[test]
    fn long_titles_are_capped_without_trailing_hyphen() {
        let slug = slugify_title(&"word ".repeat(80));
        assert!(slug.len() <= MAX_SLUG_LEN);
        assert!(!slug.ends_with('-'));
        assert!(slug.starts_with("word-word"));
        assert!(validate_note_filename(&format!("{slug}-12.txt")).is_ok());
    }

    #[test]
    fn media_names_round_trip() {
        let name = media_filename("old-note", MediaKind::Image, 3, ".jpg");
        assert_eq!(name, "old-note-image-3.jpg");
        let parsed = parse_media_filename(&name).unwrap();
        assert_eq!(parsed.owner_base, "old-note");
        assert_eq!(parsed.kind, MediaKind::Image);
        assert_eq!(parsed.index, 3);
        assert_eq!(parsed.ext, "jpg");
        assert!(parse_media_filename("holiday.jpg").is_none());
    }

    #[test]
    fn stems_and_extensions() {
        assert_eq!(file_stem("a.b.txt"), "a.b");
        assert_eq!(file_ext("a.b.txt"), ".txt");
        assert_eq!(file_stem("plain"), "plain");
        assert_eq!(file_ext("plain"), "");
    }

    #[tokio::test]
    async fn unique_filename_skips_taken_names_across_dirs() {
        let temp = tempfile::TempDir::new().unwrap();
        let root = temp.path().to_path_buf();
        let inbox = root.join("inbox");
        tokio::fs::create_dir_all(&inbox).await.unwrap();
        tokio::fs::write(root.join("idea.txt"), "x").await.unwrap();
        tokio::fs::write(inbox.join("idea-1.txt"), "x").await.unwrap();

        let dirs = vec![root.clone(), inbox.clone()];
        for _ in 0..3 {
            assert_eq!(
                unique_filename(&dirs, "idea", ".txt").await.unwrap(),
                "idea-2.txt"
            );
        }
    }

    #[tokio::test]
    async fn next_media_filename_finds_free_index() {
        let temp = tempfile::TempDir::new().unwrap();
        tokio::fs::write(temp.path().join("n-image-1.png"), "x").await.unwrap();
        let name = next_media_filename(temp.path(), "n", MediaKind::Image, "png")
            .await
            .unwrap();
        assert_eq!(name, "n-image-2.png");
    }
}
