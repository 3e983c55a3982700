//! Record codec for entity files.
//!
//! A record is an optional `---`-delimited header of `key: value` lines,
//! one blank separator line, then the free-text body. Array values use
//! `[a, b]`; items are double-quoted when they would otherwise not survive
//! the list syntax.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;

pub const DELIMITER: &str = "---";

static CONCEPT_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|[\s(\[,;])#(\w[\w-]*)").expect("concept tag regex"));
static NOTE_MENTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|[\s(\[,;])@(\w[\w-]*)").expect("note mention regex"));
static WIKI_LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[\[([^\[\]|]+)(?:\|[^\[\]]*)?\]\]").expect("wiki link regex")
});
static URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"https?://[^\s<>()\[\]"']+"#).expect("url regex"));

/// Header fields of a record. `None` array fields mean the key was absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordMeta {
    pub title: Option<String>,
    pub id: Option<String>,
    pub source: Option<String>,
    pub created: Option<DateTime<Utc>>,
    pub modified: Option<DateTime<Utc>>,
    pub concepts: Option<Vec<String>>,
    pub links: Option<Vec<String>>,
    pub backlinks: Option<Vec<String>>,
    pub linked_notes: Option<Vec<String>>,
    pub related_concepts: Option<Vec<String>>,
}

/// References found in a body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BodyRefs {
    pub concepts: Vec<String>,
    pub links: Vec<String>,
    pub urls: Vec<String>,
}

/// A decoded record.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub content: String,
    pub meta: RecordMeta,
    /// URLs found in the body; never persisted.
    pub urls: Vec<String>,
}

/// Decode a raw file. When the header carries no `concepts`/`tags` (resp.
/// `links`) key, the set is derived from the body.
pub fn decode(raw: &str) -> Record {
    let (meta, content) = match split_header(raw) {
        Some((header, body)) => (parse_header(header), body.to_string()),
        None => (RecordMeta::default(), raw.to_string()),
    };

    let refs = detect_refs(&content);
    let mut meta = meta;
    if meta.concepts.is_none() {
        meta.concepts = Some(refs.concepts);
    }
    if meta.links.is_none() {
        meta.links = Some(refs.links);
    }

    Record {
        content,
        meta,
        urls: refs.urls,
    }
}

/// Encode a record. A header is always written so the body is never
/// mistaken for one.
pub fn encode(content: &str, meta: &RecordMeta) -> String {
    let mut lines = vec![DELIMITER.to_string()];
    if let Some(title) = &meta.title {
        lines.push(format!("title: {}", format_scalar(title)));
    }
    if let Some(id) = &meta.id {
        lines.push(format!("id: {}", format_scalar(id)));
    }
    if let Some(source) = &meta.source {
        lines.push(format!("source: {}", format_scalar(source)));
    }
    if let Some(created) = &meta.created {
        lines.push(format!("created: {}", created.to_rfc3339()));
    }
    if let Some(modified) = &meta.modified {
        lines.push(format!("modified: {}", modified.to_rfc3339()));
    }
    push_array(&mut lines, "concepts", meta.concepts.as_deref());
    push_array(&mut lines, "links", meta.links.as_deref());
    push_array(&mut lines, "backlinks", meta.backlinks.as_deref());
    push_array(&mut lines, "linkedNotes", meta.linked_notes.as_deref());
    push_array(&mut lines, "relatedConcepts", meta.related_concepts.as_deref());
    lines.push(DELIMITER.to_string());

    format!("{}\n\n{}", lines.join("\n"), content)
}

/// Scan a body for `#concept`, `@note`, `[[Title]]` and URLs, keeping
/// first-seen order and dropping exact duplicates.
pub fn detect_refs(body: &str) -> BodyRefs {
    let concepts = dedup(
        CONCEPT_TAG_RE
            .captures_iter(body)
            .filter_map(|cap| cap.get(1).map(|m| m.as_str().to_string())),
    );

    let mut positioned: Vec<(usize, String)> = NOTE_MENTION_RE
        .captures_iter(body)
        .filter_map(|cap| cap.get(1).map(|m| (m.start(), m.as_str().to_string())))
        .collect();
    positioned.extend(WIKI_LINK_RE.captures_iter(body).filter_map(|cap| {
        cap.get(1).and_then(|m| {
            let target = m.as_str().trim();
            (!target.is_empty()).then(|| (m.start(), target.to_string()))
        })
    }));
    positioned.sort_by_key(|(start, _)| *start);
    let links = dedup(positioned.into_iter().map(|(_, link)| link));

    let urls = dedup(URL_RE.find_iter(body).map(|m| {
        m.as_str()
            .trim_end_matches(['.', ',', ';', ':', '!', '?'])
            .to_string()
    }));

    BodyRefs {
        concepts,
        links,
        urls,
    }
}

fn dedup(items: impl Iterator<Item = String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for item in items {
        if !out.contains(&item) {
            out.push(item);
        }
    }
    out
}

/// Split `raw` into (header, body) when it opens with a delimiter line and
/// the block is terminated.
fn split_header(raw: &str) -> Option<(&str, &str)> {
    let first_end = raw.find('\n')?;
    if raw[..first_end].trim_end_matches('\r') != DELIMITER {
        return None;
    }

    let header_start = first_end + 1;
    let mut pos = header_start;
    loop {
        let rest = &raw[pos..];
        let (line, next) = match rest.find('\n') {
            Some(idx) => (&rest[..idx], pos + idx + 1),
            None => (rest, raw.len()),
        };
        if line.trim_end_matches('\r') == DELIMITER {
            let header = &raw[header_start..pos];
            let body = &raw[next..];
            let body = body
                .strip_prefix("\r\n")
                .or_else(|| body.strip_prefix('\n'))
                .unwrap_or(body);
            return Some((header, body));
        }
        if next >= raw.len() {
            return None;
        }
        pos = next;
    }
}

fn parse_header(header: &str) -> RecordMeta {
    let mut meta = RecordMeta::default();
    for line in header.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();
        match key.trim() {
            "title" => meta.title = Some(parse_scalar(value)),
            "id" => meta.id = Some(parse_scalar(value)),
            "source" => meta.source = Some(parse_scalar(value)),
            "created" => meta.created = parse_timestamp(value),
            "modified" => meta.modified = parse_timestamp(value),
            "concepts" | "tags" => merge_into(&mut meta.concepts, parse_array(value)),
            "links" => merge_into(&mut meta.links, parse_array(value)),
            "backlinks" => merge_into(&mut meta.backlinks, parse_array(value)),
            "linkedNotes" | "linked_notes" => {
                merge_into(&mut meta.linked_notes, parse_array(value))
            }
            "relatedConcepts" | "related_concepts" => {
                merge_into(&mut meta.related_concepts, parse_array(value))
            }
            _ => {}
        }
    }
    meta
}

fn merge_into(target: &mut Option<Vec<String>>, items: Vec<String>) {
    let list = target.get_or_insert_with(Vec::new);
    for item in items {
        if !list.contains(&item) {
            list.push(item);
        }
    }
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// A scalar is quoted only when it starts with `"`; an unterminated quote
/// is kept verbatim.
fn parse_scalar(value: &str) -> String {
    let Some(inner) = value.strip_prefix('"') else {
        return value.to_string();
    };
    let mut out = String::new();
    let mut chars = inner.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => {
                if let Some(next) = chars.next() {
                    out.push(next);
                }
            }
            '"' => return out,
            _ => out.push(ch),
        }
    }
    value.to_string()
}

fn parse_array(value: &str) -> Vec<String> {
    let inner = value
        .strip_prefix('[')
        .and_then(|v| v.strip_suffix(']'))
        .unwrap_or(value);

    let mut items = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut was_quoted = false;
    let mut chars = inner.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' if quoted => {
                if let Some(next) = chars.next() {
                    current.push(next);
                }
            }
            '"' if quoted => quoted = false,
            '"' if current.trim().is_empty() && !was_quoted => {
                current.clear();
                quoted = true;
                was_quoted = true;
            }
            ',' if !quoted => {
                push_item(&mut items, &mut current, was_quoted);
                was_quoted = false;
            }
            _ => current.push(ch),
        }
    }
    push_item(&mut items, &mut current, was_quoted);
    items
}

fn push_item(items: &mut Vec<String>, current: &mut String, was_quoted: bool) {
    let item = if was_quoted {
        std::mem::take(current)
    } else {
        let trimmed = current.trim().to_string();
        current.clear();
        trimmed
    };
    if (was_quoted || !item.is_empty()) && !items.contains(&item) {
        items.push(item);
    }
}

fn push_array(lines: &mut Vec<String>, key: &str, items: Option<&[String]>) {
    if let Some(items) = items {
        let formatted: Vec<String> = items.iter().map(|item| format_item(item)).collect();
        lines.push(format!("{key}: [{}]", formatted.join(", ")));
    }
}

fn format_item(item: &str) -> String {
    let item = fold_scalar(item);
    let needs_quotes = item.is_empty()
        || item.trim() != item
        || item.contains([',', '[', ']', '"', '\\']);
    if needs_quotes {
        quote(&item)
    } else {
        item
    }
}

/// Scalars keep commas and brackets as-is; only edge whitespace or a
/// leading quote needs quoting.
fn format_scalar(value: &str) -> String {
    let value = fold_scalar(value);
    if value.trim() != value || value.starts_with('"') {
        quote(&value)
    } else {
        value
    }
}

fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

fn fold_scalar(value: &str) -> String {
    value.replace("\r\n", " ").replace(['\n', '\r'], " ")
}
