//! Whole-graph validation and repair.
//!
//! Validation reads every root note and concept once and checks each edge
//! against its reciprocal. Every issue carries the action that fixes it, so
//! repair never has to interpret descriptions.

use std::collections::{BTreeMap, HashSet};

use tracing::{info, warn};

use crate::errors::StoreResult;
use crate::models::{
    IntegrityIssue, IssueKind, Location, RepairAction, RepairReport, ValidationReport,
    ValidationStats,
};
use crate::naming::parse_media_filename;
use crate::storage::{is_note_file, list_files};

use super::relations::{insert_item, link_candidates, link_matches, remove_item};
use super::{NoteStore, concepts, notes};

struct NoteEdges {
    concepts: Vec<String>,
    links: Vec<String>,
    backlinks: Vec<String>,
}

struct ConceptEdges {
    linked_notes: Vec<String>,
    related: Vec<String>,
}

/// In-memory snapshot of the graph.
struct Graph {
    notes: BTreeMap<String, NoteEdges>,
    concepts: BTreeMap<String, ConceptEdges>,
}

impl Graph {
    async fn load(store: &NoteStore) -> StoreResult<Self> {
        let notes = notes::notes_in(store, Location::Notes)
            .await?
            .into_iter()
            .map(|note| {
                let edges = NoteEdges {
                    concepts: note.metadata.concepts,
                    links: note.metadata.links,
                    backlinks: note.metadata.backlinks,
                };
                (note.filename, edges)
            })
            .collect();
        let concepts = concepts::list_concepts(store)
            .await?
            .into_iter()
            .map(|concept| {
                let edges = ConceptEdges {
                    linked_notes: concept.metadata.linked_notes,
                    related: concept.metadata.related_concepts,
                };
                (concept.name, edges)
            })
            .collect();
        Ok(Self { notes, concepts })
    }

    fn resolve(&self, link: &str) -> Option<&str> {
        link_candidates(link)
            .into_iter()
            .find_map(|candidate| self.notes.get_key_value(&candidate).map(|(k, _)| k.as_str()))
    }
}

fn issue(
    kind: IssueKind,
    source: &str,
    target: &str,
    description: String,
    repair: RepairAction,
) -> IntegrityIssue {
    IntegrityIssue {
        kind,
        severity: kind.severity(),
        source: source.to_string(),
        target: target.to_string(),
        description,
        repair,
    }
}

fn check_concepts(graph: &Graph, issues: &mut Vec<IntegrityIssue>, stats: &mut ValidationStats) {
    for (name, edges) in &graph.concepts {
        stats.concepts_checked += 1;
        for note in &edges.linked_notes {
            stats.relations_checked += 1;
            let description = match graph.notes.get(note) {
                None => format!("concept '{name}' lists missing note '{note}'"),
                Some(target) if !target.concepts.contains(name) => {
                    format!("concept '{name}' lists note '{note}' which does not reference it")
                }
                Some(_) => continue,
            };
            issues.push(issue(
                IssueKind::OrphanedBacklink,
                name,
                note,
                description,
                RepairAction::RemoveLinkedNote {
                    concept: name.clone(),
                    note: note.clone(),
                },
            ));
        }
        for related in &edges.related {
            stats.relations_checked += 1;
            match graph.concepts.get(related) {
                None => issues.push(issue(
                    IssueKind::InvalidConcept,
                    name,
                    related,
                    format!("concept '{name}' relates to missing concept '{related}'"),
                    RepairAction::RemoveRelatedConcept {
                        concept: name.clone(),
                        related: related.clone(),
                    },
                )),
                Some(other) if !other.related.contains(name) => issues.push(issue(
                    IssueKind::MissingBacklink,
                    name,
                    related,
                    format!("concept '{related}' does not relate back to '{name}'"),
                    RepairAction::AddRelatedConcept {
                        concept: related.clone(),
                        related: name.clone(),
                    },
                )),
                Some(_) => {}
            }
        }
    }
}

fn check_notes(graph: &Graph, issues: &mut Vec<IntegrityIssue>, stats: &mut ValidationStats) {
    for (filename, edges) in &graph.notes {
        stats.notes_checked += 1;

        for concept in &edges.concepts {
            stats.relations_checked += 1;
            match graph.concepts.get(concept) {
                None => issues.push(issue(
                    IssueKind::InvalidConcept,
                    filename,
                    concept,
                    format!("note '{filename}' references missing concept '{concept}'"),
                    RepairAction::RemoveNoteConcept {
                        note: filename.clone(),
                        concept: concept.clone(),
                    },
                )),
                Some(target) if !target.linked_notes.contains(filename) => issues.push(issue(
                    IssueKind::MissingBacklink,
                    filename,
                    concept,
                    format!("concept '{concept}' does not list note '{filename}'"),
                    RepairAction::AddLinkedNote {
                        concept: concept.clone(),
                        note: filename.clone(),
                    },
                )),
                Some(_) => {}
            }
        }

        for link in &edges.links {
            stats.relations_checked += 1;
            let Some(target) = graph.resolve(link) else {
                issues.push(issue(
                    IssueKind::BrokenLink,
                    filename,
                    link,
                    format!("note '{filename}' links to '{link}' which does not resolve"),
                    RepairAction::ReportOnly,
                ));
                continue;
            };
            let reciprocated = graph
                .notes
                .get(target)
                .is_some_and(|t| t.backlinks.iter().any(|b| b == filename));
            if !reciprocated {
                issues.push(issue(
                    IssueKind::MissingBacklink,
                    filename,
                    target,
                    format!("note '{target}' has no backlink to '{filename}'"),
                    RepairAction::AddBacklink {
                        note: target.to_string(),
                        source: filename.clone(),
                    },
                ));
            }
        }

        for backlink in &edges.backlinks {
            stats.relations_checked += 1;
            let description = match graph.resolve(backlink) {
                None => format!("note '{filename}' has a backlink from missing note '{backlink}'"),
                Some(source) => {
                    let links_back = graph
                        .notes
                        .get(source)
                        .is_some_and(|s| s.links.iter().any(|l| link_matches(l, filename)));
                    if links_back {
                        continue;
                    }
                    format!("note '{filename}' has a backlink from '{source}' which does not link to it")
                }
            };
            issues.push(issue(
                IssueKind::OrphanedBacklink,
                filename,
                backlink,
                description,
                RepairAction::RemoveBacklink {
                    note: filename.clone(),
                    source: backlink.clone(),
                },
            ));
        }
    }
}

async fn check_media(
    store: &NoteStore,
    issues: &mut Vec<IntegrityIssue>,
    stats: &mut ValidationStats,
) -> StoreResult<()> {
    let root_files = list_files(store.layout().notes_dir()).await?;
    let inbox_files = list_files(&store.layout().inbox_dir()).await?;
    let existing: HashSet<&str> = root_files
        .iter()
        .chain(inbox_files.iter())
        .filter(|name| is_note_file(name))
        .map(String::as_str)
        .collect();

    for filename in root_files.iter().chain(inbox_files.iter()) {
        if is_note_file(filename) {
            continue;
        }
        stats.media_checked += 1;
        let Some(media) = parse_media_filename(filename) else {
            continue;
        };
        let base = &media.owner_base;
        let owned = existing.contains(format!("{base}.txt").as_str())
            || existing.contains(format!("{base}.md").as_str());
        if !owned {
            issues.push(issue(
                IssueKind::OrphanedMedia,
                filename,
                base,
                format!("media '{filename}' belongs to missing note '{base}'"),
                RepairAction::ReportOnly,
            ));
        }
    }
    Ok(())
}

pub(crate) async fn validate_relations(store: &NoteStore) -> StoreResult<ValidationReport> {
    let graph = Graph::load(store).await?;
    let mut issues = Vec::new();
    let mut stats = ValidationStats::default();

    check_concepts(&graph, &mut issues, &mut stats);
    check_notes(&graph, &mut issues, &mut stats);
    check_media(store, &mut issues, &mut stats).await?;

    info!(
        issues = issues.len(),
        notes = stats.notes_checked,
        concepts = stats.concepts_checked,
        relations = stats.relations_checked,
        media = stats.media_checked,
        "relations validated"
    );
    Ok(ValidationReport {
        has_issues: !issues.is_empty(),
        issues,
        stats,
    })
}

/// Apply one repair action; `Ok(false)` means nothing needed changing.
async fn apply(store: &NoteStore, action: &RepairAction) -> StoreResult<bool> {
    match action {
        RepairAction::RemoveLinkedNote { concept, note } => {
            concepts::modify_concept(store, concept, |m| remove_item(&mut m.linked_notes, note)).await
        }
        RepairAction::AddLinkedNote { concept, note } => {
            concepts::modify_concept(store, concept, |m| insert_item(&mut m.linked_notes, note)).await
        }
        RepairAction::RemoveNoteConcept { note, concept } => {
            notes::modify_note(store, note, |m| remove_item(&mut m.concepts, concept)).await
        }
        RepairAction::RemoveRelatedConcept { concept, related } => {
            concepts::modify_concept(store, concept, |m| {
                remove_item(&mut m.related_concepts, related)
            })
            .await
        }
        RepairAction::AddRelatedConcept { concept, related } => {
            concepts::modify_concept(store, concept, |m| {
                insert_item(&mut m.related_concepts, related)
            })
            .await
        }
        RepairAction::AddBacklink { note, source } => {
            notes::modify_note(store, note, |m| insert_item(&mut m.backlinks, source)).await
        }
        RepairAction::RemoveBacklink { note, source } => {
            notes::modify_note(store, note, |m| remove_item(&mut m.backlinks, source)).await
        }
        RepairAction::ReportOnly => Ok(false),
    }
}

pub(crate) async fn repair_relations(store: &NoteStore) -> StoreResult<RepairReport> {
    let validation = validate_relations(store).await?;
    let mut report = RepairReport::default();

    for found in &validation.issues {
        if found.repair == RepairAction::ReportOnly {
            report
                .issues
                .push(format!("Reported only ({}): {}", found.kind.as_str(), found.description));
            continue;
        }
        match apply(store, &found.repair).await {
            Ok(true) => {
                report.fixed += 1;
                report
                    .issues
                    .push(format!("Fixed ({}): {}", found.kind.as_str(), found.description));
            }
            Ok(false) => {}
            Err(err) => {
                warn!(kind = found.kind.as_str(), error = %err, "repair action failed");
                report.issues.push(format!(
                    "Failed ({}): {}: {err}",
                    found.kind.as_str(),
                    found.description
                ));
            }
        }
    }

    info!(fixed = report.fixed, "relations repaired");
    Ok(report)
}
