use tempfile::TempDir;

use notegraph_store::{IssueKind, NoteStore, RepairAction, SaveNoteRequest, Severity};

async fn open_store() -> (TempDir, NoteStore) {
    let temp = TempDir::new().expect("tempdir");
    let store = NoteStore::open_at(temp.path()).await.expect("open store");
    (temp, store)
}

async fn save(store: &NoteStore, filename: &str, concepts: &[&str], links: &[&str]) {
    store
        .save_note(SaveNoteRequest {
            filename: filename.to_string(),
            content: "body\n".to_string(),
            title: None,
            concepts: concepts.iter().map(|s| s.to_string()).collect(),
            links: links.iter().map(|s| s.to_string()).collect(),
        })
        .await
        .unwrap();
}

#[tokio::test]
async fn test_clean_graph_has_no_issues() {
    let (_temp, store) = open_store().await;
    save(&store, "b.txt", &["rust"], &[]).await;
    save(&store, "a.txt", &["rust"], &["b"]).await;
    store.add_concept_relation("rust", "async").await.unwrap();

    let report = store.validate_relations().await.unwrap();
    assert!(!report.has_issues, "unexpected issues: {:?}", report.issues);
    assert_eq!(report.stats.notes_checked, 2);
    assert_eq!(report.stats.concepts_checked, 2);
    assert!(report.stats.relations_checked >= 6);
}

#[tokio::test]
async fn test_corrupted_linked_notes_report_one_orphaned_backlink() {
    let (temp, store) = open_store().await;
    save(&store, "a.txt", &["project"], &[]).await;

    tokio::fs::write(
        temp.path().join("concepts").join("project.txt"),
        "---\nlinkedNotes: [a.txt, ghost.txt]\nrelatedConcepts: []\n---\n\n",
    )
    .await
    .unwrap();

    let report = store.validate_relations().await.unwrap();
    assert!(report.has_issues);
    assert_eq!(report.issues.len(), 1);
    let issue = &report.issues[0];
    assert_eq!(issue.kind, IssueKind::OrphanedBacklink);
    assert_eq!(issue.severity, Severity::Error);
    assert_eq!(issue.source, "project");
    assert_eq!(issue.target, "ghost.txt");
    assert_eq!(
        issue.repair,
        RepairAction::RemoveLinkedNote {
            concept: "project".to_string(),
            note: "ghost.txt".to_string(),
        }
    );
}

#[tokio::test]
async fn test_repair_fixes_drift_and_is_idempotent() {
    let (temp, store) = open_store().await;
    save(&store, "b.txt", &[], &[]).await;
    store.ensure_concept("rust").await.unwrap();
    store.ensure_concept("web").await.unwrap();

    // Hand-written files that skip every reciprocal edge.
    tokio::fs::write(
        temp.path().join("a.txt"),
        "---\nconcepts: [rust, missing]\nlinks: [b]\nbacklinks: [nobody.txt]\n---\n\nbody\n",
    )
    .await
    .unwrap();
    tokio::fs::write(
        temp.path().join("concepts").join("web.txt"),
        "---\nlinkedNotes: [b.txt]\nrelatedConcepts: [rust, gone]\n---\n\n",
    )
    .await
    .unwrap();

    let before = store.validate_relations().await.unwrap();
    assert_eq!(before.count(IssueKind::MissingBacklink), 3);
    assert_eq!(before.count(IssueKind::InvalidConcept), 2);
    assert_eq!(before.count(IssueKind::OrphanedBacklink), 2);

    let first = store.repair_relations().await.unwrap();
    assert_eq!(first.fixed, before.issues.len());
    assert_eq!(first.issues.len(), first.fixed);

    let after = store.validate_relations().await.unwrap();
    assert!(!after.has_issues, "left over: {:?}", after.issues);

    let second = store.repair_relations().await.unwrap();
    assert_eq!(second.fixed, 0);

    let a = store.load_note("a.txt").await.unwrap();
    assert_eq!(a.metadata.concepts, vec!["rust".to_string()]);
    assert!(a.metadata.backlinks.is_empty());
    let b = store.load_note("b.txt").await.unwrap();
    assert_eq!(b.metadata.backlinks, vec!["a.txt".to_string()]);
    let rust = store.get_concept("rust").await.unwrap();
    assert_eq!(rust.metadata.linked_notes, vec!["a.txt".to_string()]);
    assert_eq!(rust.metadata.related_concepts, vec!["web".to_string()]);
}

#[tokio::test]
async fn test_orphaned_media_and_broken_links_are_report_only() {
    let (temp, store) = open_store().await;
    save(&store, "a.txt", &[], &["Not Yet Written"]).await;
    store.save_media(b"x", "photo.png", Some("a.txt")).await.unwrap();
    tokio::fs::write(temp.path().join("gone-image-1.png"), b"x").await.unwrap();
    tokio::fs::write(temp.path().join("holiday.jpg"), b"x").await.unwrap();

    let report = store.validate_relations().await.unwrap();
    assert_eq!(report.stats.media_checked, 3);
    assert_eq!(report.count(IssueKind::OrphanedMedia), 1);
    assert_eq!(report.count(IssueKind::BrokenLink), 1);
    for issue in &report.issues {
        let expected = match issue.kind {
            IssueKind::OrphanedMedia => Severity::Warning,
            _ => Severity::Error,
        };
        assert_eq!(issue.severity, expected, "{:?}", issue.kind);
        assert_eq!(issue.repair, RepairAction::ReportOnly);
    }
    let media = report
        .issues
        .iter()
        .find(|i| i.kind == IssueKind::OrphanedMedia)
        .unwrap();
    assert_eq!(media.source, "gone-image-1.png");

    let repair = store.repair_relations().await.unwrap();
    assert_eq!(repair.fixed, 0);
    assert_eq!(repair.issues.len(), 2);
    assert!(temp.path().join("gone-image-1.png").exists());
}
