use tempfile::TempDir;

use notegraph_store::{NoteStore, PinKind, SaveNoteRequest, StoreError};

async fn open_store() -> (TempDir, NoteStore) {
    let temp = TempDir::new().expect("tempdir");
    let store = NoteStore::open_at(temp.path()).await.expect("open store");
    (temp, store)
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

async fn save(store: &NoteStore, filename: &str, concepts: &[&str]) {
    store
        .save_note(SaveNoteRequest {
            filename: filename.to_string(),
            content: format!("{filename} body"),
            concepts: strings(concepts),
            ..Default::default()
        })
        .await
        .unwrap();
}

async fn assert_bidirectional(store: &NoteStore, note: &str, concepts: &[&str]) {
    let loaded = store.load_note(note).await.unwrap();
    assert_eq!(loaded.metadata.concepts, strings(concepts));
    for concept in store.list_concepts().await.unwrap() {
        let lists_note = concept.metadata.linked_notes.iter().any(|n| n == note);
        let note_lists = loaded.metadata.concepts.contains(&concept.name);
        assert_eq!(lists_note, note_lists, "concept {}", concept.name);
    }
}

#[tokio::test]
async fn test_concept_edges_stay_bidirectional() {
    let (_temp, store) = open_store().await;
    save(&store, "a.txt", &[]).await;

    store.add_note_concept("a.txt", "rust").await.unwrap();
    store.add_note_concept("a.txt", "async").await.unwrap();
    store.add_note_concept("a.txt", "rust").await.unwrap();
    assert_bidirectional(&store, "a.txt", &["rust", "async"]).await;

    store.remove_note_concept("a.txt", "rust").await.unwrap();
    store.add_note_concept("a.txt", "rust").await.unwrap();
    store.remove_note_concept("a.txt", "async").await.unwrap();
    assert_bidirectional(&store, "a.txt", &["rust"]).await;

    store
        .update_note_concepts("a.txt", &strings(&["rust"]), &strings(&["web", "db"]))
        .await
        .unwrap();
    assert_bidirectional(&store, "a.txt", &["web", "db"]).await;
}

#[tokio::test]
async fn test_missing_source_is_an_error_missing_target_is_not() {
    let (_temp, store) = open_store().await;

    let err = store
        .add_note_concept("ghost.txt", "rust")
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::NoteNotFound(_)));
    let err = store
        .remove_note_concept("ghost.txt", "rust")
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::NoteNotFound(_)));

    save(&store, "a.txt", &[]).await;
    store.remove_note_concept("a.txt", "never-created").await.unwrap();
    store.remove_note_link("a.txt", "nowhere").await.unwrap();

    let err = store.remove_concept_relation("ghost", "rust").await.unwrap_err();
    assert!(matches!(err, StoreError::ConceptNotFound(_)));
}

#[tokio::test]
async fn test_delete_concept_lists_every_blocking_note() {
    let (temp, store) = open_store().await;
    save(&store, "b.txt", &["project"]).await;
    save(&store, "a.txt", &["project", "other"]).await;

    let err = store.delete_concept("project").await.unwrap_err();
    match &err {
        StoreError::ConceptInUse { concept, notes } => {
            assert_eq!(concept, "project");
            assert_eq!(notes, &strings(&["a.txt", "b.txt"]));
        }
        other => panic!("unexpected error: {other}"),
    }
    let message = err.to_string();
    assert!(message.contains("a.txt"));
    assert!(message.contains("b.txt"));
    assert!(temp.path().join("concepts").join("project.txt").exists());
}

#[tokio::test]
async fn test_delete_concept_detaches_related_concepts() {
    let (temp, store) = open_store().await;
    store.add_concept_relation("rust", "async").await.unwrap();
    store.pin_item(PinKind::Concept, "async").await.unwrap();

    let rust = store.get_concept("rust").await.unwrap();
    assert_eq!(rust.metadata.related_concepts, strings(&["async"]));
    let async_concept = store.get_concept("async").await.unwrap();
    assert_eq!(async_concept.metadata.related_concepts, strings(&["rust"]));

    store.delete_concept("async").await.unwrap();
    assert!(!temp.path().join("concepts").join("async.txt").exists());
    let rust = store.get_concept("rust").await.unwrap();
    assert!(rust.metadata.related_concepts.is_empty());
    assert!(store.get_pinned_items().await.unwrap().concepts.is_empty());
}

#[tokio::test]
async fn test_concept_create_ensure_and_save() {
    let (_temp, store) = open_store().await;

    let created = store.create_concept("rust", "A language.\n").await.unwrap();
    assert_eq!(created.content, "A language.\n");
    let err = store.create_concept("rust", "again").await.unwrap_err();
    assert!(matches!(err, StoreError::ConceptExists(_)));

    let ensured = store.ensure_concept("rust").await.unwrap();
    assert_eq!(ensured.content, "A language.\n");

    let saved = store
        .save_concept("rust", "Systems language.\n", Some(strings(&["memory", "async"])))
        .await
        .unwrap();
    assert_eq!(saved.content, "Systems language.\n");
    assert_eq!(saved.metadata.related_concepts, strings(&["memory", "async"]));
    let memory = store.get_concept("memory").await.unwrap();
    assert_eq!(memory.metadata.related_concepts, strings(&["rust"]));

    store
        .save_concept("rust", "Systems language.\n", Some(strings(&["async"])))
        .await
        .unwrap();
    let memory = store.get_concept("memory").await.unwrap();
    assert!(memory.metadata.related_concepts.is_empty());

    let names: Vec<String> = store
        .list_concepts()
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.name)
        .collect();
    assert_eq!(names, strings(&["async", "memory", "rust"]));

    let err = store.create_concept("../escape", "").await.unwrap_err();
    assert!(matches!(err, StoreError::InvalidConceptName(_)));
}

#[tokio::test]
async fn test_note_links_resolve_by_slug_and_extension() {
    let (_temp, store) = open_store().await;
    save(&store, "big-plan.txt", &[]).await;
    save(&store, "notes.md", &[]).await;
    save(&store, "source.txt", &[]).await;

    store.add_note_link("source.txt", "Big Plan").await.unwrap();
    store.add_note_link("source.txt", "notes").await.unwrap();

    let plan = store.load_note("big-plan.txt").await.unwrap();
    assert_eq!(plan.metadata.backlinks, strings(&["source.txt"]));
    let md = store.load_note("notes.md").await.unwrap();
    assert_eq!(md.metadata.backlinks, strings(&["source.txt"]));

    store.remove_note_link("source.txt", "Big Plan").await.unwrap();
    let plan = store.load_note("big-plan.txt").await.unwrap();
    assert!(plan.metadata.backlinks.is_empty());
    let source = store.load_note("source.txt").await.unwrap();
    assert_eq!(source.metadata.links, strings(&["notes"]));
}

#[tokio::test]
async fn test_backlink_survives_while_another_entry_resolves_to_target() {
    let (_temp, store) = open_store().await;
    save(&store, "b.txt", &[]).await;
    store
        .save_note(SaveNoteRequest {
            filename: "a.txt".to_string(),
            content: "a".to_string(),
            links: strings(&["b", "b.txt"]),
            ..Default::default()
        })
        .await
        .unwrap();

    store.remove_note_link("a.txt", "b").await.unwrap();
    let a = store.load_note("a.txt").await.unwrap();
    assert_eq!(a.metadata.links, strings(&["b.txt"]));
    let b = store.load_note("b.txt").await.unwrap();
    assert_eq!(b.metadata.backlinks, strings(&["a.txt"]));
    let report = store.validate_relations().await.unwrap();
    assert!(!report.has_issues, "unexpected issues: {:?}", report.issues);

    store.remove_note_link("a.txt", "b.txt").await.unwrap();
    let b = store.load_note("b.txt").await.unwrap();
    assert!(b.metadata.backlinks.is_empty());
}
