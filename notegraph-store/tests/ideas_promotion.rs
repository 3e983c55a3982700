use tempfile::TempDir;

use notegraph_store::{IdeaInput, IdeaUpdate, Location, NoteStore, StoreError};

async fn open_store() -> (TempDir, NoteStore) {
    let temp = TempDir::new().expect("tempdir");
    let store = NoteStore::open_at(temp.path()).await.expect("open store");
    (temp, store)
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn test_ideas_get_unique_names_across_namespace() {
    let (temp, store) = open_store().await;
    tokio::fs::write(temp.path().join("idea.txt"), "root note").await.unwrap();
    tokio::fs::write(temp.path().join("inbox").join("idea-1.txt"), "older idea")
        .await
        .unwrap();

    let mut names = Vec::new();
    for n in 0..3 {
        let idea = store
            .create_idea(&format!("draft {n}"), IdeaInput::default())
            .await
            .unwrap();
        assert_eq!(idea.location, Location::Inbox);
        names.push(idea.filename);
    }
    assert_eq!(names, strings(&["idea-2.txt", "idea-3.txt", "idea-4.txt"]));
}

#[tokio::test]
async fn test_idea_crud_and_title_derivation() {
    let (_temp, store) = open_store().await;
    let idea = store
        .create_idea(
            "Groceries\nmilk, eggs",
            IdeaInput {
                source: Some("phone".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(idea.metadata.title, "Groceries");
    assert_eq!(idea.metadata.source.as_deref(), Some("phone"));
    assert_eq!(idea.id.len(), 36);

    let updated = store
        .update_idea(
            &idea.filename,
            IdeaUpdate {
                content: Some("Groceries\nmilk, eggs, bread".to_string()),
                concepts: Some(strings(&["shopping"])),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.id, idea.id);
    assert!(updated.content.contains("bread"));
    assert_eq!(updated.metadata.concepts, strings(&["shopping"]));

    // Ideas never create concept files.
    let err = store.get_concept("shopping").await.unwrap_err();
    assert!(matches!(err, StoreError::ConceptNotFound(_)));

    assert_eq!(store.list_ideas().await.unwrap().len(), 1);
    store.delete_idea(&idea.filename).await.unwrap();
    let err = store.load_idea(&idea.filename).await.unwrap_err();
    assert!(matches!(err, StoreError::IdeaNotFound(_)));
}

#[tokio::test]
async fn test_promotion_derives_concepts_and_links_from_body() {
    let (temp, store) = open_store().await;
    let idea = store
        .create_idea("Meeting notes #project @followup", IdeaInput::default())
        .await
        .unwrap();

    let note = store
        .promote_idea_to_note(&idea.filename, "Meeting Notes", &[])
        .await
        .unwrap();

    assert_eq!(note.filename, "meeting-notes.txt");
    assert_eq!(note.location, Location::Notes);
    assert_eq!(note.metadata.title.as_deref(), Some("Meeting Notes"));
    assert_eq!(note.metadata.concepts, strings(&["project"]));
    assert_eq!(note.metadata.links, strings(&["followup"]));
    assert!(!temp.path().join("inbox").join(&idea.filename).exists());

    let project = store.get_concept("project").await.unwrap();
    assert_eq!(project.metadata.linked_notes, strings(&["meeting-notes.txt"]));
}

#[tokio::test]
async fn test_promotion_merges_explicit_and_idea_concepts() {
    let (_temp, store) = open_store().await;
    let idea = store
        .create_idea(
            "plan #alpha",
            IdeaInput {
                concepts: strings(&["beta"]),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let note = store
        .promote_idea_to_note(&idea.filename, "Plan", &strings(&["gamma", "alpha"]))
        .await
        .unwrap();
    assert_eq!(note.metadata.concepts, strings(&["gamma", "alpha", "beta"]));
    for name in ["alpha", "beta", "gamma"] {
        let concept = store.get_concept(name).await.unwrap();
        assert_eq!(concept.metadata.linked_notes, strings(&["plan.txt"]));
    }
}

#[tokio::test]
async fn test_promotion_moves_idea_media() {
    let (temp, store) = open_store().await;
    let idea = store
        .create_idea("Whiteboard photo", IdeaInput::default())
        .await
        .unwrap();
    let media = store
        .save_media(b"png bytes", "board.png", Some(idea.filename.as_str()))
        .await
        .unwrap();
    assert_eq!(media.location, Location::Inbox);
    assert!(temp.path().join("inbox").join(&media.filename).exists());

    let note = store
        .promote_idea_to_note(&idea.filename, "Whiteboard", &[])
        .await
        .unwrap();

    let base = note.filename.trim_end_matches(".txt");
    assert!(temp.path().join(format!("{base}-image-1.png")).exists());
    assert!(!temp.path().join("inbox").join(&media.filename).exists());

    let report = store.validate_relations().await.unwrap();
    assert_eq!(report.count(notegraph_store::IssueKind::OrphanedMedia), 0);
}

#[tokio::test]
async fn test_promoting_missing_idea_fails() {
    let (_temp, store) = open_store().await;
    let err = store
        .promote_idea_to_note("idea.txt", "Nope", &[])
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::IdeaNotFound(_)));
}

#[tokio::test]
async fn test_ideas_are_outside_the_relation_graph() {
    let (_temp, store) = open_store().await;
    let idea = store
        .create_idea("draft", IdeaInput::default())
        .await
        .unwrap();
    store
        .save_note(notegraph_store::SaveNoteRequest {
            filename: "target.txt".to_string(),
            content: "target".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();

    let err = store
        .add_note_concept(&idea.filename, "rust")
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::InvalidRequest(_)));
    let err = store
        .add_note_link(&idea.filename, "target")
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::InvalidRequest(_)));
    assert!(matches!(
        store.remove_note_concept(&idea.filename, "rust").await,
        Err(StoreError::InvalidRequest(_))
    ));

    let target = store.load_note("target.txt").await.unwrap();
    assert!(target.metadata.backlinks.is_empty());
    assert!(store.get_concept("rust").await.is_err());
    let report = store.validate_relations().await.unwrap();
    assert!(!report.has_issues, "unexpected issues: {:?}", report.issues);
}

#[tokio::test]
async fn test_promotion_with_very_long_title_gets_a_valid_filename() {
    let (_temp, store) = open_store().await;
    let title = "word ".repeat(60);
    let mut filenames = Vec::new();
    for _ in 0..2 {
        let idea = store
            .create_idea("long one", IdeaInput::default())
            .await
            .unwrap();
        let note = store
            .promote_idea_to_note(&idea.filename, &title, &[])
            .await
            .unwrap();
        assert!(note.filename.len() <= notegraph_store::naming::MAX_FILENAME_LEN);
        assert!(note.filename.starts_with("word-word-"));
        assert_eq!(note.metadata.title.as_deref(), Some(title.trim()));
        filenames.push(note.filename);
    }
    assert_ne!(filenames[0], filenames[1]);
    assert!(filenames[1].ends_with("-1.txt"));
}
