use std::collections::HashSet;

use tempfile::TempDir;

use notegraph_store::{IdeaInput, NoteStore, SaveNoteRequest};

async fn open_store() -> (TempDir, NoteStore) {
    let temp = TempDir::new().expect("tempdir");
    let store = NoteStore::open_at(temp.path()).await.expect("open store");
    (temp, store)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_concept_adds_lose_nothing() {
    let (_temp, store) = open_store().await;
    store
        .save_note(SaveNoteRequest {
            filename: "hub.txt".to_string(),
            content: "hub".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();

    let mut handles = Vec::new();
    for n in 0..12 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            store.add_note_concept("hub.txt", &format!("c{n}")).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let hub = store.load_note("hub.txt").await.unwrap();
    let concepts: HashSet<String> = hub.metadata.concepts.into_iter().collect();
    assert_eq!(concepts.len(), 12);
    for n in 0..12 {
        let concept = store.get_concept(&format!("c{n}")).await.unwrap();
        assert_eq!(concept.metadata.linked_notes, vec!["hub.txt".to_string()]);
    }
    assert_eq!(store.locks().active(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_idea_capture_uses_distinct_names() {
    let (_temp, store) = open_store().await;

    let mut handles = Vec::new();
    for n in 0..10 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            store
                .create_idea(&format!("idea number {n}"), IdeaInput::default())
                .await
        }));
    }
    let mut names = HashSet::new();
    for handle in handles {
        let idea = handle.await.unwrap().unwrap();
        names.insert(idea.filename);
    }

    assert_eq!(names.len(), 10);
    assert_eq!(store.list_ideas().await.unwrap().len(), 10);
    assert_eq!(store.locks().active(), 0);
}
