use notegraph_store::NoteStore;

/// State shared by every tool invocation.
#[derive(Debug, Clone)]
pub struct ToolContext {
    store: NoteStore,
}

impl ToolContext {
    pub fn new(store: NoteStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &NoteStore {
        &self.store
    }

    /// Context over a fresh store rooted at `root`.
    #[cfg(test)]
    pub async fn new_for_tests(root: &std::path::Path) -> Self {
        let store = NoteStore::open_at(root)
            .await
            .expect("open test store");
        Self::new(store)
    }
}
