use serde_json::Value;

use super::{
    Tool, ToolContext,
    concepts::{
        ConceptCreateTool, ConceptDeleteTool, ConceptGetTool, ConceptListTool, ConceptSaveTool,
    },
    entity::EntityGetTool,
    ideas::{
        IdeaCreateTool, IdeaDeleteTool, IdeaGetTool, IdeaListTool, IdeaPromoteTool,
        IdeaUpdateTool,
    },
    integrity::{RelationsRepairTool, RelationsValidateTool},
    media::{MediaDeleteTool, MediaGetTool, MediaListTool, MediaSaveTool},
    notes::{
        NoteDeleteTool, NoteEnrichTool, NoteGetTool, NoteListTool, NoteMergeTool, NoteRenameTool,
        NoteSaveTool, NoteSearchTool,
    },
    preferences::{NotesRecentTool, PinAddTool, PinRemoveTool, PinsGetTool},
    relations::{
        ConceptRelationAddTool, ConceptRelationRemoveTool, NoteConceptAddTool,
        NoteConceptRemoveTool, NoteLinkAddTool, NoteLinkRemoveTool,
    },
};

/// Central registry for every store operation exposed on the command line
///
/// Owns all tool instances and dispatches calls by name, so `main` never
/// needs to know how an operation maps onto the store.
pub struct ToolManager {
    tools: Vec<Box<dyn Tool>>,
}

impl ToolManager {
    /// Create a new ToolManager with all available tools registered
    pub fn new() -> Self {
        let tools: Vec<Box<dyn Tool>> = vec![
            Box::new(NoteSaveTool),
            Box::new(NoteGetTool),
            Box::new(NoteDeleteTool),
            Box::new(NoteRenameTool),
            Box::new(NoteListTool),
            Box::new(NoteSearchTool),
            Box::new(NoteMergeTool),
            Box::new(NoteEnrichTool),
            Box::new(IdeaCreateTool),
            Box::new(IdeaGetTool),
            Box::new(IdeaUpdateTool),
            Box::new(IdeaDeleteTool),
            Box::new(IdeaListTool),
            Box::new(IdeaPromoteTool),
            Box::new(ConceptCreateTool),
            Box::new(ConceptGetTool),
            Box::new(ConceptSaveTool),
            Box::new(ConceptDeleteTool),
            Box::new(ConceptListTool),
            Box::new(NoteConceptAddTool),
            Box::new(NoteConceptRemoveTool),
            Box::new(NoteLinkAddTool),
            Box::new(NoteLinkRemoveTool),
            Box::new(ConceptRelationAddTool),
            Box::new(ConceptRelationRemoveTool),
            Box::new(MediaSaveTool),
            Box::new(MediaListTool),
            Box::new(MediaGetTool),
            Box::new(MediaDeleteTool),
            Box::new(RelationsValidateTool),
            Box::new(RelationsRepairTool),
            Box::new(PinsGetTool),
            Box::new(PinAddTool),
            Box::new(PinRemoveTool),
            Box::new(NotesRecentTool),
            Box::new(EntityGetTool),
        ];
        Self { tools }
    }

    pub fn get_tools(&self) -> Vec<&dyn Tool> {
        self.tools.iter().map(|t| t.as_ref()).collect()
    }

    /// Execute a tool by name with the given input and context
    ///
    /// # Arguments
    /// * `name` - The tool name (must match `Tool::name()`)
    /// * `input` - JSON input for the tool
    /// * `context` - Execution context holding the open store
    ///
    /// # Returns
    /// The tool's JSON output as a string, or an error message
    pub async fn execute_with_context(
        &self,
        name: &str,
        input: Value,
        context: &ToolContext,
    ) -> Result<String, String> {
        for tool in &self.tools {
            if tool.name() == name {
                return tool.execute(input, context).await;
            }
        }
        Err(format!("Unknown tool: {}", name))
    }
}

impl Default for ToolManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use serde_json::json;

    #[test]
    fn test_tool_manager_new() {
        let manager = ToolManager::new();
        let tools = manager.get_tools();

        let tool_names: Vec<&str> = tools.iter().map(|t| t.name()).collect();
        assert!(tool_names.contains(&"note_save"));
        assert!(tool_names.contains(&"idea_promote"));
        assert!(tool_names.contains(&"concept_delete"));
        assert!(tool_names.contains(&"note_link_add"));
        assert!(tool_names.contains(&"media_save"));
        assert!(tool_names.contains(&"relations_repair"));
        assert!(tool_names.contains(&"pin_add"));
        assert!(tool_names.contains(&"entity_get"));

        let unique: HashSet<&str> = tool_names.iter().copied().collect();
        assert_eq!(unique.len(), tool_names.len(), "duplicate tool names");
    }

    #[test]
    fn test_tool_names_and_schemas_are_well_formed() {
        let manager = ToolManager::new();
        for tool in manager.get_tools() {
            let name = tool.name();
            assert!(!name.is_empty() && name.len() <= 64);
            assert!(
                name.chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_'),
                "bad tool name {name}"
            );
            assert_eq!(tool.input_schema()["type"], "object", "{name}");
        }
    }

    #[tokio::test]
    async fn test_tool_manager_execute_unknown() {
        let manager = ToolManager::new();
        let temp_dir = tempfile::TempDir::new().unwrap();
        let context = ToolContext::new_for_tests(temp_dir.path()).await;

        let result = manager
            .execute_with_context("unknown_tool", json!({}), &context)
            .await;
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("Unknown tool"));
    }

    #[tokio::test]
    async fn test_tool_manager_save_and_get_note() {
        let manager = ToolManager::new();
        let temp_dir = tempfile::TempDir::new().unwrap();
        let context = ToolContext::new_for_tests(temp_dir.path()).await;

        let saved = manager
            .execute_with_context(
                "note_save",
                json!({
                    "filename": "garden.txt",
                    "content": "Tomatoes need sun.",
                    "concepts": ["plants"]
                }),
                &context,
            )
            .await;
        assert!(saved.is_ok(), "{saved:?}");

        let concept = manager
            .execute_with_context("concept_get", json!({ "name": "plants" }), &context)
            .await
            .unwrap();
        let concept: Value = serde_json::from_str(&concept).unwrap();
        assert_eq!(concept["metadata"]["linkedNotes"], json!(["garden.txt"]));

        let entity = manager
            .execute_with_context(
                "entity_get",
                json!({ "kind": "note", "name": "garden.txt" }),
                &context,
            )
            .await
            .unwrap();
        let entity: Value = serde_json::from_str(&entity).unwrap();
        assert_eq!(entity["kind"], "note");
        assert_eq!(entity["content"], "Tomatoes need sun.");
    }

    #[tokio::test]
    async fn test_tool_manager_reports_store_errors() {
        let manager = ToolManager::new();
        let temp_dir = tempfile::TempDir::new().unwrap();
        let context = ToolContext::new_for_tests(temp_dir.path()).await;

        let missing = manager
            .execute_with_context("note_get", json!({ "filename": "nope.txt" }), &context)
            .await;
        assert!(missing.is_err());

        let bad_args = manager
            .execute_with_context("note_get", json!({ "file": 3 }), &context)
            .await;
        assert!(bad_args.unwrap_err().starts_with("Invalid arguments"));
    }

    #[tokio::test]
    async fn test_tool_manager_media_roundtrip_through_files() {
        let manager = ToolManager::new();
        let store_dir = tempfile::TempDir::new().unwrap();
        let scratch = tempfile::TempDir::new().unwrap();
        let context = ToolContext::new_for_tests(store_dir.path()).await;

        manager
            .execute_with_context(
                "note_save",
                json!({ "filename": "trip.txt", "content": "Photos below." }),
                &context,
            )
            .await
            .unwrap();

        let source = scratch.path().join("beach.png");
        tokio::fs::write(&source, b"png-bytes").await.unwrap();
        let saved = manager
            .execute_with_context(
                "media_save",
                json!({ "source_path": source.to_str().unwrap(), "note": "trip.txt" }),
                &context,
            )
            .await
            .unwrap();
        let saved: Value = serde_json::from_str(&saved).unwrap();
        assert_eq!(saved["filename"], "trip-image-1.png");

        let listed = manager
            .execute_with_context("media_list", json!({ "note": "trip.txt" }), &context)
            .await
            .unwrap();
        let listed: Value = serde_json::from_str(&listed).unwrap();
        assert_eq!(listed.as_array().map(Vec::len), Some(1));

        let out = scratch.path().join("copy.png");
        manager
            .execute_with_context(
                "media_get",
                json!({ "filename": "trip-image-1.png", "output_path": out.to_str().unwrap() }),
                &context,
            )
            .await
            .unwrap();
        assert_eq!(tokio::fs::read(&out).await.unwrap(), b"png-bytes");
    }
}
