use serde::Deserialize;
use serde_json::{Value, json};

use notegraph_store::SaveNoteRequest;

use super::{Tool, ToolContext, parse_args, to_json};

#[derive(Debug, Deserialize)]
struct FilenameInput {
    filename: String,
}

pub struct NoteSaveTool;

#[async_trait::async_trait]
impl Tool for NoteSaveTool {
    fn name(&self) -> &str {
        "note_save"
    }

    fn description(&self) -> &str {
        "Create or overwrite a note. Concept and link edges are kept bidirectional."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "filename": {
                    "type": "string",
                    "description": "Note filename ending in .txt or .md."
                },
                "content": { "type": "string", "description": "Note body." },
                "title": { "type": "string" },
                "concepts": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Concept names; missing concepts are created."
                },
                "links": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Link targets: filenames, bare names or titles."
                }
            },
            "required": ["filename", "content"],
            "additionalProperties": false
        })
    }

    async fn execute(&self, args: Value, context: &ToolContext) -> Result<String, String> {
        let request: SaveNoteRequest = parse_args(args)?;
        let note = context
            .store()
            .save_note(request)
            .await
            .map_err(|e| e.to_string())?;
        to_json(&note)
    }
}

pub struct NoteGetTool;

#[async_trait::async_trait]
impl Tool for NoteGetTool {
    fn name(&self) -> &str {
        "note_get"
    }

    fn description(&self) -> &str {
        "Load a note (notes root first, then inbox)."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "filename": { "type": "string" }
            },
            "required": ["filename"],
            "additionalProperties": false
        })
    }

    async fn execute(&self, args: Value, context: &ToolContext) -> Result<String, String> {
        let input: FilenameInput = parse_args(args)?;
        let note = context
            .store()
            .load_note(&input.filename)
            .await
            .map_err(|e| e.to_string())?;
        to_json(&note)
    }
}

pub struct NoteDeleteTool;

#[async_trait::async_trait]
impl Tool for NoteDeleteTool {
    fn name(&self) -> &str {
        "note_delete"
    }

    fn description(&self) -> &str {
        "Delete a note after removing it from every concept and link partner."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "filename": { "type": "string" }
            },
            "required": ["filename"],
            "additionalProperties": false
        })
    }

    async fn execute(&self, args: Value, context: &ToolContext) -> Result<String, String> {
        let input: FilenameInput = parse_args(args)?;
        context
            .store()
            .delete_note(&input.filename)
            .await
            .map_err(|e| e.to_string())?;
        to_json(&json!({ "deleted": input.filename }))
    }
}

#[derive(Debug, Deserialize)]
struct RenameInput {
    old_filename: String,
    new_filename: String,
}

pub struct NoteRenameTool;

#[async_trait::async_trait]
impl Tool for NoteRenameTool {
    fn name(&self) -> &str {
        "note_rename"
    }

    fn description(&self) -> &str {
        "Rename a note. Edges, media attachments and pins follow the new name."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "old_filename": { "type": "string" },
                "new_filename": { "type": "string" }
            },
            "required": ["old_filename", "new_filename"],
            "additionalProperties": false
        })
    }

    async fn execute(&self, args: Value, context: &ToolContext) -> Result<String, String> {
        let input: RenameInput = parse_args(args)?;
        let note = context
            .store()
            .rename_note(&input.old_filename, &input.new_filename)
            .await
            .map_err(|e| e.to_string())?;
        to_json(&note)
    }
}

pub struct NoteListTool;

#[async_trait::async_trait]
impl Tool for NoteListTool {
    fn name(&self) -> &str {
        "note_list"
    }

    fn description(&self) -> &str {
        "List notes outside the inbox, most recently modified first."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {},
            "additionalProperties": false
        })
    }

    async fn execute(&self, _args: Value, context: &ToolContext) -> Result<String, String> {
        let notes = context
            .store()
            .list_notes()
            .await
            .map_err(|e| e.to_string())?;
        to_json(&notes)
    }
}

#[derive(Debug, Deserialize)]
struct SearchInput {
    query: String,
}

pub struct NoteSearchTool;

#[async_trait::async_trait]
impl Tool for NoteSearchTool {
    fn name(&self) -> &str {
        "note_search"
    }

    fn description(&self) -> &str {
        "Case-insensitive substring search over note and idea filenames, titles and bodies."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": { "type": "string" }
            },
            "required": ["query"],
            "additionalProperties": false
        })
    }

    async fn execute(&self, args: Value, context: &ToolContext) -> Result<String, String> {
        let input: SearchInput = parse_args(args)?;
        let hits = context
            .store()
            .search(&input.query)
            .await
            .map_err(|e| e.to_string())?;
        to_json(&hits)
    }
}

#[derive(Debug, Deserialize)]
struct MergeInput {
    filenames: Vec<String>,
    title: String,
}

pub struct NoteMergeTool;

#[async_trait::async_trait]
impl Tool for NoteMergeTool {
    fn name(&self) -> &str {
        "note_merge"
    }

    fn description(&self) -> &str {
        "Merge several notes into a new titled note and delete the originals."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "filenames": {
                    "type": "array",
                    "items": { "type": "string" },
                    "minItems": 1
                },
                "title": { "type": "string" }
            },
            "required": ["filenames", "title"],
            "additionalProperties": false
        })
    }

    async fn execute(&self, args: Value, context: &ToolContext) -> Result<String, String> {
        let input: MergeInput = parse_args(args)?;
        let note = context
            .store()
            .merge_notes(&input.filenames, &input.title)
            .await
            .map_err(|e| e.to_string())?;
        to_json(&note)
    }
}

pub struct NoteEnrichTool;

#[async_trait::async_trait]
impl Tool for NoteEnrichTool {
    fn name(&self) -> &str {
        "note_enrich"
    }

    fn description(&self) -> &str {
        "Attach the #concepts, @mentions and [[links]] found in a note's body."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "filename": { "type": "string" }
            },
            "required": ["filename"],
            "additionalProperties": false
        })
    }

    async fn execute(&self, args: Value, context: &ToolContext) -> Result<String, String> {
        let input: FilenameInput = parse_args(args)?;
        let note = context
            .store()
            .enrich_note(&input.filename)
            .await
            .map_err(|e| e.to_string())?;
        to_json(&note)
    }
}
