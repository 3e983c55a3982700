use serde::Deserialize;
use serde_json::{Value, json};

use super::{Tool, ToolContext, parse_args, to_json};

#[derive(Debug, Deserialize)]
struct SaveInput {
    source_path: String,
    #[serde(default)]
    original_name: Option<String>,
    #[serde(default)]
    note: Option<String>,
}

pub struct MediaSaveTool;

#[async_trait::async_trait]
impl Tool for MediaSaveTool {
    fn name(&self) -> &str {
        "media_save"
    }

    fn description(&self) -> &str {
        "Copy a local file into the store, optionally attached to a note."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "source_path": {
                    "type": "string",
                    "description": "Path of the file to import."
                },
                "original_name": {
                    "type": "string",
                    "description": "Name used for the extension and unattached filename. Defaults to the source file name."
                },
                "note": {
                    "type": "string",
                    "description": "Owning note filename. The media is stored next to it."
                }
            },
            "required": ["source_path"],
            "additionalProperties": false
        })
    }

    async fn execute(&self, args: Value, context: &ToolContext) -> Result<String, String> {
        let input: SaveInput = parse_args(args)?;
        let bytes = tokio::fs::read(&input.source_path)
            .await
            .map_err(|e| format!("Failed to read {}: {}", input.source_path, e))?;
        let original_name = input
            .original_name
            .unwrap_or_else(|| input.source_path.clone());
        let media = context
            .store()
            .save_media(&bytes, &original_name, input.note.as_deref())
            .await
            .map_err(|e| e.to_string())?;
        to_json(&media)
    }
}

#[derive(Debug, Deserialize)]
struct ListInput {
    #[serde(default)]
    note: Option<String>,
}

pub struct MediaListTool;

#[async_trait::async_trait]
impl Tool for MediaListTool {
    fn name(&self) -> &str {
        "media_list"
    }

    fn description(&self) -> &str {
        "List media files, or only those attached to one note."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "note": { "type": "string", "description": "Owning note filename." }
            },
            "additionalProperties": false
        })
    }

    async fn execute(&self, args: Value, context: &ToolContext) -> Result<String, String> {
        let input: ListInput = parse_args(args)?;
        let media = match input.note.as_deref() {
            Some(note) => context.store().list_media_for_note(note).await,
            None => context.store().list_media().await,
        }
        .map_err(|e| e.to_string())?;
        to_json(&media)
    }
}

#[derive(Debug, Deserialize)]
struct GetInput {
    filename: String,
    #[serde(default)]
    output_path: Option<String>,
}

pub struct MediaGetTool;

#[async_trait::async_trait]
impl Tool for MediaGetTool {
    fn name(&self) -> &str {
        "media_get"
    }

    fn description(&self) -> &str {
        "Describe a media file and optionally export its bytes to a local path."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "filename": { "type": "string" },
                "output_path": {
                    "type": "string",
                    "description": "Where to write the file contents."
                }
            },
            "required": ["filename"],
            "additionalProperties": false
        })
    }

    async fn execute(&self, args: Value, context: &ToolContext) -> Result<String, String> {
        let input: GetInput = parse_args(args)?;
        let (media, bytes) = context
            .store()
            .load_media(&input.filename)
            .await
            .map_err(|e| e.to_string())?;
        if let Some(path) = &input.output_path {
            tokio::fs::write(path, &bytes)
                .await
                .map_err(|e| format!("Failed to write {}: {}", path, e))?;
        }
        to_json(&json!({
            "media": media,
            "written_to": input.output_path,
        }))
    }
}

#[derive(Debug, Deserialize)]
struct DeleteInput {
    filename: String,
}

pub struct MediaDeleteTool;

#[async_trait::async_trait]
impl Tool for MediaDeleteTool {
    fn name(&self) -> &str {
        "media_delete"
    }

    fn description(&self) -> &str {
        "Delete a media file."
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
        let input: DeleteInput = parse_args(args)?;
        context
            .store()
            .delete_media(&input.filename)
            .await
            .map_err(|e| e.to_string())?;
        to_json(&json!({ "deleted": input.filename }))
    }
}
