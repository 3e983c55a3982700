use serde::Deserialize;
use serde_json::{Value, json};

use notegraph_store::PinKind;

use super::{Tool, ToolContext, parse_args, to_json};

#[derive(Debug, Deserialize)]
struct PinInput {
    kind: PinKind,
    name: String,
}

fn pin_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "kind": { "type": "string", "enum": ["note", "concept"] },
            "name": {
                "type": "string",
                "description": "Note filename or concept name."
            }
        },
        "required": ["kind", "name"],
        "additionalProperties": false
    })
}

pub struct PinsGetTool;

#[async_trait::async_trait]
impl Tool for PinsGetTool {
    fn name(&self) -> &str {
        "pins_get"
    }

    fn description(&self) -> &str {
        "Show pinned notes and concepts."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {},
            "additionalProperties": false
        })
    }

    async fn execute(&self, _args: Value, context: &ToolContext) -> Result<String, String> {
        let pinned = context
            .store()
            .get_pinned_items()
            .await
            .map_err(|e| e.to_string())?;
        to_json(&pinned)
    }
}

pub struct PinAddTool;

#[async_trait::async_trait]
impl Tool for PinAddTool {
    fn name(&self) -> &str {
        "pin_add"
    }

    fn description(&self) -> &str {
        "Pin an existing note or concept."
    }

    fn input_schema(&self) -> Value {
        pin_schema()
    }

    async fn execute(&self, args: Value, context: &ToolContext) -> Result<String, String> {
        let input: PinInput = parse_args(args)?;
        let pinned = context
            .store()
            .pin_item(input.kind, &input.name)
            .await
            .map_err(|e| e.to_string())?;
        to_json(&pinned)
    }
}

pub struct PinRemoveTool;

#[async_trait::async_trait]
impl Tool for PinRemoveTool {
    fn name(&self) -> &str {
        "pin_remove"
    }

    fn description(&self) -> &str {
        "Unpin a note or concept."
    }

    fn input_schema(&self) -> Value {
        pin_schema()
    }

    async fn execute(&self, args: Value, context: &ToolContext) -> Result<String, String> {
        let input: PinInput = parse_args(args)?;
        let pinned = context
            .store()
            .unpin_item(input.kind, &input.name)
            .await
            .map_err(|e| e.to_string())?;
        to_json(&pinned)
    }
}

#[derive(Debug, Deserialize)]
struct RecentInput {
    #[serde(default)]
    limit: Option<usize>,
}

pub struct NotesRecentTool;

#[async_trait::async_trait]
impl Tool for NotesRecentTool {
    fn name(&self) -> &str {
        "notes_recent"
    }

    fn description(&self) -> &str {
        "Most recently modified notes."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "limit": { "type": "integer", "minimum": 1 }
            },
            "additionalProperties": false
        })
    }

    async fn execute(&self, args: Value, context: &ToolContext) -> Result<String, String> {
        let input: RecentInput = parse_args(args)?;
        let notes = context
            .store()
            .get_recent_notes(input.limit)
            .await
            .map_err(|e| e.to_string())?;
        to_json(&notes)
    }
}
