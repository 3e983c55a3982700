use serde::Deserialize;
use serde_json::{Value, json};

use notegraph_store::{IdeaInput, IdeaUpdate};

use super::{Tool, ToolContext, parse_args, to_json};

#[derive(Debug, Deserialize)]
struct CreateInput {
    content: String,
    #[serde(flatten)]
    metadata: IdeaInput,
}

pub struct IdeaCreateTool;

#[async_trait::async_trait]
impl Tool for IdeaCreateTool {
    fn name(&self) -> &str {
        "idea_create"
    }

    fn description(&self) -> &str {
        "Capture a draft idea into the inbox."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "content": { "type": "string" },
                "title": {
                    "type": "string",
                    "description": "Defaults to the first line of the content."
                },
                "concepts": { "type": "array", "items": { "type": "string" } },
                "links": { "type": "array", "items": { "type": "string" } },
                "source": { "type": "string", "description": "Where the idea came from." }
            },
            "required": ["content"],
            "additionalProperties": false
        })
    }

    async fn execute(&self, args: Value, context: &ToolContext) -> Result<String, String> {
        let input: CreateInput = parse_args(args)?;
        let idea = context
            .store()
            .create_idea(&input.content, input.metadata)
            .await
            .map_err(|e| e.to_string())?;
        to_json(&idea)
    }
}

#[derive(Debug, Deserialize)]
struct FilenameInput {
    filename: String,
}

pub struct IdeaGetTool;

#[async_trait::async_trait]
impl Tool for IdeaGetTool {
    fn name(&self) -> &str {
        "idea_get"
    }

    fn description(&self) -> &str {
        "Load an idea from the inbox."
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
        let idea = context
            .store()
            .load_idea(&input.filename)
            .await
            .map_err(|e| e.to_string())?;
        to_json(&idea)
    }
}

#[derive(Debug, Deserialize)]
struct UpdateInput {
    filename: String,
    #[serde(flatten)]
    update: IdeaUpdate,
}

pub struct IdeaUpdateTool;

#[async_trait::async_trait]
impl Tool for IdeaUpdateTool {
    fn name(&self) -> &str {
        "idea_update"
    }

    fn description(&self) -> &str {
        "Update an idea's content, title, concepts or links. Omitted fields are kept."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "filename": { "type": "string" },
                "content": { "type": "string" },
                "title": { "type": "string" },
                "concepts": { "type": "array", "items": { "type": "string" } },
                "links": { "type": "array", "items": { "type": "string" } }
            },
            "required": ["filename"],
            "additionalProperties": false
        })
    }

    async fn execute(&self, args: Value, context: &ToolContext) -> Result<String, String> {
        let input: UpdateInput = parse_args(args)?;
        let idea = context
            .store()
            .update_idea(&input.filename, input.update)
            .await
            .map_err(|e| e.to_string())?;
        to_json(&idea)
    }
}

pub struct IdeaDeleteTool;

#[async_trait::async_trait]
impl Tool for IdeaDeleteTool {
    fn name(&self) -> &str {
        "idea_delete"
    }

    fn description(&self) -> &str {
        "Delete an idea from the inbox."
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
            .delete_idea(&input.filename)
            .await
            .map_err(|e| e.to_string())?;
        to_json(&json!({ "deleted": input.filename }))
    }
}

pub struct IdeaListTool;

#[async_trait::async_trait]
impl Tool for IdeaListTool {
    fn name(&self) -> &str {
        "idea_list"
    }

    fn description(&self) -> &str {
        "List inbox ideas, most recent first."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {},
            "additionalProperties": false
        })
    }

    async fn execute(&self, _args: Value, context: &ToolContext) -> Result<String, String> {
        let ideas = context
            .store()
            .list_ideas()
            .await
            .map_err(|e| e.to_string())?;
        to_json(&ideas)
    }
}

#[derive(Debug, Deserialize)]
struct PromoteInput {
    filename: String,
    title: String,
    #[serde(default)]
    concepts: Vec<String>,
}

pub struct IdeaPromoteTool;

#[async_trait::async_trait]
impl Tool for IdeaPromoteTool {
    fn name(&self) -> &str {
        "idea_promote"
    }

    fn description(&self) -> &str {
        "Promote an idea to a permanent note. Body #concepts and @mentions are attached."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "filename": { "type": "string", "description": "Idea filename in the inbox." },
                "title": { "type": "string", "description": "Note title; the filename is its slug." },
                "concepts": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Extra concepts besides those detected in the body."
                }
            },
            "required": ["filename", "title"],
            "additionalProperties": false
        })
    }

    async fn execute(&self, args: Value, context: &ToolContext) -> Result<String, String> {
        let input: PromoteInput = parse_args(args)?;
        let note = context
            .store()
            .promote_idea_to_note(&input.filename, &input.title, &input.concepts)
            .await
            .map_err(|e| e.to_string())?;
        to_json(&note)
    }
}
