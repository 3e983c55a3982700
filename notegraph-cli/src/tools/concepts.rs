use serde::Deserialize;
use serde_json::{Value, json};

use super::{Tool, ToolContext, parse_args, to_json};

#[derive(Debug, Deserialize)]
struct NameInput {
    name: String,
}

#[derive(Debug, Deserialize)]
struct CreateInput {
    name: String,
    #[serde(default)]
    content: String,
}

pub struct ConceptCreateTool;

#[async_trait::async_trait]
impl Tool for ConceptCreateTool {
    fn name(&self) -> &str {
        "concept_create"
    }

    fn description(&self) -> &str {
        "Create a concept. Fails if it already exists."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "name": {
                    "type": "string",
                    "description": "Letters, digits, hyphen and underscore only."
                },
                "content": { "type": "string" }
            },
            "required": ["name"],
            "additionalProperties": false
        })
    }

    async fn execute(&self, args: Value, context: &ToolContext) -> Result<String, String> {
        let input: CreateInput = parse_args(args)?;
        let concept = context
            .store()
            .create_concept(&input.name, &input.content)
            .await
            .map_err(|e| e.to_string())?;
        to_json(&concept)
    }
}

pub struct ConceptGetTool;

#[async_trait::async_trait]
impl Tool for ConceptGetTool {
    fn name(&self) -> &str {
        "concept_get"
    }

    fn description(&self) -> &str {
        "Load a concept with its linked notes and related concepts."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "name": { "type": "string" }
            },
            "required": ["name"],
            "additionalProperties": false
        })
    }

    async fn execute(&self, args: Value, context: &ToolContext) -> Result<String, String> {
        let input: NameInput = parse_args(args)?;
        let concept = context
            .store()
            .get_concept(&input.name)
            .await
            .map_err(|e| e.to_string())?;
        to_json(&concept)
    }
}

#[derive(Debug, Deserialize)]
struct SaveInput {
    name: String,
    content: String,
    #[serde(default)]
    related_concepts: Option<Vec<String>>,
}

pub struct ConceptSaveTool;

#[async_trait::async_trait]
impl Tool for ConceptSaveTool {
    fn name(&self) -> &str {
        "concept_save"
    }

    fn description(&self) -> &str {
        "Write concept content. When related_concepts is given it replaces the relation set."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "name": { "type": "string" },
                "content": { "type": "string" },
                "related_concepts": {
                    "type": "array",
                    "items": { "type": "string" }
                }
            },
            "required": ["name", "content"],
            "additionalProperties": false
        })
    }

    async fn execute(&self, args: Value, context: &ToolContext) -> Result<String, String> {
        let input: SaveInput = parse_args(args)?;
        let concept = context
            .store()
            .save_concept(&input.name, &input.content, input.related_concepts)
            .await
            .map_err(|e| e.to_string())?;
        to_json(&concept)
    }
}

pub struct ConceptDeleteTool;

#[async_trait::async_trait]
impl Tool for ConceptDeleteTool {
    fn name(&self) -> &str {
        "concept_delete"
    }

    fn description(&self) -> &str {
        "Delete a concept. Refused while any note still references it."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "name": { "type": "string" }
            },
            "required": ["name"],
            "additionalProperties": false
        })
    }

    async fn execute(&self, args: Value, context: &ToolContext) -> Result<String, String> {
        let input: NameInput = parse_args(args)?;
        context
            .store()
            .delete_concept(&input.name)
            .await
            .map_err(|e| e.to_string())?;
        to_json(&json!({ "deleted": input.name }))
    }
}

pub struct ConceptListTool;

#[async_trait::async_trait]
impl Tool for ConceptListTool {
    fn name(&self) -> &str {
        "concept_list"
    }

    fn description(&self) -> &str {
        "List all concepts by name."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {},
            "additionalProperties": false
        })
    }

    async fn execute(&self, _args: Value, context: &ToolContext) -> Result<String, String> {
        let concepts = context
            .store()
            .list_concepts()
            .await
            .map_err(|e| e.to_string())?;
        to_json(&concepts)
    }
}
