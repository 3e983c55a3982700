//! Tools that add or remove a single bidirectional edge.

use serde::Deserialize;
use serde_json::{Value, json};

use super::{Tool, ToolContext, parse_args, to_json};

#[derive(Debug, Deserialize)]
struct NoteConceptInput {
    note: String,
    concept: String,
}

fn note_concept_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "note": { "type": "string", "description": "Note filename." },
            "concept": { "type": "string", "description": "Concept name." }
        },
        "required": ["note", "concept"],
        "additionalProperties": false
    })
}

pub struct NoteConceptAddTool;

#[async_trait::async_trait]
impl Tool for NoteConceptAddTool {
    fn name(&self) -> &str {
        "note_concept_add"
    }

    fn description(&self) -> &str {
        "Tag a note with a concept, creating the concept if needed."
    }

    fn input_schema(&self) -> Value {
        note_concept_schema()
    }

    async fn execute(&self, args: Value, context: &ToolContext) -> Result<String, String> {
        let input: NoteConceptInput = parse_args(args)?;
        context
            .store()
            .add_note_concept(&input.note, &input.concept)
            .await
            .map_err(|e| e.to_string())?;
        to_json(&json!({ "added": { "note": input.note, "concept": input.concept } }))
    }
}

pub struct NoteConceptRemoveTool;

#[async_trait::async_trait]
impl Tool for NoteConceptRemoveTool {
    fn name(&self) -> &str {
        "note_concept_remove"
    }

    fn description(&self) -> &str {
        "Remove a concept tag from a note."
    }

    fn input_schema(&self) -> Value {
        note_concept_schema()
    }

    async fn execute(&self, args: Value, context: &ToolContext) -> Result<String, String> {
        let input: NoteConceptInput = parse_args(args)?;
        context
            .store()
            .remove_note_concept(&input.note, &input.concept)
            .await
            .map_err(|e| e.to_string())?;
        to_json(&json!({ "removed": { "note": input.note, "concept": input.concept } }))
    }
}

#[derive(Debug, Deserialize)]
struct NoteLinkInput {
    source: String,
    target: String,
}

fn note_link_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "source": { "type": "string", "description": "Linking note filename." },
            "target": {
                "type": "string",
                "description": "Target filename, bare name or title."
            }
        },
        "required": ["source", "target"],
        "additionalProperties": false
    })
}

pub struct NoteLinkAddTool;

#[async_trait::async_trait]
impl Tool for NoteLinkAddTool {
    fn name(&self) -> &str {
        "note_link_add"
    }

    fn description(&self) -> &str {
        "Link one note to another and record the backlink on the target."
    }

    fn input_schema(&self) -> Value {
        note_link_schema()
    }

    async fn execute(&self, args: Value, context: &ToolContext) -> Result<String, String> {
        let input: NoteLinkInput = parse_args(args)?;
        context
            .store()
            .add_note_link(&input.source, &input.target)
            .await
            .map_err(|e| e.to_string())?;
        to_json(&json!({ "added": { "source": input.source, "target": input.target } }))
    }
}

pub struct NoteLinkRemoveTool;

#[async_trait::async_trait]
impl Tool for NoteLinkRemoveTool {
    fn name(&self) -> &str {
        "note_link_remove"
    }

    fn description(&self) -> &str {
        "Remove a link and the matching backlink."
    }

    fn input_schema(&self) -> Value {
        note_link_schema()
    }

    async fn execute(&self, args: Value, context: &ToolContext) -> Result<String, String> {
        let input: NoteLinkInput = parse_args(args)?;
        context
            .store()
            .remove_note_link(&input.source, &input.target)
            .await
            .map_err(|e| e.to_string())?;
        to_json(&json!({ "removed": { "source": input.source, "target": input.target } }))
    }
}

#[derive(Debug, Deserialize)]
struct ConceptPairInput {
    concept: String,
    related: String,
}

fn concept_pair_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "concept": { "type": "string" },
            "related": { "type": "string" }
        },
        "required": ["concept", "related"],
        "additionalProperties": false
    })
}

pub struct ConceptRelationAddTool;

#[async_trait::async_trait]
impl Tool for ConceptRelationAddTool {
    fn name(&self) -> &str {
        "concept_relation_add"
    }

    fn description(&self) -> &str {
        "Relate two concepts symmetrically, creating either if needed."
    }

    fn input_schema(&self) -> Value {
        concept_pair_schema()
    }

    async fn execute(&self, args: Value, context: &ToolContext) -> Result<String, String> {
        let input: ConceptPairInput = parse_args(args)?;
        context
            .store()
            .add_concept_relation(&input.concept, &input.related)
            .await
            .map_err(|e| e.to_string())?;
        to_json(&json!({ "added": [input.concept, input.related] }))
    }
}

pub struct ConceptRelationRemoveTool;

#[async_trait::async_trait]
impl Tool for ConceptRelationRemoveTool {
    fn name(&self) -> &str {
        "concept_relation_remove"
    }

    fn description(&self) -> &str {
        "Remove a relation between two concepts on both sides."
    }

    fn input_schema(&self) -> Value {
        concept_pair_schema()
    }

    async fn execute(&self, args: Value, context: &ToolContext) -> Result<String, String> {
        let input: ConceptPairInput = parse_args(args)?;
        context
            .store()
            .remove_concept_relation(&input.concept, &input.related)
            .await
            .map_err(|e| e.to_string())?;
        to_json(&json!({ "removed": [input.concept, input.related] }))
    }
}
