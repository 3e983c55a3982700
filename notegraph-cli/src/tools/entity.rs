use serde_json::{Value, json};

use notegraph_store::EntityRef;

use super::{Tool, ToolContext, parse_args, to_json};

pub struct EntityGetTool;

#[async_trait::async_trait]
impl Tool for EntityGetTool {
    fn name(&self) -> &str {
        "entity_get"
    }

    fn description(&self) -> &str {
        "Load an idea, note or concept. The result carries its kind."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "kind": { "type": "string", "enum": ["idea", "note", "concept"] },
                "name": {
                    "type": "string",
                    "description": "Filename for ideas and notes, name for concepts."
                }
            },
            "required": ["kind", "name"],
            "additionalProperties": false
        })
    }

    async fn execute(&self, args: Value, context: &ToolContext) -> Result<String, String> {
        let entity: EntityRef = parse_args(args)?;
        let loaded = context
            .store()
            .load_entity(&entity)
            .await
            .map_err(|e| e.to_string())?;
        to_json(&loaded)
    }
}
