use serde_json::{Value, json};

use super::{Tool, ToolContext, to_json};

pub struct RelationsValidateTool;

#[async_trait::async_trait]
impl Tool for RelationsValidateTool {
    fn name(&self) -> &str {
        "relations_validate"
    }

    fn description(&self) -> &str {
        "Scan every note, concept and media file for relation drift without changing anything."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {},
            "additionalProperties": false
        })
    }

    async fn execute(&self, _args: Value, context: &ToolContext) -> Result<String, String> {
        let report = context
            .store()
            .validate_relations()
            .await
            .map_err(|e| e.to_string())?;
        to_json(&report)
    }
}

pub struct RelationsRepairTool;

#[async_trait::async_trait]
impl Tool for RelationsRepairTool {
    fn name(&self) -> &str {
        "relations_repair"
    }

    fn description(&self) -> &str {
        "Fix every repairable relation issue. Broken links and orphaned media are only reported."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {},
            "additionalProperties": false
        })
    }

    async fn execute(&self, _args: Value, context: &ToolContext) -> Result<String, String> {
        let report = context
            .store()
            .repair_relations()
            .await
            .map_err(|e| e.to_string())?;
        to_json(&report)
    }
}
