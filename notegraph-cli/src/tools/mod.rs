pub mod concepts;
pub mod context;
pub mod entity;
pub mod ideas;
pub mod integrity;
pub mod manager;
pub mod media;
pub mod notes;
pub mod preferences;
pub mod relations;

pub use context::ToolContext;
pub use manager::ToolManager;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Trait that all tools must implement
#[async_trait::async_trait]
pub trait Tool: Send + Sync {
    /// Name of the tool (must match regex `^[a-z0-9_]{1,64}$`)
    fn name(&self) -> &str;

    /// Description of what the tool does
    fn description(&self) -> &str;

    /// JSON Schema for the tool's input
    fn input_schema(&self) -> Value;

    /// Execute the tool with the given arguments
    async fn execute(&self, args: Value, context: &ToolContext) -> Result<String, String>;
}

/// Deserialize tool arguments, reporting schema mismatches as tool errors.
pub(crate) fn parse_args<T: DeserializeOwned>(args: Value) -> Result<T, String> {
    serde_json::from_value(args).map_err(|e| format!("Invalid arguments: {e}"))
}

pub(crate) fn to_json<T: Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|e| e.to_string())
}
