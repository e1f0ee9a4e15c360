//! Catalog tools, one module per resource.

pub mod assets;
pub mod components;
pub mod stories;

pub use assets::AssetTools;
pub use components::ComponentTools;
pub use stories::StoryTools;

use rmcp::model::{ErrorData, JsonObject, Tool};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

fn json_schema(value: Value) -> Arc<JsonObject> {
    match value {
        Value::Object(map) => Arc::new(map),
        _ => Arc::new(JsonObject::new()),
    }
}

/// Build a `Tool` with a title and a JSON schema.
pub(crate) fn make_tool(name: &'static str, title: &str, description: &'static str, schema: Value) -> Tool {
    let mut tool = Tool::new(name, description, json_schema(schema));
    tool.title = Some(title.to_string());
    tool
}

/// Deserialize tool arguments, rejecting contract violations.
pub(crate) fn parse_args<T: DeserializeOwned>(tool: &str, args: Value) -> Result<T, ErrorData> {
    serde_json::from_value(args)
        .map_err(|e| ErrorData::invalid_params(format!("{tool}: {e}"), None))
}

/// Reject a violated contract.
pub(crate) fn invalid(tool: &str, message: impl std::fmt::Display) -> ErrorData {
    ErrorData::invalid_params(format!("{tool}: {message}"), None)
}

/// Schema fragment shared by the list operations.
pub(crate) fn list_schema(max_per_page: Option<u32>) -> Value {
    let mut per_page = serde_json::json!({
        "type": "integer",
        "minimum": 1,
        "description": "Number of items per page"
    });
    if let Some(max) = max_per_page {
        per_page["maximum"] = Value::from(max);
        per_page["description"] = Value::from(format!("Number of items per page (1-{max}, default: 25)"));
    }
    serde_json::json!({
        "type": "object",
        "properties": {
            "per_page": per_page,
            "page": {
                "type": "integer",
                "minimum": 1,
                "description": "Page number (default: 1)"
            },
            "filter_query": {
                "type": "string",
                "description": "Filter query string"
            }
        }
    })
}
