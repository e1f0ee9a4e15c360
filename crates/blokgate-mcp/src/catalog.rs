//! The operation catalog: every tool Blokgate exposes.

use std::sync::Arc;

use blokgate_client::ContentApi;
use rmcp::model::{ErrorData, Tool};
use serde_json::Value;

use crate::registry::{CompositeRegistry, ToolRegistry, ToolResult};
use crate::tools::{AssetTools, ComponentTools, StoryTools};

/// Story, component and asset tools over one resource client.
pub struct Catalog {
    tools: CompositeRegistry,
}

impl Catalog {
    /// Builds the full catalog over `api`.
    pub fn new(api: Arc<dyn ContentApi>) -> Self {
        let tools = CompositeRegistry::new()
            .add(StoryTools::new(Arc::clone(&api)))
            .add(ComponentTools::new(Arc::clone(&api)))
            .add(AssetTools::new(api));
        Self { tools }
    }

    /// Every tool declaration, without a backend.
    pub fn declarations() -> Vec<Tool> {
        [
            StoryTools::declarations(),
            ComponentTools::declarations(),
            AssetTools::declarations(),
        ]
        .concat()
    }

    /// Invokes `name` and returns the Result Envelope.
    ///
    /// Unknown tools and contract violations are protocol errors; every
    /// client failure is already folded into the envelope.
    pub async fn invoke(&self, name: &str, args: Value) -> Result<Value, ErrorData> {
        let future = self
            .call(name, normalize_args(args))
            .ok_or_else(|| unknown_tool(name))?;
        let result = future.await?;
        result
            .structured_content
            .ok_or_else(|| ErrorData::internal_error(format!("{name} produced no envelope"), None))
    }
}

impl ToolRegistry for Catalog {
    fn tools(&self) -> Vec<Tool> {
        self.tools.tools()
    }

    fn call(&self, name: &str, args: Value) -> Option<ToolResult> {
        self.tools.call(name, args)
    }
}

/// Treats absent arguments as an empty object.
pub fn normalize_args(args: Value) -> Value {
    match args {
        Value::Null => Value::Object(Default::default()),
        other => other,
    }
}

/// Protocol error for a tool name the catalog does not know.
pub fn unknown_tool(name: &str) -> ErrorData {
    ErrorData::invalid_params(format!("Unknown tool: {name}"), None)
}
