//! Component tools.

use std::sync::Arc;

use blokgate_client::ContentApi;
use rmcp::model::Tool;
use serde_json::{Value, json};

use super::make_tool;
use crate::envelope;
use crate::registry::{ToolRegistry, ToolResult};

/// Read-only component schema listing.
pub struct ComponentTools {
    api: Arc<dyn ContentApi>,
}

impl ComponentTools {
    /// Tools backed by `api`.
    pub fn new(api: Arc<dyn ContentApi>) -> Self {
        Self { api }
    }

    /// Declarations of these tools. They do not depend on the backend.
    pub fn declarations() -> Vec<Tool> {
        vec![make_tool(
            "getComponents",
            "Get Components",
            "Get all components in Storyblok",
            json!({"type": "object", "properties": {}}),
        )]
    }
}

impl ToolRegistry for ComponentTools {
    fn tools(&self) -> Vec<Tool> {
        Self::declarations()
    }

    fn call(&self, name: &str, _args: Value) -> Option<ToolResult> {
        if name != "getComponents" {
            return None;
        }
        let api = Arc::clone(&self.api);
        Some(Box::pin(async move {
            let result = api.list_components().await;
            Ok(envelope::into_call_result(envelope::from_result(
                "components",
                result,
            )))
        }))
    }
}
