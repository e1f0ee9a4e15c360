//! Tool registry abstraction.

use futures::future::BoxFuture;
use rmcp::model::{CallToolResult, ErrorData, Tool};
use serde_json::Value;

/// Boxed future returned by [`ToolRegistry::call`].
pub type ToolResult = BoxFuture<'static, Result<CallToolResult, ErrorData>>;

/// A set of named MCP tools.
///
/// `call` returns `None` when the name is not one of this registry's tools,
/// which lets registries be chained.
pub trait ToolRegistry: Send + Sync {
    /// Declarations of every tool in this registry.
    fn tools(&self) -> Vec<Tool>;

    /// Dispatch a call. `args` is always a JSON object.
    fn call(&self, name: &str, args: Value) -> Option<ToolResult>;

    /// Number of tools.
    fn tool_count(&self) -> usize {
        self.tools().len()
    }

    /// Whether `name` is one of this registry's tools.
    fn has_tool(&self, name: &str) -> bool {
        self.tools().iter().any(|t| t.name == name)
    }
}

/// Registries tried in order.
#[derive(Default)]
pub struct CompositeRegistry {
    registries: Vec<Box<dyn ToolRegistry>>,
}

impl CompositeRegistry {
    /// Creates an empty composite.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a registry.
    pub fn add<R: ToolRegistry + 'static>(mut self, registry: R) -> Self {
        self.registries.push(Box::new(registry));
        self
    }
}

impl ToolRegistry for CompositeRegistry {
    fn tools(&self) -> Vec<Tool> {
        self.registries.iter().flat_map(|r| r.tools()).collect()
    }

    fn call(&self, name: &str, args: Value) -> Option<ToolResult> {
        self.registries.iter().find_map(|r| r.call(name, args.clone()))
    }
}
