//! Tagged content node tree.
//!
//! A story body is an open-ended tree. Every node carries a `component`
//! discriminator naming its content type and, inside a document, a `_uid`
//! that is unique within that document. All other keys are passed through
//! untouched: the gateway only inspects the discriminator and the id.
//!
//! Nested nodes are found wherever an object with a string `component`
//! appears beneath a node, whether directly in a field, inside an array of
//! bloks, or deeper inside structured values such as rich text.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;

/// A single node of a story's content tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentNode {
    /// Content type discriminator.
    pub component: String,

    /// Document-unique node id.
    #[serde(rename = "_uid", default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,

    /// Every other field, kept opaque.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl ContentNode {
    /// Create an empty node of the given component type.
    pub fn new(component: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            uid: None,
            fields: Map::new(),
        }
    }

    /// Set the node id.
    pub fn with_uid(mut self, uid: impl Into<String>) -> Self {
        self.uid = Some(uid.into());
        self
    }

    /// Set an opaque field.
    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.fields.insert(key.into(), value);
        self
    }

    /// Nodes nested directly beneath this one.
    pub fn children(&self) -> Vec<ContentNode> {
        let mut out = Vec::new();
        for value in self.fields.values() {
            collect_nodes(value, &mut out);
        }
        out
    }

    /// Total number of nodes in this subtree, including this one.
    pub fn node_count(&self) -> usize {
        1 + self
            .children()
            .iter()
            .map(ContentNode::node_count)
            .sum::<usize>()
    }

    /// First `_uid` that appears more than once in this subtree.
    pub fn duplicate_uid(&self) -> Option<String> {
        let mut seen = HashSet::new();
        self.find_duplicate(&mut seen)
    }

    fn find_duplicate(&self, seen: &mut HashSet<String>) -> Option<String> {
        if let Some(uid) = &self.uid {
            if !seen.insert(uid.clone()) {
                return Some(uid.clone());
            }
        }
        self.children()
            .iter()
            .find_map(|child| child.find_duplicate(seen))
    }
}

/// A story body as the CMS returns it.
///
/// Well-formed trees decode as [`ContentNode`]; anything else (folders with
/// `{}` content, nodes with numeric ids) is relayed as raw JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StoryContent {
    /// A tree with a `component` discriminator at its root.
    Node(ContentNode),
    /// Any other JSON value.
    Raw(Value),
}

impl StoryContent {
    /// The root node, when the body is a well-formed tree.
    pub fn as_node(&self) -> Option<&ContentNode> {
        match self {
            Self::Node(node) => Some(node),
            Self::Raw(_) => None,
        }
    }
}

impl From<ContentNode> for StoryContent {
    fn from(node: ContentNode) -> Self {
        Self::Node(node)
    }
}

fn collect_nodes(value: &Value, out: &mut Vec<ContentNode>) {
    match value {
        Value::Object(map) if map.get("component").is_some_and(Value::is_string) => {
            if let Ok(node) = serde_json::from_value(value.clone()) {
                out.push(node);
            }
        }
        Value::Object(map) => map.values().for_each(|v| collect_nodes(v, out)),
        Value::Array(items) => items.iter().for_each(|v| collect_nodes(v, out)),
        _ => {}
    }
}
