//! Components, assets, and list parameters.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ============================================================================
// Component
// ============================================================================

/// A content type schema. Read-only from the gateway's point of view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    /// Server-assigned id.
    pub id: u64,

    /// Technical name, matched by a node's `component` discriminator.
    pub name: String,

    /// Human readable name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    /// Field schema, kept opaque.
    #[serde(default)]
    pub schema: Map<String, Value>,

    /// Whether the component may be used as a story root.
    #[serde(default)]
    pub is_root: bool,

    /// Whether the component may be nested inside other nodes.
    #[serde(default)]
    pub is_nestable: bool,

    /// Remaining server fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// ============================================================================
// Asset
// ============================================================================

/// An uploaded binary file record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    /// Server-assigned id.
    pub id: u64,

    /// Stored file name or path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,

    /// Owning space.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub space_id: Option<u64>,

    /// MIME type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,

    /// Size in bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_length: Option<u64>,

    /// Public URL.
    #[serde(default, alias = "public_url", skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Remaining server fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Raw bytes to upload as a new asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetUpload {
    /// File name reported to the CMS.
    pub filename: String,
    /// MIME type, when known.
    pub content_type: Option<String>,
    /// File contents.
    pub bytes: Vec<u8>,
}

impl AssetUpload {
    /// Create an upload with unknown content type.
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            content_type: None,
            bytes,
        }
    }

    /// Set the MIME type.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

// ============================================================================
// List parameters
// ============================================================================

/// Pagination and filtering for list operations.
///
/// Unset parameters are never sent, so the server applies its own defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListParams {
    /// Page size.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub per_page: Option<u32>,
    /// 1-based page number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    /// Filter expression, passed through verbatim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter_query: Option<String>,
}

impl ListParams {
    /// Set the page size.
    pub fn with_per_page(mut self, per_page: u32) -> Self {
        self.per_page = Some(per_page);
        self
    }

    /// Set the page number.
    pub fn with_page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    /// Set the filter expression.
    pub fn with_filter_query(mut self, filter_query: impl Into<String>) -> Self {
        self.filter_query = Some(filter_query.into());
        self
    }

    /// Query pairs for the parameters that are actually set.
    ///
    /// Zero numbers and empty filters count as unset.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(per_page) = self.per_page.filter(|n| *n > 0) {
            pairs.push(("per_page", per_page.to_string()));
        }
        if let Some(page) = self.page.filter(|n| *n > 0) {
            pairs.push(("page", page.to_string()));
        }
        if let Some(filter) = self.filter_query.as_deref().filter(|f| !f.is_empty()) {
            pairs.push(("filter_query", filter.to_string()));
        }
        pairs
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn test_query_pairs_empty_by_default() {
        assert!(ListParams::default().query_pairs().is_empty());
    }

    #[test]
    fn test_query_pairs_only_supplied() {
        let pairs = ListParams::default().with_per_page(10).query_pairs();
        assert_eq!(pairs, vec![("per_page", "10".to_string())]);
    }

    #[test]
    fn test_query_pairs_all() {
        let pairs = ListParams::default()
            .with_per_page(25)
            .with_page(2)
            .with_filter_query("component:page")
            .query_pairs();
        assert_eq!(pairs.len(), 3);
        assert_eq!(pairs[2], ("filter_query", "component:page".to_string()));
    }

    #[test]
    fn test_query_pairs_skip_blank_values() {
        let params = ListParams {
            per_page: Some(0),
            page: None,
            filter_query: Some(String::new()),
        };
        assert!(params.query_pairs().is_empty());
    }

    #[test]
    fn test_component_decodes() {
        let component: Component = serde_json::from_value(json!({
            "id": 7,
            "name": "page",
            "display_name": "Page",
            "schema": {"title": {"type": "text"}},
            "is_root": true,
            "is_nestable": false,
            "component_group_uuid": null
        }))
        .unwrap();
        assert_eq!(component.name, "page");
        assert!(component.is_root);
        assert!(component.schema.contains_key("title"));
        assert!(component.extra.contains_key("component_group_uuid"));
    }

    #[test]
    fn test_asset_accepts_public_url_alias() {
        let asset: Asset = serde_json::from_value(json!({
            "id": 9,
            "filename": "https://a.storyblok.com/f/1/x.png",
            "public_url": "https://a.storyblok.com/f/1/x.png"
        }))
        .unwrap();
        assert_eq!(asset.id, 9);
        assert!(asset.url.is_some());
    }

    #[test]
    fn test_asset_upload_builder() {
        let upload = AssetUpload::new("x.png", vec![1, 2, 3]).with_content_type("image/png");
        assert_eq!(upload.content_type.as_deref(), Some("image/png"));
        assert_eq!(upload.bytes.len(), 3);
    }

    proptest! {
        #[test]
        fn prop_omitted_params_never_sent(
            per_page in proptest::option::of(1u32..=100),
            page in proptest::option::of(1u32..1000),
            filter in proptest::option::of("[a-z:]{1,12}"),
        ) {
            let params = ListParams { per_page, page, filter_query: filter.clone() };
            let keys: Vec<_> = params.query_pairs().into_iter().map(|(k, _)| k).collect();
            prop_assert_eq!(keys.contains(&"per_page"), per_page.is_some());
            prop_assert_eq!(keys.contains(&"page"), page.is_some());
            prop_assert_eq!(keys.contains(&"filter_query"), filter.is_some());
        }
    }
}
