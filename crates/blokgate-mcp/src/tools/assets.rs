//! Asset tools.

use std::sync::Arc;

use blokgate_client::ContentApi;
use blokgate_core::ListParams;
use rmcp::model::Tool;
use serde::Deserialize;
use serde_json::{Value, json};

use super::{invalid, list_schema, make_tool, parse_args};
use crate::envelope;
use crate::registry::{ToolRegistry, ToolResult};

/// Arguments for `getAssets`.
#[derive(Debug, Default, Deserialize)]
pub struct ListAssetsArgs {
    /// Page size.
    pub per_page: Option<u32>,
    /// Page number.
    pub page: Option<u32>,
    /// Filter expression.
    pub filter_query: Option<String>,
}

impl From<ListAssetsArgs> for ListParams {
    fn from(args: ListAssetsArgs) -> Self {
        ListParams {
            per_page: args.per_page,
            page: args.page,
            filter_query: args.filter_query,
        }
    }
}

/// Arguments for tools addressing one asset.
#[derive(Debug, Deserialize)]
pub struct AssetIdArgs {
    /// Asset id.
    #[serde(rename = "assetId")]
    pub asset_id: u64,
}

/// Arguments for `uploadAsset`.
#[derive(Debug, Deserialize)]
pub struct UploadAssetArgs {
    /// Public URL of the file to upload.
    #[serde(rename = "fileUrl")]
    pub file_url: String,
}

/// Asset operations: list, get, delete, upload from URL, finish upload.
pub struct AssetTools {
    api: Arc<dyn ContentApi>,
}

impl AssetTools {
    /// Tools backed by `api`.
    pub fn new(api: Arc<dyn ContentApi>) -> Self {
        Self { api }
    }
}

fn asset_id_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "assetId": {"type": "integer", "minimum": 0, "description": "Asset ID"}
        },
        "required": ["assetId"]
    })
}

fn is_http_url(value: &str) -> bool {
    let lower = value.trim_start().to_ascii_lowercase();
    ["http://", "https://"]
        .iter()
        .any(|scheme| lower.len() > scheme.len() && lower.starts_with(scheme))
}

impl AssetTools {
    /// Declarations of these tools. They do not depend on the backend.
    pub fn declarations() -> Vec<Tool> {
        vec![
            make_tool(
                "getAssets",
                "Get Assets",
                "Get all assets from Storyblok",
                list_schema(None),
            ),
            make_tool(
                "getAsset",
                "Get Asset",
                "Get an asset from Storyblok",
                asset_id_schema(),
            ),
            make_tool(
                "deleteAsset",
                "Delete Asset",
                "Delete an asset from Storyblok",
                asset_id_schema(),
            ),
            make_tool(
                "uploadAsset",
                "Upload Asset",
                "Upload an asset to Storyblok from URL",
                json!({
                    "type": "object",
                    "properties": {
                        "fileUrl": {
                            "type": "string",
                            "format": "uri",
                            "description": "Public URL of the file to upload"
                        }
                    },
                    "required": ["fileUrl"]
                }),
            ),
            make_tool(
                "finishUpload",
                "Finish Upload",
                "Finish uploading an asset to Storyblok",
                asset_id_schema(),
            ),
        ]
    }
}

impl ToolRegistry for AssetTools {
    fn tools(&self) -> Vec<Tool> {
        Self::declarations()
    }

    fn call(&self, name: &str, args: Value) -> Option<ToolResult> {
        let api = Arc::clone(&self.api);

        match name {
            "getAssets" => Some(Box::pin(async move {
                let params: ListParams = parse_args::<ListAssetsArgs>("getAssets", args)?.into();
                let result = api.list_assets(params).await;
                Ok(envelope::into_call_result(envelope::from_result("assets", result)))
            })),
            "getAsset" => Some(Box::pin(async move {
                let id = parse_args::<AssetIdArgs>("getAsset", args)?.asset_id;
                let result = api.get_asset(id).await;
                Ok(envelope::into_call_result(envelope::from_result("asset", result)))
            })),
            "deleteAsset" => Some(Box::pin(async move {
                let id = parse_args::<AssetIdArgs>("deleteAsset", args)?.asset_id;
                let env = match api.delete_asset(id).await {
                    Ok(_) => envelope::confirmation(format!("Asset {id} deleted successfully")),
                    Err(err) => envelope::failure(err.to_string()),
                };
                Ok(envelope::into_call_result(env))
            })),
            "uploadAsset" => Some(Box::pin(async move {
                let url = parse_args::<UploadAssetArgs>("uploadAsset", args)?.file_url;
                if !is_http_url(&url) {
                    return Err(invalid("uploadAsset", "fileUrl must be an http(s) URL"));
                }
                let result = api.upload_asset_from_url(&url).await;
                Ok(envelope::into_call_result(envelope::from_result("asset", result)))
            })),
            "finishUpload" => Some(Box::pin(async move {
                let id = parse_args::<AssetIdArgs>("finishUpload", args)?.asset_id;
                let result = api.finish_upload(id).await;
                Ok(envelope::into_call_result(envelope::from_result("asset", result)))
            })),
            _ => None,
        }
    }
}
