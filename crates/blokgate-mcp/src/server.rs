//! MCP server handler.

use std::sync::Arc;
use std::time::Duration;

use blokgate_client::{ContentApi, DEFAULT_TIMEOUT, StoryblokClient};
use blokgate_core::credentials::{ExplicitSource, MetadataSource};
use blokgate_core::{CredentialField, CredentialResolver, Error, SpaceContext};
use rmcp::model::{
    CallToolRequestParams, CallToolResult, ErrorData, Implementation, ListToolsResult,
    PaginatedRequestParams, ProtocolVersion, ServerCapabilities, ServerInfo,
};
use rmcp::service::RequestContext;
use rmcp::{RoleServer, ServerHandler};
use serde_json::Value;

use crate::catalog::{Catalog, unknown_tool};
use crate::envelope;
use crate::registry::ToolRegistry;

const INSTRUCTIONS: &str = "\
Tools for the Storyblok Management API of one space.
Every tool answers with {success: true, <key>: payload} or {success: false, message}.
Stories: createStory, updateStory, deleteStory, getStory, listStories.
Components (read-only): getComponents.
Assets: getAssets, getAsset, deleteAsset, uploadAsset (from a public URL), finishUpload.
Slugs use lowercase letters, digits and hyphens. Content is a tree of nodes, each with a \
`component` name and a document-unique `_uid`.";

/// Serves the operation catalog over MCP.
///
/// Clones share the catalog. When the transport carries `x-storyblok-*`
/// headers, the call runs against a one-off client whose credentials layer
/// those headers above the server's own. Such headers must carry an access
/// token.
#[derive(Clone)]
pub struct BlokgateServer {
    catalog: Arc<Catalog>,
    context: Option<SpaceContext>,
    timeout: Duration,
}

impl BlokgateServer {
    /// Server talking to the space described by `context`.
    pub fn from_context(context: SpaceContext, timeout: Duration) -> blokgate_core::Result<Self> {
        let client = StoryblokClient::with_timeout(context.clone(), timeout)?;
        Ok(Self {
            catalog: Arc::new(Catalog::new(Arc::new(client))),
            context: Some(context),
            timeout,
        })
    }

    /// Server over an arbitrary resource client.
    pub fn with_api(api: Arc<dyn ContentApi>) -> Self {
        Self {
            catalog: Arc::new(Catalog::new(api)),
            context: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// The default catalog.
    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    /// Catalog for one call, honouring per-call credential metadata.
    ///
    /// Metadata that names a space or API base must bring its own access
    /// token; fields it leaves out fall back to the server's.
    pub fn catalog_for(
        &self,
        metadata: Option<MetadataSource>,
    ) -> blokgate_core::Result<Arc<Catalog>> {
        let Some(metadata) = metadata.filter(MetadataSource::has_credentials) else {
            return Ok(Arc::clone(&self.catalog));
        };
        // The server's token only ever goes to the server's own space and base.
        if !metadata.has(CredentialField::AccessToken) {
            return Err(Error::config(format!(
                "per-call access token ({}) is required to override the space id or API base",
                CredentialField::AccessToken.header()
            )));
        }

        let mut resolver = CredentialResolver::new().with_source(metadata);
        if let Some(context) = &self.context {
            resolver = resolver.with_source(ExplicitSource::from_context("server", context));
        }
        let context = resolver.resolve()?;
        tracing::debug!(space_id = context.space_id(), "per-call credentials");

        let client = StoryblokClient::with_timeout(context, self.timeout)?;
        Ok(Arc::new(Catalog::new(Arc::new(client))))
    }
}

#[cfg(feature = "http")]
fn request_metadata(context: &RequestContext<RoleServer>) -> Option<MetadataSource> {
    let parts = context.extensions.get::<axum::http::request::Parts>()?;
    let pairs = parts.headers.iter().filter_map(|(name, value)| {
        value
            .to_str()
            .ok()
            .map(|v| (name.as_str().to_string(), v.to_string()))
    });
    Some(MetadataSource::from_pairs(pairs))
}

#[cfg(not(feature = "http"))]
fn request_metadata(_context: &RequestContext<RoleServer>) -> Option<MetadataSource> {
    None
}

impl ServerHandler for BlokgateServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo::new(ServerCapabilities::builder().enable_tools().build())
            .with_protocol_version(ProtocolVersion::LATEST)
            .with_server_info(
                Implementation::new("blokgate", env!("CARGO_PKG_VERSION")).with_title("Blokgate"),
            )
            .with_instructions(INSTRUCTIONS)
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, ErrorData> {
        Ok(ListToolsResult::with_all_items(self.catalog.tools()))
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParams,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        let name = request.name.to_string();
        let args = request
            .arguments
            .map(Value::Object)
            .unwrap_or_else(|| Value::Object(Default::default()));

        let catalog = match self.catalog_for(request_metadata(&context)) {
            Ok(catalog) => catalog,
            Err(err) => {
                tracing::warn!(tool = %name, error = %err, "credential override rejected");
                return Ok(envelope::into_call_result(envelope::failure(err.to_string())));
            }
        };

        tracing::debug!(tool = %name, "tool call");
        let future = catalog.call(&name, args).ok_or_else(|| unknown_tool(&name))?;
        future.await
    }
}
