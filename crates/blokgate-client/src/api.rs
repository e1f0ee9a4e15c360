//! Resource client abstraction.

use async_trait::async_trait;
use blokgate_core::{Asset, AssetUpload, Component, ListParams, NewStory, Result, Story, StoryPatch};
use serde_json::Value;

/// Abstraction over the CMS's space-scoped resource tree.
///
/// Each method is a single stateless round trip, except
/// [`upload_asset_from_url`](ContentApi::upload_asset_from_url), which first
/// downloads the source file. No method retries.
#[async_trait]
pub trait ContentApi: Send + Sync {
    /// Create a story. The server assigns id and timestamps.
    async fn create_story(&self, story: NewStory) -> Result<Story>;

    /// Apply a partial update. An empty patch is still sent.
    async fn update_story(&self, id: u64, patch: StoryPatch) -> Result<Story>;

    /// Delete a story, returning the server's response body.
    async fn delete_story(&self, id: u64) -> Result<Value>;

    /// Fetch a single story.
    async fn get_story(&self, id: u64) -> Result<Story>;

    /// List stories.
    async fn list_stories(&self, params: ListParams) -> Result<Vec<Story>>;

    /// List component schemas.
    async fn list_components(&self) -> Result<Vec<Component>>;

    /// List assets.
    async fn list_assets(&self, params: ListParams) -> Result<Vec<Asset>>;

    /// Fetch a single asset.
    async fn get_asset(&self, id: u64) -> Result<Asset>;

    /// Delete an asset, returning the server's response body.
    async fn delete_asset(&self, id: u64) -> Result<Value>;

    /// Upload raw bytes as a new, pending asset.
    async fn upload_asset(&self, upload: AssetUpload) -> Result<Asset>;

    /// Download `file_url` and upload it as a new, pending asset.
    ///
    /// Fails with a source fetch error, without contacting the CMS, when the
    /// download does not succeed.
    async fn upload_asset_from_url(&self, file_url: &str) -> Result<Asset>;

    /// Complete processing of a pending asset.
    async fn finish_upload(&self, id: u64) -> Result<Value>;
}
