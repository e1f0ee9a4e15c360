//! In-memory resource client for testing.

use async_trait::async_trait;
use blokgate_core::{
    Asset, AssetUpload, Component, Error, ListParams, NewStory, Result, Story, StoryPatch,
};
use chrono::Utc;
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::api::ContentApi;

/// In-memory [`ContentApi`] that behaves like a small, empty space.
///
/// Ids are assigned sequentially. Missing ids produce the same `404 Not Found`
/// error the real API reports. Clones share state.
#[derive(Clone, Default)]
pub struct MockContentApi {
    state: Arc<Mutex<MockState>>,
}

#[derive(Default)]
struct MockState {
    stories: BTreeMap<u64, Story>,
    assets: BTreeMap<u64, Asset>,
    components: Vec<Component>,
    next_id: u64,
    calls: Vec<String>,
    failure: Option<Error>,
}

impl MockState {
    fn begin(&mut self, call: &str) -> Result<()> {
        self.calls.push(call.to_string());
        match self.failure.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

fn not_found() -> Error {
    Error::api(
        404,
        "404 Not Found",
        Some("This record could not be found".to_string()),
    )
}

impl MockContentApi {
    /// Creates an empty mock space.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a mock space with the given component schemas.
    pub fn with_components(components: Vec<Component>) -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                components,
                ..MockState::default()
            })),
        }
    }

    /// Inserts a story directly, bypassing the call log.
    pub async fn insert_story(&self, story: Story) {
        let mut state = self.state.lock().await;
        state.next_id = state.next_id.max(story.id);
        state.stories.insert(story.id, story);
    }

    /// Inserts an asset directly, bypassing the call log.
    pub async fn insert_asset(&self, asset: Asset) {
        let mut state = self.state.lock().await;
        state.next_id = state.next_id.max(asset.id);
        state.assets.insert(asset.id, asset);
    }

    /// Makes the next call fail with `error`.
    pub async fn fail_next(&self, error: Error) {
        self.state.lock().await.failure = Some(error);
    }

    /// Number of calls made so far.
    pub async fn call_count(&self) -> usize {
        self.state.lock().await.calls.len()
    }

    /// Names of the calls made so far, in order.
    pub async fn calls(&self) -> Vec<String> {
        self.state.lock().await.calls.clone()
    }
}

#[async_trait]
impl ContentApi for MockContentApi {
    async fn create_story(&self, story: NewStory) -> Result<Story> {
        let mut state = self.state.lock().await;
        state.begin("create_story")?;
        let id = state.next_id();
        let now = Utc::now();
        let created = Story {
            id,
            name: story.name.to_string(),
            slug: story.slug.to_string(),
            full_slug: Some(story.slug.to_string()),
            content: Some(story.content.into()),
            parent_id: story.parent_id,
            published: Some(story.publish),
            created_at: Some(now),
            updated_at: Some(now),
            published_at: story.publish.then_some(now),
            extra: Map::new(),
        };
        state.stories.insert(id, created.clone());
        Ok(created)
    }

    async fn update_story(&self, id: u64, patch: StoryPatch) -> Result<Story> {
        let mut state = self.state.lock().await;
        state.begin("update_story")?;
        let story = state.stories.get_mut(&id).ok_or_else(not_found)?;
        if let Some(name) = patch.name {
            story.name = name.to_string();
        }
        if let Some(slug) = patch.slug {
            story.slug = slug.to_string();
        }
        if let Some(content) = patch.content {
            story.content = Some(content.into());
        }
        if let Some(parent_id) = patch.parent_id {
            story.parent_id = Some(parent_id);
        }
        let now = Utc::now();
        if patch.publish == Some(true) {
            story.published = Some(true);
            story.published_at = Some(now);
        }
        story.updated_at = Some(now);
        Ok(story.clone())
    }

    async fn delete_story(&self, id: u64) -> Result<Value> {
        let mut state = self.state.lock().await;
        state.begin("delete_story")?;
        let story = state.stories.remove(&id).ok_or_else(not_found)?;
        Ok(json!({ "story": story }))
    }

    async fn get_story(&self, id: u64) -> Result<Story> {
        let mut state = self.state.lock().await;
        state.begin("get_story")?;
        state.stories.get(&id).cloned().ok_or_else(not_found)
    }

    async fn list_stories(&self, params: ListParams) -> Result<Vec<Story>> {
        let mut state = self.state.lock().await;
        state.begin("list_stories")?;
        Ok(paginate(state.stories.values().cloned().collect(), &params))
    }

    async fn list_components(&self) -> Result<Vec<Component>> {
        let mut state = self.state.lock().await;
        state.begin("list_components")?;
        Ok(state.components.clone())
    }

    async fn list_assets(&self, params: ListParams) -> Result<Vec<Asset>> {
        let mut state = self.state.lock().await;
        state.begin("list_assets")?;
        Ok(paginate(state.assets.values().cloned().collect(), &params))
    }

    async fn get_asset(&self, id: u64) -> Result<Asset> {
        let mut state = self.state.lock().await;
        state.begin("get_asset")?;
        state.assets.get(&id).cloned().ok_or_else(not_found)
    }

    async fn delete_asset(&self, id: u64) -> Result<Value> {
        let mut state = self.state.lock().await;
        state.begin("delete_asset")?;
        let asset = state.assets.remove(&id).ok_or_else(not_found)?;
        Ok(serde_json::to_value(asset)?)
    }

    async fn upload_asset(&self, upload: AssetUpload) -> Result<Asset> {
        let mut state = self.state.lock().await;
        state.begin("upload_asset")?;
        let id = state.next_id();
        let asset = Asset {
            id,
            filename: Some(upload.filename),
            space_id: None,
            content_type: upload.content_type,
            content_length: u64::try_from(upload.bytes.len()).ok(),
            url: None,
            extra: Map::new(),
        };
        state.assets.insert(id, asset.clone());
        Ok(asset)
    }

    async fn upload_asset_from_url(&self, file_url: &str) -> Result<Asset> {
        let filename = file_url
            .rsplit('/')
            .next()
            .filter(|s| !s.is_empty())
            .unwrap_or(crate::source::DEFAULT_FILENAME)
            .to_string();
        self.upload_asset(AssetUpload::new(filename, Vec::new()))
            .await
    }

    async fn finish_upload(&self, id: u64) -> Result<Value> {
        let mut state = self.state.lock().await;
        state.begin("finish_upload")?;
        let asset = state.assets.get(&id).ok_or_else(not_found)?;
        Ok(serde_json::to_value(asset)?)
    }
}

fn paginate<T>(items: Vec<T>, params: &ListParams) -> Vec<T> {
    let per_page = params.per_page.filter(|n| *n > 0).unwrap_or(25) as usize;
    let page = params.page.filter(|n| *n > 0).unwrap_or(1) as usize;
    items
        .into_iter()
        .skip((page - 1) * per_page)
        .take(per_page)
        .collect()
}
