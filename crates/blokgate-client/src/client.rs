//! Storyblok Management API client.

use std::time::Duration;

use async_trait::async_trait;
use blokgate_core::{
    Asset, AssetUpload, Component, Error, ListParams, NewStory, Result, SpaceContext, Story,
    StoryPatch,
};
use reqwest::multipart::{Form, Part};
use reqwest::{Method, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::api::ContentApi;
use crate::response::{read_response, transport_reason};
use crate::source::fetch_source;

/// Per-request timeout used by [`StoryblokClient::new`].
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

// ============================================================================
// Wire types
// ============================================================================

#[derive(Serialize)]
struct StoryRequest<'a, T: Serialize> {
    story: &'a T,
    #[serde(skip_serializing_if = "Option::is_none")]
    publish: Option<u8>,
}

#[derive(Deserialize)]
struct StoryEnvelope {
    story: Story,
}

#[derive(Deserialize)]
struct StoriesEnvelope {
    #[serde(default)]
    stories: Vec<Story>,
}

#[derive(Deserialize)]
struct ComponentsEnvelope {
    #[serde(default)]
    components: Vec<Component>,
}

#[derive(Deserialize)]
struct AssetsEnvelope {
    #[serde(default)]
    assets: Vec<Asset>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum AssetBody {
    Wrapped { asset: Asset },
    Bare(Asset),
}

impl From<AssetBody> for Asset {
    fn from(body: AssetBody) -> Self {
        match body {
            AssetBody::Wrapped { asset } | AssetBody::Bare(asset) => asset,
        }
    }
}

enum Body {
    Empty,
    Json(Value),
    Multipart(Form),
}

// ============================================================================
// StoryblokClient
// ============================================================================

/// Authenticated client for one Storyblok space.
#[derive(Debug, Clone)]
pub struct StoryblokClient {
    context: SpaceContext,
    http: reqwest::Client,
    fetcher: reqwest::Client,
}

impl StoryblokClient {
    /// Creates a client with the default timeout.
    pub fn new(context: SpaceContext) -> Result<Self> {
        Self::with_timeout(context, DEFAULT_TIMEOUT)
    }

    /// Creates a client whose requests, including source downloads, are
    /// bounded by `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the API base is not a valid URL or the
    /// HTTP client cannot be built.
    pub fn with_timeout(context: SpaceContext, timeout: Duration) -> Result<Self> {
        Url::parse(context.api_base())
            .map_err(|e| Error::config(format!("invalid API base '{}': {e}", context.api_base())))?;

        let build = || {
            reqwest::Client::builder()
                .timeout(timeout)
                .user_agent(concat!("blokgate/", env!("CARGO_PKG_VERSION")))
                .build()
                .map_err(|e| Error::config(format!("failed to build HTTP client: {e}")))
        };

        Ok(Self {
            context,
            http: build()?,
            fetcher: build()?,
        })
    }

    /// The space this client talks to.
    pub fn context(&self) -> &SpaceContext {
        &self.context
    }

    /// Full URL for a space-scoped resource path.
    pub fn endpoint(&self, path: &str, query: &[(&'static str, String)]) -> Result<Url> {
        let raw = format!(
            "{}/spaces/{}{}",
            self.context.api_base(),
            self.context.space_id(),
            path
        );
        let mut url =
            Url::parse(&raw).map_err(|e| Error::config(format!("invalid URL '{raw}': {e}")))?;
        if !query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(query.iter().map(|(k, v)| (*k, v.as_str())));
        }
        Ok(url)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: &[(&'static str, String)],
        body: Body,
    ) -> Result<T> {
        let url = self.endpoint(path, query)?;
        tracing::debug!(%method, path, "storyblok request");

        let request = self
            .http
            .request(method.clone(), url)
            .bearer_auth(self.context.access_token());
        let request = match body {
            Body::Empty => request,
            Body::Json(value) => request.json(&value),
            Body::Multipart(form) => request.multipart(form),
        };

        let response = request.send().await.map_err(|e| {
            let what = if e.is_timeout() {
                format!("{method} {path} timed out")
            } else {
                format!("{method} {path} failed: {}", transport_reason(&e))
            };
            Error::network_with_source(what, e)
        })?;

        let result = read_response(response).await;
        if let Err(err) = &result {
            tracing::warn!(%method, path, error = %err, "storyblok request failed");
        }
        result
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&'static str, String)]) -> Result<T> {
        self.send(Method::GET, path, query, Body::Empty).await
    }
}

#[async_trait]
impl ContentApi for StoryblokClient {
    async fn create_story(&self, story: NewStory) -> Result<Story> {
        let body = serde_json::to_value(StoryRequest {
            story: &story,
            publish: Some(u8::from(story.publish)),
        })?;
        let envelope: StoryEnvelope = self
            .send(Method::POST, "/stories", &[], Body::Json(body))
            .await?;
        Ok(envelope.story)
    }

    async fn update_story(&self, id: u64, patch: StoryPatch) -> Result<Story> {
        let body = serde_json::to_value(StoryRequest {
            story: &patch,
            publish: patch.publish.map(u8::from),
        })?;
        let envelope: StoryEnvelope = self
            .send(Method::PUT, &format!("/stories/{id}"), &[], Body::Json(body))
            .await?;
        Ok(envelope.story)
    }

    async fn delete_story(&self, id: u64) -> Result<Value> {
        self.send(Method::DELETE, &format!("/stories/{id}"), &[], Body::Empty)
            .await
    }

    async fn get_story(&self, id: u64) -> Result<Story> {
        let envelope: StoryEnvelope = self.get(&format!("/stories/{id}"), &[]).await?;
        Ok(envelope.story)
    }

    async fn list_stories(&self, params: ListParams) -> Result<Vec<Story>> {
        let envelope: StoriesEnvelope = self.get("/stories", &params.query_pairs()).await?;
        Ok(envelope.stories)
    }

    async fn list_components(&self) -> Result<Vec<Component>> {
        let envelope: ComponentsEnvelope = self.get("/components", &[]).await?;
        Ok(envelope.components)
    }

    async fn list_assets(&self, params: ListParams) -> Result<Vec<Asset>> {
        let envelope: AssetsEnvelope = self.get("/assets", &params.query_pairs()).await?;
        Ok(envelope.assets)
    }

    async fn get_asset(&self, id: u64) -> Result<Asset> {
        let body: AssetBody = self.get(&format!("/assets/{id}"), &[]).await?;
        Ok(body.into())
    }

    async fn delete_asset(&self, id: u64) -> Result<Value> {
        self.send(Method::DELETE, &format!("/assets/{id}"), &[], Body::Empty)
            .await
    }

    async fn upload_asset(&self, upload: AssetUpload) -> Result<Asset> {
        let AssetUpload {
            filename,
            content_type,
            bytes,
        } = upload;

        let mut part = Part::bytes(bytes).file_name(filename.clone());
        if let Some(content_type) = content_type {
            part = part.mime_str(&content_type).map_err(|e| {
                Error::validation(format!("invalid content type '{content_type}': {e}"))
            })?;
        }
        let form = Form::new().text("filename", filename).part("file", part);

        let body: AssetBody = self
            .send(Method::POST, "/assets", &[], Body::Multipart(form))
            .await?;
        Ok(body.into())
    }

    async fn upload_asset_from_url(&self, file_url: &str) -> Result<Asset> {
        let upload = fetch_source(&self.fetcher, file_url).await?;
        self.upload_asset(upload).await
    }

    async fn finish_upload(&self, id: u64) -> Result<Value> {
        self.get(&format!("/assets/{id}/finish_upload"), &[]).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use blokgate_core::{ContentNode, ErrorKind, Slug, StoryContent, StoryName};
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param, query_param_is_missing};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> StoryblokClient {
        let ctx = SpaceContext::new("123", "test-token", server.uri()).unwrap();
        StoryblokClient::new(ctx).unwrap()
    }

    fn story_json(id: u64, slug: &str) -> Value {
        json!({
            "id": id,
            "name": "Home",
            "slug": slug,
            "content": {"component": "page", "_uid": "root"},
            "created_at": "2024-05-03T12:00:00.000Z"
        })
    }

    #[test]
    fn test_client_construction() {
        let ctx = SpaceContext::new("123", "tok", "https://mapi.storyblok.com/v1").unwrap();
        let client = StoryblokClient::new(ctx).unwrap();
        assert_eq!(client.context().space_id(), "123");
    }

    #[test]
    fn test_invalid_api_base_rejected() {
        let ctx = SpaceContext::new("123", "tok", "not a url").unwrap();
        let err = StoryblokClient::new(ctx).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
    }

    #[test]
    fn test_endpoint_layout() {
        let ctx = SpaceContext::new("123", "tok", "https://mapi.storyblok.com/v1/").unwrap();
        let client = StoryblokClient::new(ctx).unwrap();
        let url = client.endpoint("/assets/9/finish_upload", &[]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://mapi.storyblok.com/v1/spaces/123/assets/9/finish_upload"
        );
        assert!(url.query().is_none());
    }

    #[test]
    fn test_endpoint_query_only_supplied() {
        let ctx = SpaceContext::new("123", "tok", "https://mapi.storyblok.com/v1").unwrap();
        let client = StoryblokClient::new(ctx).unwrap();
        let params = ListParams::default().with_per_page(10);
        let url = client.endpoint("/stories", &params.query_pairs()).unwrap();
        assert_eq!(url.query(), Some("per_page=10"));

        let params = ListParams::default().with_filter_query("a b&c");
        let url = client.endpoint("/stories", &params.query_pairs()).unwrap();
        assert_eq!(url.query(), Some("filter_query=a+b%26c"));
    }

    #[tokio::test]
    async fn test_create_story_wire_format() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/spaces/123/stories"))
            .and(header("authorization", "Bearer test-token"))
            .and(header("content-type", "application/json"))
            .and(body_json(json!({
                "story": {"name": "Home", "slug": "home", "content": {"component": "page"}},
                "publish": 0
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"story": story_json(42, "home")})))
            .expect(1)
            .mount(&server)
            .await;

        let story = client_for(&server)
            .create_story(NewStory::new(
                StoryName::parse("Home").unwrap(),
                Slug::parse("home").unwrap(),
                ContentNode::new("page"),
            ))
            .await
            .unwrap();
        assert_eq!(story.id, 42);
        assert_eq!(story.slug, "home");
    }

    #[tokio::test]
    async fn test_create_story_publish_coerced() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/spaces/123/stories"))
            .and(body_json(json!({
                "story": {"name": "News", "slug": "news", "content": {"component": "page"}, "parent_id": 5},
                "publish": 1
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"story": story_json(7, "news")})))
            .expect(1)
            .mount(&server)
            .await;

        let story = NewStory::new(
            StoryName::parse("News").unwrap(),
            Slug::parse("news").unwrap(),
            ContentNode::new("page"),
        )
        .with_parent(5)
        .with_publish(true);
        client_for(&server).create_story(story).await.unwrap();
    }

    #[tokio::test]
    async fn test_update_story_empty_patch_still_sent() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/spaces/123/stories/42"))
            .and(body_json(json!({"story": {}})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"story": story_json(42, "home")})))
            .expect(1)
            .mount(&server)
            .await;

        let story = client_for(&server)
            .update_story(42, StoryPatch::default())
            .await
            .unwrap();
        assert_eq!(story.id, 42);
    }

    #[tokio::test]
    async fn test_list_stories_omits_unset_params() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/spaces/123/stories"))
            .and(query_param("per_page", "10"))
            .and(query_param_is_missing("page"))
            .and(query_param_is_missing("filter_query"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "stories": [story_json(1, "a"), story_json(2, "b")]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let stories = client_for(&server)
            .list_stories(ListParams::default().with_per_page(10))
            .await
            .unwrap();
        assert_eq!(stories.len(), 2);
    }

    #[tokio::test]
    async fn test_list_components() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/spaces/123/components"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "components": [{"id": 1, "name": "page", "is_root": true}]
            })))
            .mount(&server)
            .await;

        let components = client_for(&server).list_components().await.unwrap();
        assert_eq!(components[0].name, "page");
    }

    #[tokio::test]
    async fn test_get_asset_bare_and_wrapped() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/spaces/123/assets/5"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 5, "filename": "a.png"})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/spaces/123/assets/6"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"asset": {"id": 6}})))
            .mount(&server)
            .await;

        let client = client_for(&server);
        assert_eq!(client.get_asset(5).await.unwrap().filename.as_deref(), Some("a.png"));
        assert_eq!(client.get_asset(6).await.unwrap().id, 6);
    }

    #[tokio::test]
    async fn test_error_tiers_over_http() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/spaces/123/stories/1"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "Not here"})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/spaces/123/stories/2"))
            .respond_with(ResponseTemplate::new(502).set_body_string("upstream exploded"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/spaces/123/stories/3"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let client = client_for(&server);
        assert_eq!(
            client.get_story(1).await.unwrap_err().to_string(),
            "404 Not Found: Not here"
        );
        assert_eq!(
            client.get_story(2).await.unwrap_err().to_string(),
            "502 Bad Gateway: upstream exploded"
        );
        assert_eq!(
            client.get_story(3).await.unwrap_err().to_string(),
            "401 Unauthorized"
        );
    }

    #[tokio::test]
    async fn test_success_with_invalid_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/spaces/123/stories/1"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
            .mount(&server)
            .await;

        let err = client_for(&server).get_story(1).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);
    }

    #[tokio::test]
    async fn test_network_error_classified() {
        let ctx = SpaceContext::new("123", "tok", "http://127.0.0.1:1").unwrap();
        let client = StoryblokClient::with_timeout(ctx, Duration::from_secs(2)).unwrap();
        let err = client.list_components().await.unwrap_err();
        assert!(err.is_network());
        let message = err.to_string();
        assert!(message.starts_with("Network error: GET /components failed: "));
        assert!(message.len() > "Network error: GET /components failed: ".len());
    }

    #[tokio::test]
    async fn test_folder_story_is_not_a_decode_error() {
        let server = MockServer::start().await;
        let folder = json!({"id": 5, "name": "Blog", "slug": "blog", "is_folder": true, "content": {}});
        Mock::given(method("GET"))
            .and(path("/spaces/123/stories/5"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"story": folder.clone()})))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/spaces/123/stories/5"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"story": folder})))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let story = client.get_story(5).await.unwrap();
        assert_eq!(story.content, Some(StoryContent::Raw(json!({}))));
        assert_eq!(story.extra["is_folder"], json!(true));

        let updated = client.update_story(5, StoryPatch::default()).await.unwrap();
        assert_eq!(updated.id, 5);
    }

    #[tokio::test]
    async fn test_timeout_is_network_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"components": []}))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let ctx = SpaceContext::new("123", "tok", server.uri()).unwrap();
        let client = StoryblokClient::with_timeout(ctx, Duration::from_millis(50)).unwrap();
        let err = client.list_components().await.unwrap_err();
        assert!(err.is_network());
        assert!(err.to_string().contains("timed out"));
    }

    #[tokio::test]
    async fn test_upload_from_url_fetch_failure_skips_cms() {
        let source = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&source)
            .await;

        let cms = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 1})))
            .expect(0)
            .mount(&cms)
            .await;

        let err = client_for(&cms)
            .upload_asset_from_url(&format!("{}/x.png", source.uri()))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SourceFetch);
        assert!(err.to_string().starts_with("Failed to fetch file: "));
    }

    #[tokio::test]
    async fn test_upload_from_url_sends_multipart() {
        let source = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/img/cat.png"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "image/png")
                    .set_body_bytes(vec![0x89, 0x50, 0x4e, 0x47]),
            )
            .mount(&source)
            .await;

        let cms = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/spaces/123/assets"))
            .and(header("authorization", "Bearer test-token"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 99, "filename": "cat.png"})))
            .expect(1)
            .mount(&cms)
            .await;

        let asset = client_for(&cms)
            .upload_asset_from_url(&format!("{}/img/cat.png", source.uri()))
            .await
            .unwrap();
        assert_eq!(asset.id, 99);

        let requests = cms.received_requests().await.unwrap();
        let content_type = requests[0]
            .headers
            .get("content-type")
            .unwrap()
            .to_str()
            .unwrap();
        assert!(content_type.starts_with("multipart/form-data"));
        let body = String::from_utf8_lossy(&requests[0].body);
        assert!(body.contains("filename=\"cat.png\""));
    }

    #[tokio::test]
    async fn test_finish_upload_returns_raw_json() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/spaces/123/assets/99/finish_upload"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 99, "is_private": false})))
            .mount(&server)
            .await;

        let value = client_for(&server).finish_upload(99).await.unwrap();
        assert_eq!(value["id"], json!(99));
    }

    #[tokio::test]
    async fn test_get_story_idempotent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/spaces/123/stories/42"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"story": story_json(42, "home")})))
            .expect(2)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let first = client.get_story(42).await.unwrap();
        let second = client.get_story(42).await.unwrap();
        assert_eq!(first, second);
    }
}
