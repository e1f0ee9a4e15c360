//! Story tools.

use std::num::{NonZeroU32, NonZeroU64};
use std::sync::Arc;

use blokgate_client::ContentApi;
use blokgate_core::{ContentNode, ListParams, NewStory, Slug, StoryName, StoryPatch};
use rmcp::model::{ErrorData, Tool};
use serde::Deserialize;
use serde_json::{Value, json};

use super::{invalid, list_schema, make_tool, parse_args};
use crate::envelope;
use crate::registry::{ToolRegistry, ToolResult};

/// Largest page size accepted by `listStories`.
pub const MAX_STORIES_PER_PAGE: u32 = 100;

// ---------------------------------------------------------------------------
// Argument types
// ---------------------------------------------------------------------------

/// Arguments for `createStory`.
#[derive(Debug, Deserialize)]
pub struct CreateStoryArgs {
    /// Story name.
    pub name: StoryName,
    /// Story slug.
    pub slug: Slug,
    /// Content body.
    pub content: ContentNode,
    /// Parent folder id.
    pub parent_id: Option<NonZeroU64>,
    /// Publish immediately.
    pub publish: Option<bool>,
}

/// Arguments for `updateStory`.
#[derive(Debug, Deserialize)]
pub struct UpdateStoryArgs {
    /// Story id.
    #[serde(rename = "storyId")]
    pub story_id: NonZeroU64,
    /// New name.
    pub name: Option<StoryName>,
    /// New slug.
    pub slug: Option<Slug>,
    /// Replacement content body.
    pub content: Option<ContentNode>,
    /// New parent folder id.
    pub parent_id: Option<NonZeroU64>,
    /// Publish after updating.
    pub publish: Option<bool>,
}

/// Arguments for `getStory` and `deleteStory`.
#[derive(Debug, Deserialize)]
pub struct StoryIdArgs {
    /// Story id.
    #[serde(rename = "storyId")]
    pub story_id: NonZeroU64,
}

/// Arguments for `listStories`.
#[derive(Debug, Default, Deserialize)]
pub struct ListStoriesArgs {
    /// Page size, 1 to 100.
    pub per_page: Option<u32>,
    /// Page number.
    pub page: Option<NonZeroU32>,
    /// Filter expression.
    pub filter_query: Option<String>,
}

impl CreateStoryArgs {
    fn into_new_story(self, tool: &str) -> Result<NewStory, ErrorData> {
        check_content(tool, &self.content)?;
        let mut story = NewStory::new(self.name, self.slug, self.content)
            .with_publish(self.publish.unwrap_or(false));
        if let Some(parent) = self.parent_id {
            story = story.with_parent(parent.get());
        }
        Ok(story)
    }
}

impl UpdateStoryArgs {
    fn into_patch(self, tool: &str) -> Result<(u64, StoryPatch), ErrorData> {
        if let Some(content) = &self.content {
            check_content(tool, content)?;
        }
        let patch = StoryPatch {
            name: self.name,
            slug: self.slug,
            content: self.content,
            parent_id: self.parent_id.map(NonZeroU64::get),
            publish: self.publish,
        };
        Ok((self.story_id.get(), patch))
    }
}

impl ListStoriesArgs {
    fn into_params(self, tool: &str) -> Result<ListParams, ErrorData> {
        let mut params = ListParams::default();
        if let Some(per_page) = self.per_page {
            if !(1..=MAX_STORIES_PER_PAGE).contains(&per_page) {
                return Err(invalid(
                    tool,
                    format!("per_page must be between 1 and {MAX_STORIES_PER_PAGE}"),
                ));
            }
            params = params.with_per_page(per_page);
        }
        if let Some(page) = self.page {
            params = params.with_page(page.get());
        }
        if let Some(filter) = self.filter_query {
            params = params.with_filter_query(filter);
        }
        Ok(params)
    }
}

fn check_content(tool: &str, content: &ContentNode) -> Result<(), ErrorData> {
    match content.duplicate_uid() {
        Some(uid) => Err(invalid(tool, format!("duplicate _uid '{uid}' in content"))),
        None => Ok(()),
    }
}

// ---------------------------------------------------------------------------
// StoryTools
// ---------------------------------------------------------------------------

/// Story operations: create, update, delete, get, list.
pub struct StoryTools {
    api: Arc<dyn ContentApi>,
}

impl StoryTools {
    /// Tools backed by `api`.
    pub fn new(api: Arc<dyn ContentApi>) -> Self {
        Self { api }
    }
}

fn name_schema() -> Value {
    json!({
        "type": "string",
        "minLength": 1,
        "maxLength": blokgate_core::story::MAX_NAME_LEN,
        "description": "Story name (1-255 characters)"
    })
}

fn slug_schema() -> Value {
    json!({
        "type": "string",
        "minLength": 1,
        "pattern": "^[a-z0-9-]+$",
        "description": "Story slug (lowercase, alphanumeric with hyphens)"
    })
}

fn content_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "component": {"type": "string", "description": "Root component name"}
        },
        "required": ["component"],
        "additionalProperties": true,
        "description": "Story content: a tree of component nodes"
    })
}

fn id_schema(description: &str) -> Value {
    json!({
        "type": "object",
        "properties": {
            "storyId": {"type": "integer", "minimum": 1, "description": description}
        },
        "required": ["storyId"]
    })
}

impl StoryTools {
    /// Declarations of these tools. They do not depend on the backend.
    pub fn declarations() -> Vec<Tool> {
        let parent = json!({"type": "integer", "minimum": 1, "description": "Parent story ID"});
        let publish = json!({"type": "boolean", "description": "Publish immediately"});
        vec![
            make_tool(
                "createStory",
                "Create Story",
                "Create a new story in Storyblok",
                json!({
                    "type": "object",
                    "properties": {
                        "name": name_schema(),
                        "slug": slug_schema(),
                        "content": content_schema(),
                        "parent_id": parent,
                        "publish": publish
                    },
                    "required": ["name", "slug", "content"]
                }),
            ),
            make_tool(
                "updateStory",
                "Update Story",
                "Update an existing story in Storyblok. Only supplied fields change.",
                json!({
                    "type": "object",
                    "properties": {
                        "storyId": {"type": "integer", "minimum": 1, "description": "Story ID"},
                        "name": name_schema(),
                        "slug": slug_schema(),
                        "content": content_schema(),
                        "parent_id": parent,
                        "publish": publish
                    },
                    "required": ["storyId"]
                }),
            ),
            make_tool(
                "deleteStory",
                "Delete Story",
                "Delete a story from Storyblok",
                id_schema("Story ID to delete"),
            ),
            make_tool(
                "getStory",
                "Get Story",
                "Retrieve a single story by ID from Storyblok",
                id_schema("Story ID to retrieve"),
            ),
            make_tool(
                "listStories",
                "List Stories",
                "List all stories in Storyblok with optional filtering and pagination",
                list_schema(Some(MAX_STORIES_PER_PAGE)),
            ),
        ]
    }
}

impl ToolRegistry for StoryTools {
    fn tools(&self) -> Vec<Tool> {
        Self::declarations()
    }

    fn call(&self, name: &str, args: Value) -> Option<ToolResult> {
        let api = Arc::clone(&self.api);

        match name {
            "createStory" => Some(Box::pin(async move {
                let story = parse_args::<CreateStoryArgs>("createStory", args)?
                    .into_new_story("createStory")?;
                let result = api.create_story(story).await;
                Ok(envelope::into_call_result(envelope::from_result("story", result)))
            })),
            "updateStory" => Some(Box::pin(async move {
                let (id, patch) =
                    parse_args::<UpdateStoryArgs>("updateStory", args)?.into_patch("updateStory")?;
                let result = api.update_story(id, patch).await;
                Ok(envelope::into_call_result(envelope::from_result("story", result)))
            })),
            "deleteStory" => Some(Box::pin(async move {
                let id = parse_args::<StoryIdArgs>("deleteStory", args)?.story_id;
                let env = match api.delete_story(id.get()).await {
                    Ok(_) => envelope::confirmation(format!("Story {id} deleted successfully")),
                    Err(err) => envelope::failure(err.to_string()),
                };
                Ok(envelope::into_call_result(env))
            })),
            "getStory" => Some(Box::pin(async move {
                let id = parse_args::<StoryIdArgs>("getStory", args)?.story_id;
                let result = api.get_story(id.get()).await;
                Ok(envelope::into_call_result(envelope::from_result("story", result)))
            })),
            "listStories" => Some(Box::pin(async move {
                let params =
                    parse_args::<ListStoriesArgs>("listStories", args)?.into_params("listStories")?;
                let result = api.list_stories(params).await;
                Ok(envelope::into_call_result(envelope::from_result("stories", result)))
            })),
            _ => None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use blokgate_client::MockContentApi;

    fn tools() -> (StoryTools, MockContentApi) {
        let mock = MockContentApi::new();
        (StoryTools::new(Arc::new(mock.clone())), mock)
    }

    async fn call(tools: &StoryTools, name: &str, args: Value) -> Result<Value, ErrorData> {
        let result = tools.call(name, args).unwrap().await?;
        Ok(result.structured_content.unwrap())
    }

    #[test]
    fn test_tool_declarations() {
        let (tools, _) = tools();
        let names: Vec<String> = tools.tools().iter().map(|t| t.name.to_string()).collect();
        assert_eq!(
            names,
            ["createStory", "updateStory", "deleteStory", "getStory", "listStories"]
        );
        assert!(tools.call("getComponents", json!({})).is_none());
    }

    #[tokio::test]
    async fn test_create_story_envelope() {
        let (tools, _) = tools();
        let env = call(
            &tools,
            "createStory",
            json!({"name": "Home", "slug": "home", "content": {"component": "page"}}),
        )
        .await
        .unwrap();
        assert_eq!(env["success"], true);
        assert!(env["story"]["id"].is_u64());
        assert_eq!(env["story"]["slug"], "home");
    }

    #[tokio::test]
    async fn test_invalid_slug_never_reaches_client() {
        let (tools, mock) = tools();
        let err = call(
            &tools,
            "createStory",
            json!({"name": "Home", "slug": "My Slug!", "content": {"component": "page"}}),
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, rmcp::model::ErrorCode::INVALID_PARAMS);
        assert_eq!(mock.call_count().await, 0);
    }

    #[tokio::test]
    async fn test_duplicate_uid_rejected() {
        let (tools, mock) = tools();
        let content = json!({
            "component": "page",
            "_uid": "a",
            "body": [{"component": "teaser", "_uid": "a"}]
        });
        let err = call(
            &tools,
            "createStory",
            json!({"name": "Home", "slug": "home", "content": content}),
        )
        .await
        .unwrap_err();
        assert!(err.message.contains("duplicate _uid 'a'"));
        assert_eq!(mock.call_count().await, 0);
    }

    #[tokio::test]
    async fn test_zero_story_id_rejected() {
        let (tools, mock) = tools();
        assert!(call(&tools, "getStory", json!({"storyId": 0})).await.is_err());
        assert_eq!(mock.call_count().await, 0);
    }

    #[tokio::test]
    async fn test_per_page_bounds() {
        let (tools, mock) = tools();
        assert!(call(&tools, "listStories", json!({"per_page": 101})).await.is_err());
        assert_eq!(mock.call_count().await, 0);

        let env = call(&tools, "listStories", json!({"per_page": 100})).await.unwrap();
        assert_eq!(env, json!({"success": true, "stories": []}));
    }

    #[tokio::test]
    async fn test_delete_missing_story() {
        let (tools, _) = tools();
        let env = call(&tools, "deleteStory", json!({"storyId": 999})).await.unwrap();
        assert_eq!(env["success"], false);
        assert!(env["message"].as_str().unwrap().starts_with("404"));
    }

    #[tokio::test]
    async fn test_delete_confirmation() {
        let (tools, _) = tools();
        let created = call(
            &tools,
            "createStory",
            json!({"name": "Home", "slug": "home", "content": {"component": "page"}}),
        )
        .await
        .unwrap();
        let id = created["story"]["id"].as_u64().unwrap();
        let env = call(&tools, "deleteStory", json!({"storyId": id})).await.unwrap();
        assert_eq!(
            env,
            json!({"success": true, "message": format!("Story {id} deleted successfully")})
        );
    }

    #[tokio::test]
    async fn test_update_with_no_fields_is_forwarded() {
        let (tools, mock) = tools();
        call(
            &tools,
            "createStory",
            json!({"name": "Home", "slug": "home", "content": {"component": "page"}}),
        )
        .await
        .unwrap();
        let env = call(&tools, "updateStory", json!({"storyId": 1})).await.unwrap();
        assert_eq!(env["success"], true);
        assert_eq!(mock.calls().await, vec!["create_story", "update_story"]);
    }

    #[tokio::test]
    async fn test_get_story_idempotent() {
        let (tools, _) = tools();
        call(
            &tools,
            "createStory",
            json!({"name": "Home", "slug": "home", "content": {"component": "page"}}),
        )
        .await
        .unwrap();
        let first = call(&tools, "getStory", json!({"storyId": 1})).await.unwrap();
        let second = call(&tools, "getStory", json!({"storyId": 1})).await.unwrap();
        assert_eq!(first, second);
    }
}
