//! Stories and their create/update payloads.
//!
//! [`Slug`] and [`StoryName`] are validated newtypes: they can only be built
//! from values that satisfy the story invariants, and deserializing them
//! applies the same checks. A payload that reaches the Resource Client has
//! therefore already passed validation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use crate::content::{ContentNode, StoryContent};
use crate::error::Error;

/// Maximum story name length, in characters.
pub const MAX_NAME_LEN: usize = 255;

// ============================================================================
// Validated newtypes
// ============================================================================

/// URL-safe story identifier: lowercase letters, digits, and hyphens.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Slug(String);

impl Slug {
    /// Validate and wrap a slug.
    pub fn parse(value: impl Into<String>) -> Result<Self, Error> {
        let value = value.into();
        if value.is_empty() {
            return Err(Error::validation("Slug cannot be empty"));
        }
        let valid = value
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-');
        if !valid {
            return Err(Error::validation(format!(
                "Slug '{value}' must contain only lowercase letters, numbers, and hyphens"
            )));
        }
        Ok(Self(value))
    }

    /// Borrow the slug text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Story display name of 1 to 255 characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StoryName(String);

impl StoryName {
    /// Validate and wrap a name.
    pub fn parse(value: impl Into<String>) -> Result<Self, Error> {
        let value = value.into();
        let len = value.chars().count();
        if len == 0 {
            return Err(Error::validation("Name cannot be empty"));
        }
        if len > MAX_NAME_LEN {
            return Err(Error::validation(format!(
                "Name must be at most {MAX_NAME_LEN} characters (got {len})"
            )));
        }
        Ok(Self(value))
    }

    /// Borrow the name text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

macro_rules! string_newtype_impls {
    ($ty:ident) => {
        impl TryFrom<String> for $ty {
            type Error = Error;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::parse(value)
            }
        }

        impl FromStr for $ty {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl From<$ty> for String {
            fn from(value: $ty) -> Self {
                value.0
            }
        }

        impl AsRef<str> for $ty {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_newtype_impls!(Slug);
string_newtype_impls!(StoryName);

// ============================================================================
// Story
// ============================================================================

/// A story as returned by the CMS.
///
/// Fields the gateway does not interpret are kept in `extra` so that the
/// record is relayed to the caller intact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Story {
    /// Server-assigned id.
    pub id: u64,

    /// Display name.
    pub name: String,

    /// Slug within the parent folder.
    pub slug: String,

    /// Slug including parent folders.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_slug: Option<String>,

    /// Content body. Absent in list responses.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<StoryContent>,

    /// Parent folder id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<u64>,

    /// Whether the story is published.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published: Option<bool>,

    /// Creation timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    /// Last update timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,

    /// Publication timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,

    /// Remaining server fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// ============================================================================
// Payloads
// ============================================================================

/// Fields for creating a story.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewStory {
    /// Display name.
    pub name: StoryName,
    /// Slug.
    pub slug: Slug,
    /// Content body.
    pub content: ContentNode,
    /// Parent folder id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<u64>,
    /// Publish immediately. Sent as a separate wire flag.
    #[serde(skip)]
    pub publish: bool,
}

impl NewStory {
    /// Create an unpublished story payload.
    pub fn new(name: StoryName, slug: Slug, content: ContentNode) -> Self {
        Self {
            name,
            slug,
            content,
            parent_id: None,
            publish: false,
        }
    }

    /// Place the story under a parent folder.
    pub fn with_parent(mut self, parent_id: u64) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    /// Set the publish flag.
    pub fn with_publish(mut self, publish: bool) -> Self {
        self.publish = publish;
        self
    }
}

/// Partial story update. Only supplied fields are sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StoryPatch {
    /// New display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<StoryName>,
    /// New slug.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<Slug>,
    /// Replacement content body.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<ContentNode>,
    /// New parent folder id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<u64>,
    /// Publish after updating. Sent as a separate wire flag.
    #[serde(skip)]
    pub publish: Option<bool>,
}

impl StoryPatch {
    /// Whether no field is set.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}
