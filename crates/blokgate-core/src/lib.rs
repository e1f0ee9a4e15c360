//! Blokgate Core: shared types, errors, and credential resolution.
//!
//! This crate provides the foundational types used across all Blokgate crates.
//! It has no internal Blokgate dependencies (dependency level 0).
//!
//! # Modules
//!
//! - [`error`]: Error taxonomy and Result alias
//! - [`content`]: Tagged content node tree carried by stories
//! - [`story`]: Stories and their create/update payloads
//! - [`resources`]: Components, assets, and list parameters
//! - [`credentials`]: Space context and layered credential sources

#![doc = include_str!("../README.md")]

pub mod content;
pub mod credentials;
pub mod error;
pub mod resources;
pub mod story;

// Re-export key types at crate root for convenience
pub use content::{ContentNode, StoryContent};
pub use credentials::{CredentialField, CredentialResolver, CredentialSource, SpaceContext};
pub use error::{Error, ErrorKind, Result};
pub use resources::{Asset, AssetUpload, Component, ListParams};
pub use story::{NewStory, Slug, Story, StoryName, StoryPatch};
