//! Resource client for the Storyblok Management API.
//!
//! # Key Abstractions
//!
//! - [`ContentApi`]: one method per supported resource action
//! - [`StoryblokClient`]: the authenticated HTTP implementation
//! - [`MockContentApi`]: in-memory implementation for tests
//! - [`response::ErrorBody`]: the three-stage error body interpretation

#![doc = include_str!("../README.md")]

mod api;
mod client;
mod mock;
pub mod response;
pub mod source;

pub use api::ContentApi;
pub use client::{DEFAULT_TIMEOUT, StoryblokClient};
pub use mock::MockContentApi;
