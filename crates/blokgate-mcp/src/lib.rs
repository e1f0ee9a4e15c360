//! MCP operation catalog and server for Blokgate.
//!
//! # Key Abstractions
//!
//! - [`ToolRegistry`]: a set of named tools with JSON Schema contracts
//! - [`Catalog`]: the story, component and asset tools over one client
//! - [`envelope`]: the `{success, ...}` Result Envelope
//! - [`BlokgateServer`]: rmcp `ServerHandler` over the catalog
//! - `http` (feature `http`): streamable HTTP transport with `/health`

#![doc = include_str!("../README.md")]

pub mod catalog;
pub mod envelope;
#[cfg(feature = "http")]
pub mod http;
pub mod registry;
pub mod server;
pub mod tools;

pub use catalog::Catalog;
pub use registry::{CompositeRegistry, ToolRegistry, ToolResult};
pub use server::BlokgateServer;
