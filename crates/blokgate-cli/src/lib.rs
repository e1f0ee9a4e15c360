//! Command-line front end for Blokgate.
//!
//! # Key Abstractions
//!
//! - [`CliArgs`]: clap argument tree (`serve`, `call`, `tools`, `health`,
//!   `version`, `config`)
//! - [`BlokgateConfig`]: file/env configuration loaded with `confyg`
//! - [`ConfigSource`]: config file values as the lowest credential layer
//! - [`BlokgateApp`]: command dispatch and logging setup

#![doc = include_str!("../README.md")]

pub mod app;
pub mod cli;
pub mod config;
pub mod config_handlers;

pub use app::BlokgateApp;
pub use cli::{CliArgs, Command, ConfigAction, ConfigCommand};
pub use config::{BlokgateConfig, ConfigSource};
