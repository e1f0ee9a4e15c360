//! Configuration for the Blokgate CLI.
//!
//! [`BlokgateConfig`] loads from a TOML file, `BLOKGATE_*` environment
//! variables and built-in defaults using `confyg`.
//!
//! # Loading Priority
//!
//! 1. Explicit `--config <path>` flag
//! 2. `BLOKGATE_CONFIG` environment variable
//! 3. XDG default: `~/.config/blokgate/config.toml`
//! 4. Built-in defaults
//!
//! Credentials stored here form the lowest credential layer; see
//! [`ConfigSource`].

use std::path::PathBuf;
use std::time::Duration;

use blokgate_core::credentials::DEFAULT_API_BASE;
use blokgate_core::{CredentialField, CredentialSource, Error, Result};
use confyg::{Confygery, env};
use serde::{Deserialize, Serialize};

/// Environment variable naming the config file.
pub const CONFIG_ENV_VAR: &str = "BLOKGATE_CONFIG";

// ============================================================================
// Configuration structs
// ============================================================================

/// Main configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BlokgateConfig {
    /// Storyblok space and API settings.
    pub storyblok: StoryblokConfig,

    /// HTTP transport settings.
    pub server: ServerConfig,
}

/// Storyblok connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoryblokConfig {
    /// Management API base URL.
    pub api_base: String,

    /// Space id.
    pub space_id: Option<String>,

    /// Management API access token.
    pub access_token: Option<String>,

    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

/// HTTP transport configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address to bind to.
    pub host: String,

    /// Port to listen on.
    pub port: u16,
}

impl Default for StoryblokConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            space_id: None,
            access_token: None,
            timeout_secs: 30,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

// ============================================================================
// Config loading
// ============================================================================

impl BlokgateConfig {
    /// Load configuration from file, environment, and defaults.
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut builder =
            Confygery::new().map_err(|e| Error::config(format!("config init: {e}")))?;

        if let Some(path) = Self::resolve_config_path(config_path)
            && path.exists()
        {
            builder
                .add_file(&path.to_string_lossy())
                .map_err(|e| Error::config(format!("config file: {e}")))?;
        }

        let mut env_opts = env::Options::with_top_level("BLOKGATE");
        env_opts.add_section("storyblok");
        env_opts.add_section("server");
        builder
            .add_env(env_opts)
            .map_err(|e| Error::config(format!("config env: {e}")))?;

        builder
            .build()
            .map_err(|e| Error::config(format!("config build: {e}")))
    }

    /// Resolve the config file path from explicit flag, env var, or XDG default.
    pub fn resolve_config_path(explicit: Option<&str>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(PathBuf::from(path));
        }
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            return Some(PathBuf::from(path));
        }
        Self::default_config_path()
    }

    /// Return the XDG default config path.
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("blokgate").join("config.toml"))
    }

    /// Per-request timeout for the Storyblok client.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.storyblok.timeout_secs.max(1))
    }

    /// Serialize this config to a pretty-printed TOML string.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::config(e.to_string()))
    }

    /// Flatten this config into `BLOKGATE_`-prefixed environment variable pairs.
    pub fn to_env_vars(&self) -> Result<Vec<(String, String)>> {
        let value = toml::Value::try_from(self).map_err(|e| Error::config(e.to_string()))?;
        let mut vars = Vec::new();
        flatten_toml_value(&value, "BLOKGATE", &mut vars);
        Ok(vars)
    }
}

/// Recursively flatten a TOML value into `KEY=value` pairs.
fn flatten_toml_value(value: &toml::Value, prefix: &str, out: &mut Vec<(String, String)>) {
    match value {
        toml::Value::Table(table) => {
            for (key, val) in table {
                flatten_toml_value(val, &format!("{prefix}_{}", key.to_uppercase()), out);
            }
        }
        toml::Value::Array(arr) => {
            if let Ok(json) = serde_json::to_string(arr) {
                out.push((prefix.to_string(), json));
            }
        }
        toml::Value::String(s) => out.push((prefix.to_string(), s.clone())),
        other => out.push((prefix.to_string(), other.to_string())),
    }
}

// ============================================================================
// Credential layer
// ============================================================================

/// Credentials from the config file, the lowest-priority layer.
#[derive(Debug, Clone)]
pub struct ConfigSource {
    storyblok: StoryblokConfig,
}

impl ConfigSource {
    /// Layer over the `[storyblok]` section of `config`.
    pub fn new(config: &BlokgateConfig) -> Self {
        Self {
            storyblok: config.storyblok.clone(),
        }
    }
}

impl CredentialSource for ConfigSource {
    fn name(&self) -> &str {
        "config"
    }

    fn lookup(&self, field: CredentialField) -> Option<String> {
        match field {
            CredentialField::SpaceId => self.storyblok.space_id.clone(),
            CredentialField::AccessToken => self.storyblok.access_token.clone(),
            // The built-in base is the resolver's own fallback, not a setting.
            CredentialField::ApiBase => Some(self.storyblok.api_base.as_str())
                .filter(|base| *base != DEFAULT_API_BASE)
                .map(str::to_string),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
