//! The Blokgate CLI application.
//!
//! Resolves credentials from environment, flags and config file (in that
//! order of precedence), then serves the catalog or runs one-shot commands.

use std::sync::Arc;

use blokgate_client::StoryblokClient;
use blokgate_core::credentials::{ArgsSource, EnvSource};
use blokgate_core::{CredentialField, CredentialResolver, Error, Result};
use blokgate_mcp::{BlokgateServer, Catalog};
use rmcp::ServiceExt;
use serde_json::Value;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use crate::cli::{CliArgs, Command};
use crate::config::{BlokgateConfig, ConfigSource};
use crate::config_handlers;

/// CLI application over a loaded [`BlokgateConfig`].
pub struct BlokgateApp {
    config: BlokgateConfig,
    version: String,
}

impl BlokgateApp {
    /// Load config from the `--config` path, `BLOKGATE_CONFIG` or the XDG default.
    pub fn from_args(args: &CliArgs) -> Result<Self> {
        Ok(Self::new(BlokgateConfig::load(args.config.as_deref())?))
    }

    /// Application over an already loaded config.
    pub fn new(config: BlokgateConfig) -> Self {
        Self {
            config,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Override the version string.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// The loaded configuration.
    pub fn config(&self) -> &BlokgateConfig {
        &self.config
    }

    /// Install the tracing subscriber, writing to stderr.
    ///
    /// `RUST_LOG` wins; otherwise `--quiet` selects `warn` and `--verbose`
    /// selects `debug`.
    pub fn init_logging(&self, verbose: bool, quiet: bool) {
        let filter = if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else if quiet {
            EnvFilter::new("warn")
        } else if verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        };

        // A subscriber may already be installed (e.g. in tests).
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    }

    /// Credential layers: process environment, then flags, then config file.
    pub fn resolver(&self, args: &CliArgs) -> CredentialResolver {
        self.resolver_with_env(EnvSource::new(), args)
    }

    fn resolver_with_env(&self, env: EnvSource, args: &CliArgs) -> CredentialResolver {
        CredentialResolver::new()
            .with_source(env)
            .with_source(ArgsSource::new(args.credential_flags()))
            .with_source(ConfigSource::new(&self.config))
    }

    fn server(&self, resolver: &CredentialResolver) -> Result<BlokgateServer> {
        let context = resolver.resolve()?;
        tracing::info!(
            space_id = context.space_id(),
            api_base = context.api_base(),
            "credentials resolved"
        );
        BlokgateServer::from_context(context, self.config.timeout())
    }

    /// Run the command selected by `args`.
    pub async fn run(&self, args: CliArgs) -> Result<()> {
        self.init_logging(args.verbose, args.quiet);
        let resolver = self.resolver(&args);

        match args.command {
            Some(Command::Serve { http, host, port }) => {
                let server = self.server(&resolver)?;
                if http {
                    let host = host.unwrap_or_else(|| self.config.server.host.clone());
                    let port = port.unwrap_or(self.config.server.port);
                    serve_http(server, &host, port).await
                } else {
                    serve_stdio(server).await
                }
            }
            Some(Command::Call { tool, args: raw }) => {
                let envelope = self.call(&resolver, &tool, &raw).await?;
                println!("{}", serde_json::to_string_pretty(&envelope)?);
                Ok(())
            }
            Some(Command::Tools) => {
                for line in tool_lines() {
                    println!("{line}");
                }
                Ok(())
            }
            Some(Command::Health) => {
                for line in health_report(&resolver)? {
                    println!("{line}");
                }
                Ok(())
            }
            Some(Command::Version) => {
                println!("blokgate {}", self.version);
                Ok(())
            }
            Some(Command::Config(config_cmd)) => {
                config_handlers::handle_config_command(args.config.as_deref(), config_cmd.command)
            }
            None => {
                println!("blokgate {}: use --help for usage", self.version);
                Ok(())
            }
        }
    }

    /// Invoke one tool with JSON-encoded arguments and return its envelope.
    pub async fn call(
        &self,
        resolver: &CredentialResolver,
        tool: &str,
        raw_args: &str,
    ) -> Result<Value> {
        let args: Value = serde_json::from_str(raw_args)
            .map_err(|e| Error::validation(format!("--args is not valid JSON: {e}")))?;

        let context = resolver.resolve()?;
        let client = StoryblokClient::with_timeout(context, self.config.timeout())?;
        Catalog::new(Arc::new(client))
            .invoke(tool, args)
            .await
            .map_err(|e| Error::validation(e.message.to_string()))
    }
}

async fn serve_stdio(server: BlokgateServer) -> Result<()> {
    tracing::info!("serving MCP over stdio");
    let service = server
        .serve(rmcp::transport::stdio())
        .await
        .map_err(|e| Error::io(format!("MCP handshake failed: {e}")))?;
    service
        .waiting()
        .await
        .map_err(|e| Error::io(format!("MCP session ended abnormally: {e}")))?;
    Ok(())
}

async fn serve_http(server: BlokgateServer, host: &str, port: u16) -> Result<()> {
    let listener = TcpListener::bind((host, port))
        .await
        .map_err(|e| Error::io(format!("bind {host}:{port}: {e}")))?;
    blokgate_mcp::http::serve_on(server, listener).await?;
    Ok(())
}

/// `name: description` for every catalog tool.
fn tool_lines() -> Vec<String> {
    Catalog::declarations()
        .into_iter()
        .map(|tool| {
            let description = tool.description.as_deref().unwrap_or_default();
            format!("{}: {description}", tool.name)
        })
        .collect()
}

/// Where each credential comes from, with the token redacted.
fn health_report(resolver: &CredentialResolver) -> Result<Vec<String>> {
    let context = resolver.resolve()?;
    let origin = |field: CredentialField| {
        resolver
            .lookup(field)
            .map(|(_, source)| source.to_string())
            .unwrap_or_else(|| "default".to_string())
    };

    Ok(vec![
        format!(
            "space id: {} ({})",
            context.space_id(),
            origin(CredentialField::SpaceId)
        ),
        format!("access token: set ({})", origin(CredentialField::AccessToken)),
        format!(
            "api base: {} ({})",
            context.api_base(),
            origin(CredentialField::ApiBase)
        ),
        "status: ok".to_string(),
    ])
}
