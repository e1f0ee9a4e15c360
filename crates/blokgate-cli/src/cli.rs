//! CLI argument parsing and command definitions.

use blokgate_core::CredentialField;
use clap::{Parser, Subcommand};

// ============================================================================
// CLI argument types
// ============================================================================

/// Top-level CLI arguments.
#[derive(Parser, Debug)]
#[command(name = "blokgate", author, version, about, long_about = None)]
pub struct CliArgs {
    /// Path to configuration file.
    #[arg(short, long, env = "BLOKGATE_CONFIG", global = true)]
    pub config: Option<String>,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Storyblok space id.
    #[arg(long, global = true)]
    pub space_id: Option<String>,

    /// Storyblok Management API access token.
    #[arg(long, global = true)]
    pub access_token: Option<String>,

    /// Storyblok Management API base URL.
    #[arg(long, global = true)]
    pub api_base: Option<String>,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Option<Command>,
}

impl CliArgs {
    /// Credential flags as `--flag value` pairs, in argument order.
    pub fn credential_flags(&self) -> Vec<String> {
        let values = [
            (CredentialField::SpaceId, &self.space_id),
            (CredentialField::AccessToken, &self.access_token),
            (CredentialField::ApiBase, &self.api_base),
        ];
        values
            .into_iter()
            .filter_map(|(field, value)| {
                value
                    .as_ref()
                    .map(|v| [field.flag().to_string(), v.clone()])
            })
            .flatten()
            .collect()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the MCP server.
    Serve {
        /// Serve streamable HTTP instead of stdio.
        #[arg(long)]
        http: bool,

        /// Host to bind (HTTP only).
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (HTTP only).
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Invoke one tool and print its result envelope.
    Call {
        /// Tool name, e.g. `listStories`.
        tool: String,

        /// Tool arguments as a JSON object.
        #[arg(short, long, default_value = "{}")]
        args: String,
    },

    /// List the available tools.
    Tools,

    /// Print version information.
    Version,

    /// Check credentials and show the target space.
    Health,

    /// Configuration operations.
    Config(ConfigCommand),
}

/// Config-specific subcommands.
#[derive(Parser, Debug)]
pub struct ConfigCommand {
    /// Config subcommand to execute.
    #[command(subcommand)]
    pub command: ConfigAction,
}

/// Available config subcommands.
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show the resolved config file path.
    Path,

    /// Get a configuration value by dotted key.
    Get {
        /// Dotted key (e.g., "server.port").
        key: String,
    },

    /// Set a configuration value by dotted key.
    Set {
        /// Dotted key (e.g., "storyblok.space_id").
        key: String,

        /// Value to set.
        value: String,
    },

    /// Create a default configuration file.
    Init {
        /// Output file path (defaults to XDG config path).
        #[arg(short, long)]
        file: Option<String>,

        /// Overwrite existing file.
        #[arg(long)]
        force: bool,
    },

    /// Export configuration as environment variables.
    Export {
        /// Format as Docker --env flags.
        #[arg(long)]
        docker_env: bool,
    },
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_args_default() {
        let args = CliArgs::parse_from(["blokgate"]);
        assert!(!args.verbose);
        assert!(!args.quiet);
        assert!(args.command.is_none());
        assert!(args.credential_flags().is_empty());
    }

    #[test]
    fn test_cli_args_verbosity() {
        let args = CliArgs::parse_from(["blokgate", "--verbose"]);
        assert!(args.verbose);
        let args = CliArgs::parse_from(["blokgate", "-q"]);
        assert!(args.quiet);
    }

    #[test]
    fn test_credential_flags() {
        let args = CliArgs::parse_from([
            "blokgate",
            "--space-id",
            "123",
            "--api-base",
            "https://api-us.storyblok.com/v1",
        ]);
        assert_eq!(
            args.credential_flags(),
            [
                "--space-id",
                "123",
                "--api-base",
                "https://api-us.storyblok.com/v1"
            ]
        );
    }

    #[test]
    fn test_credential_flags_after_subcommand() {
        let args = CliArgs::parse_from(["blokgate", "health", "--access-token", "tok"]);
        assert!(matches!(args.command, Some(Command::Health)));
        assert_eq!(args.access_token.as_deref(), Some("tok"));
    }

    #[test]
    fn test_serve_defaults_to_stdio() {
        let args = CliArgs::parse_from(["blokgate", "serve"]);
        assert!(matches!(
            args.command,
            Some(Command::Serve {
                http: false,
                host: None,
                port: None
            })
        ));
    }

    #[test]
    fn test_serve_http() {
        let args = CliArgs::parse_from(["blokgate", "serve", "--http", "--port", "8080"]);
        assert!(matches!(
            args.command,
            Some(Command::Serve {
                http: true,
                port: Some(8080),
                ..
            })
        ));
    }

    #[test]
    fn test_call_command() {
        let args = CliArgs::parse_from([
            "blokgate",
            "call",
            "getStory",
            "--args",
            r#"{"storyId": 1}"#,
        ]);
        let Some(Command::Call { tool, args }) = args.command else {
            unreachable!("expected call command");
        };
        assert_eq!(tool, "getStory");
        assert_eq!(args, r#"{"storyId": 1}"#);
    }

    #[test]
    fn test_call_default_args() {
        let args = CliArgs::parse_from(["blokgate", "call", "getComponents"]);
        assert!(matches!(args.command, Some(Command::Call { ref args, .. }) if args == "{}"));
    }

    #[test]
    fn test_config_commands() {
        let args = CliArgs::parse_from(["blokgate", "config", "get", "server.port"]);
        assert!(matches!(
            args.command,
            Some(Command::Config(ConfigCommand {
                command: ConfigAction::Get { ref key }
            })) if key == "server.port"
        ));

        let args = CliArgs::parse_from(["blokgate", "config", "init", "--force"]);
        assert!(matches!(
            args.command,
            Some(Command::Config(ConfigCommand {
                command: ConfigAction::Init { force: true, .. }
            }))
        ));

        let args = CliArgs::parse_from(["blokgate", "config", "export", "--docker-env"]);
        assert!(matches!(
            args.command,
            Some(Command::Config(ConfigCommand {
                command: ConfigAction::Export { docker_env: true }
            }))
        ));
    }
}
