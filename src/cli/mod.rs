//! CLI module for mediabot.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// mediabot - a chat bot that downloads, converts and edits media
///
/// Messages go to an LLM agent that calls yt-dlp, ffmpeg and friends as tools.
#[derive(Parser, Debug)]
#[command(name = "mediabot")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the Telegram bot with long polling
    Run {
        /// Telegram bot token (overrides the config file)
        #[arg(long, env = "TELEGRAM_TOKEN", hide_env_values = true)]
        token: Option<String>,
    },

    /// Run the Telegram bot behind a webhook server
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(short, long, default_value = "8080")]
        port: u16,

        /// Telegram bot token (overrides the config file)
        #[arg(long, env = "TELEGRAM_TOKEN", hide_env_values = true)]
        token: Option<String>,
    },

    /// Talk to the bot in the terminal
    Chat {
        /// LLM model to use
        #[arg(short, long)]
        model: Option<String>,
    },

    /// List the tools the agent can call
    Tools {
        /// Print the function-calling JSON schemas
        #[arg(long)]
        json: bool,
    },

    /// Check system requirements and configuration
    Doctor,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., "llm.model")
        key: String,
        /// Configuration value
        value: String,
    },

    /// Open configuration file in editor
    Edit,

    /// Show configuration file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_serve() {
        let cli = Cli::try_parse_from(["mediabot", "-vv", "serve", "--port", "9000"]).unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Serve { port, host, .. } => {
                assert_eq!(port, 9000);
                assert_eq!(host, "127.0.0.1");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parse_config_set() {
        let cli = Cli::try_parse_from(["mediabot", "config", "set", "llm.model", "gpt-4o-mini"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Config { action: ConfigAction::Set { ref key, .. } } if key == "llm.model"
        ));
    }
}
