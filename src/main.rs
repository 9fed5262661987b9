//! mediabot CLI entry point.

use anyhow::Result;
use clap::Parser;
use mediabot::cli::{commands, Cli, Commands};
use mediabot::config::Settings;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli
        .config
        .as_deref()
        .map(Settings::expand_path)
        .unwrap_or_else(Settings::default_config_path);
    let settings = Settings::load_from(Some(&config_path))?;

    // -v flags win over the configured level
    let log_level = match cli.verbose {
        0 => settings.general.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("mediabot={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    match &cli.command {
        Commands::Run { token } => {
            commands::run_bot(token.as_deref(), settings).await?;
        }
        Commands::Serve { host, port, token } => {
            commands::run_serve(host, *port, token.as_deref(), settings).await?;
        }
        Commands::Chat { model } => {
            commands::run_chat(model.clone(), settings).await?;
        }
        Commands::Tools { json } => {
            commands::run_tools(*json, &settings)?;
        }
        Commands::Doctor => {
            commands::run_doctor(&settings, &config_path)?;
        }
        Commands::Config { action } => {
            commands::run_config(action, settings, config_path.clone())?;
        }
    }

    Ok(())
}
