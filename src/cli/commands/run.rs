//! Long-polling bot command.

use crate::app::build_bot;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::error::Result;
use crate::transport::telegram::TelegramClient;
use crate::transport::{run_polling, spawn_session_janitor};
use std::sync::Arc;

/// Run the bot against the Telegram Bot API with long polling.
pub async fn run_bot(token: Option<&str>, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Bot, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'mediabot doctor' for detailed diagnostics.");
        return Err(e);
    }

    let token = settings.telegram_token(token)?;
    let bot = Arc::new(build_bot(&settings)?);
    let client = Arc::new(TelegramClient::from_settings(&settings, &token)?);

    let spinner = Output::spinner("Connecting to Telegram...");
    let username = client.get_me().await;
    spinner.finish_and_clear();
    let username = username?;

    Output::header("mediabot");
    println!();
    Output::success(&format!("Running as @{}", username));
    Output::kv("Model", &settings.llm.model);
    Output::kv("Tools", &bot.tool_count().to_string());
    Output::kv("Downloads", &settings.downloads_dir().display().to_string());
    println!();
    Output::info("Press Ctrl+C to stop the bot.");

    let janitor = spawn_session_janitor(bot.clone(), settings.agent.session_idle() / 4);
    run_polling(bot, client, settings.telegram.poll_timeout_seconds).await;
    janitor.abort();

    Output::info("Bot stopped.");
    Ok(())
}
