//! Webhook server command.
//!
//! Telegram pushes updates to the webhook endpoint instead of being polled.
//! Register the public URL yourself with `setWebhook`.

use crate::app::build_bot;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::error::Result;
use crate::transport::spawn_session_janitor;
use crate::transport::telegram::TelegramClient;
use crate::transport::webhook::{router, WEBHOOK_PATH};
use std::sync::Arc;

/// Run the webhook server.
pub async fn run_serve(host: &str, port: u16, token: Option<&str>, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Bot, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'mediabot doctor' for detailed diagnostics.");
        return Err(e);
    }

    let token = settings.telegram_token(token)?;
    let bot = Arc::new(build_bot(&settings)?);
    let client = Arc::new(TelegramClient::from_settings(&settings, &token)?);
    let secret = settings.telegram.webhook_secret.clone();

    let janitor = spawn_session_janitor(bot.clone(), settings.agent.session_idle() / 4);
    let app = router(bot, client, secret.clone());

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("mediabot webhook server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET  /health");
    Output::kv("Telegram", &format!("POST {}", WEBHOOK_PATH));
    println!();
    if secret.is_none() {
        Output::warning("No telegram.webhook_secret set; any caller can post updates.");
    }
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;
    janitor.abort();

    Ok(())
}
