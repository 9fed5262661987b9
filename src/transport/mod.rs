//! Chat transports feeding the bot front end.

pub mod console;
pub mod telegram;
pub mod webhook;

use crate::bot::Bot;
use std::sync::Arc;
use std::time::Duration;
use telegram::{TelegramClient, Update};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Pause after a failed poll before trying again.
const POLL_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Handle one update on its own task.
///
/// Failures are logged; one user's error never stops the others.
pub fn spawn_update(bot: Arc<Bot>, client: Arc<TelegramClient>, update: Update) -> JoinHandle<()> {
    tokio::spawn(async move {
        let update_id = update.update_id;
        let inbound = match client.prepare(update).await {
            Ok(Some(inbound)) => inbound,
            Ok(None) => return,
            Err(e) => {
                warn!("Could not prepare update {}: {}", update_id, e);
                return;
            }
        };

        let chat = inbound.chat;
        if let Err(e) = bot.handle(inbound, client.as_ref()).await {
            error!("Update {} in chat {} failed: {}", update_id, chat, e);
        }
    })
}

/// Evict idle sessions every `every` until the task is aborted.
pub fn spawn_session_janitor(bot: Arc<Bot>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every.max(Duration::from_secs(1)));
        interval.tick().await;
        loop {
            interval.tick().await;
            let evicted = bot.sessions().evict_idle().await;
            if evicted > 0 {
                info!("Evicted {} idle session(s)", evicted);
            }
        }
    })
}

/// Long-poll Telegram until Ctrl+C.
pub async fn run_polling(bot: Arc<Bot>, client: Arc<TelegramClient>, poll_timeout_secs: u64) {
    let mut offset = 0;

    loop {
        let poll = tokio::select! {
            poll = client.get_updates(offset, poll_timeout_secs) => poll,
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down poller");
                return;
            }
        };

        match poll {
            Ok(updates) => {
                if !updates.is_empty() {
                    debug!("Received {} update(s)", updates.len());
                }
                for update in updates {
                    offset = offset.max(update.update_id + 1);
                    spawn_update(bot.clone(), client.clone(), update);
                }
            }
            Err(e) => {
                warn!("Polling failed: {}. Retrying in {:?}", e, POLL_RETRY_DELAY);
                tokio::time::sleep(POLL_RETRY_DELAY).await;
            }
        }
    }
}
