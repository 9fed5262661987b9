//! Wiring settings into a ready bot.

use crate::agent::{Agent, ChatModel, OpenAiModel};
use crate::bot::{Bot, BotOptions};
use crate::config::{Prompts, Settings};
use crate::error::Result;
use crate::session::SessionStore;
use crate::tools::default_registry;
use std::sync::Arc;
use tracing::info;

/// Build the bot with the configured chat model.
pub fn build_bot(settings: &Settings) -> Result<Bot> {
    let model = OpenAiModel::from_settings(&settings.llm)?;
    build_bot_with_model(settings, Arc::new(model))
}

/// Build the bot around any model.
pub fn build_bot_with_model(settings: &Settings, model: Arc<dyn ChatModel>) -> Result<Bot> {
    settings.ensure_dirs()?;

    let prompts = Prompts::load(
        settings.prompts.custom_dir.as_deref(),
        Some(&settings.prompts.variables),
    )?;

    let registry = default_registry(settings)?;
    info!("Registered {} tools", registry.len());

    let agent = Agent::new(model, Arc::new(registry), &prompts.system())
        .with_max_iterations(settings.agent.max_iterations)
        .with_max_error_chars(settings.media.max_tool_error_chars);

    let sessions = SessionStore::new(settings.agent.memory_capacity(), settings.agent.session_idle());

    Ok(Bot::new(
        agent,
        sessions,
        prompts,
        BotOptions {
            processed_dir: settings.processed_dir(),
            max_error_chars: settings.agent.max_error_chars,
        },
    ))
}
