//! Configuration module for mediabot.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{AgentPrompts, InstructionPrompts, Prompts};
pub use settings::{
    AgentSettings, GeneralSettings, LlmSettings, MediaSettings, PromptSettings, Settings,
    TelegramSettings,
};
