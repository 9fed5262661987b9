//! mediabot - a chat bot that fetches and reworks media on request
//!
//! Users talk to the bot in plain words or through menus. An LLM agent decides
//! which media tool to call, and the bot replies with the result.
//!
//! # Overview
//!
//! mediabot can:
//! - Download video or audio from a link at a chosen quality
//! - Describe a video before downloading it
//! - Convert, trim and re-encode media files with ffmpeg
//! - Resize, compress and convert images
//! - Create and extract zip archives
//!
//! # Architecture
//!
//! - `config` - Settings and prompt templates
//! - `media` - Adapters over yt-dlp, ffmpeg, `image` and `zip`
//! - `tools` - Tool schemas, the registry and the built-in media tools
//! - `agent` - Bounded conversation memory and the tool-calling loop
//! - `session` - Per-user flow state and the session store
//! - `bot` - Commands, menus and routing shared by every transport
//! - `transport` - Telegram long polling, the webhook server and a console
//! - `app` - Wiring settings into a ready bot
//!
//! # Example
//!
//! ```rust,no_run
//! use mediabot::bot::Inbound;
//! use mediabot::config::Settings;
//! use mediabot::transport::console::ConsoleOutbox;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let bot = mediabot::app::build_bot(&settings)?;
//!
//!     let inbound = Inbound::text(0, 0, "https://youtu.be/dQw4w9WgXcQ");
//!     bot.handle(inbound, &ConsoleOutbox).await?;
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod app;
pub mod bot;
pub mod cli;
pub mod config;
pub mod error;
pub mod media;
pub mod openai;
pub mod session;
pub mod text;
pub mod tools;
pub mod transport;

pub use error::{MediabotError, Result};
