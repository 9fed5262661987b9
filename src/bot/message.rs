//! Transport-neutral inbound events and replies.

use super::menu::Menu;
use crate::error::Result;
use crate::session::UserId;
use async_trait::async_trait;
use std::path::PathBuf;

/// Chat to reply into.
pub type ChatId = i64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    Tools,
    Clear,
    Unknown(String),
}

impl Command {
    /// Parse `/name` or `/name@botname`, ignoring any arguments.
    pub fn parse(text: &str) -> Option<Self> {
        let word = text.trim().split_whitespace().next()?.strip_prefix('/')?;
        let name = word.split('@').next().unwrap_or(word).to_lowercase();
        Some(match name.as_str() {
            "start" => Command::Start,
            "help" => Command::Help,
            "tools" => Command::Tools,
            "clear" => Command::Clear,
            _ => Command::Unknown(name),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Document,
    Video,
    Audio,
    Photo,
}

impl std::fmt::Display for FileKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FileKind::Document => "document",
            FileKind::Video => "video",
            FileKind::Audio => "audio file",
            FileKind::Photo => "photo",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Command(Command),
    Text(String),
    /// Callback data of a pressed button.
    Button(String),
    /// A file already saved locally.
    File {
        path: PathBuf,
        kind: FileKind,
        caption: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Inbound {
    pub user: UserId,
    pub chat: ChatId,
    pub event: Event,
}

impl Inbound {
    /// Text event, or a command when the text starts with `/`.
    pub fn text(user: UserId, chat: ChatId, text: &str) -> Self {
        let event = match Command::parse(text) {
            Some(cmd) => Event::Command(cmd),
            None => Event::Text(text.to_string()),
        };
        Self { user, chat, event }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Reply {
    pub text: String,
    pub menu: Option<Menu>,
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            menu: None,
        }
    }

    pub fn with_menu(text: impl Into<String>, menu: Menu) -> Self {
        Self {
            text: text.into(),
            menu: Some(menu),
        }
    }
}

/// Where replies go.
#[async_trait]
pub trait Outbox: Send + Sync {
    async fn send(&self, chat: ChatId, reply: Reply) -> Result<()>;
}
