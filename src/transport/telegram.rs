//! Telegram Bot API client.

use crate::bot::{ChatId, Event, FileKind, Inbound, Outbox, Reply};
use crate::config::Settings;
use crate::error::{MediabotError, Result};
use crate::text::truncate;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Headroom on top of the long-poll timeout before the HTTP call gives up.
const POLL_GRACE_SECS: u64 = 10;

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub callback_query: Option<CallbackQuery>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FileRef {
    pub file_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    #[serde(default)]
    pub from: Option<User>,
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub document: Option<FileRef>,
    #[serde(default)]
    pub video: Option<FileRef>,
    #[serde(default)]
    pub audio: Option<FileRef>,
    /// Sizes in ascending order.
    #[serde(default)]
    pub photo: Option<Vec<FileRef>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    pub from: User,
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub data: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FileInfo {
    #[serde(default)]
    file_path: Option<String>,
}

/// An update sorted by what it needs before the bot can see it.
#[derive(Debug, Clone, PartialEq)]
pub enum Incoming {
    Ready(Inbound),
    /// Button press; the query must be answered.
    Callback { query_id: String, inbound: Inbound },
    /// Upload that must be fetched first.
    Upload {
        user: i64,
        chat: ChatId,
        file_id: String,
        kind: FileKind,
        caption: Option<String>,
    },
}

/// Sort an update. Updates the bot does not handle give `None`.
pub fn classify(update: Update) -> Option<Incoming> {
    if let Some(query) = update.callback_query {
        let chat = query.message.as_ref().map(|m| m.chat.id).unwrap_or(query.from.id);
        return Some(Incoming::Callback {
            inbound: Inbound {
                user: query.from.id,
                chat,
                event: Event::Button(query.data.unwrap_or_default()),
            },
            query_id: query.id,
        });
    }

    let message = update.message?;
    let chat = message.chat.id;
    let user = message.from.as_ref().map(|u| u.id).unwrap_or(chat);

    if let Some(text) = message.text {
        return Some(Incoming::Ready(Inbound::text(user, chat, &text)));
    }

    let (file_id, kind) = if let Some(doc) = message.document {
        (doc.file_id, FileKind::Document)
    } else if let Some(video) = message.video {
        (video.file_id, FileKind::Video)
    } else if let Some(audio) = message.audio {
        (audio.file_id, FileKind::Audio)
    } else if let Some(photo) = message.photo.and_then(|sizes| sizes.into_iter().last()) {
        (photo.file_id, FileKind::Photo)
    } else {
        debug!("Ignoring message {} without text or file", message.message_id);
        return None;
    };

    Some(Incoming::Upload {
        user,
        chat,
        file_id,
        kind,
        caption: message.caption,
    })
}

/// `sendMessage` body, with an inline keyboard when the reply carries a menu.
pub fn message_body(chat: ChatId, reply: &Reply, max_chars: usize) -> Value {
    let mut body = json!({
        "chat_id": chat,
        "text": truncate(&reply.text, max_chars),
    });
    if let Some(menu) = &reply.menu {
        let keyboard: Vec<Vec<Value>> = menu
            .iter()
            .map(|row| {
                row.iter()
                    .map(|b| json!({ "text": b.label, "callback_data": b.data }))
                    .collect()
            })
            .collect();
        body["reply_markup"] = json!({ "inline_keyboard": keyboard });
    }
    body
}

/// Local name for a downloaded file: the last segment of Telegram's path.
fn local_name(file_path: &str, file_id: &str) -> String {
    file_path
        .rsplit('/')
        .next()
        .filter(|s| !s.is_empty())
        .map(String::from)
        .unwrap_or_else(|| file_id.to_string())
}

pub struct TelegramClient {
    http: reqwest::Client,
    api_url: String,
    file_url: String,
    uploads_dir: PathBuf,
    max_message_chars: usize,
}

impl TelegramClient {
    pub fn new(api_base: &str, token: &str, uploads_dir: PathBuf, max_message_chars: usize) -> Result<Self> {
        let base = api_base.trim_end_matches('/');
        Ok(Self {
            http: reqwest::Client::builder().build()?,
            api_url: format!("{}/bot{}", base, token),
            file_url: format!("{}/file/bot{}", base, token),
            uploads_dir,
            max_message_chars,
        })
    }

    pub fn from_settings(settings: &Settings, token: &str) -> Result<Self> {
        Self::new(
            &settings.telegram.api_base,
            token,
            settings.uploads_dir(),
            settings.telegram.max_message_chars,
        )
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, body: &Value, timeout: Option<Duration>) -> Result<T> {
        let mut request = self.http.post(format!("{}/{}", self.api_url, method)).json(body);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }
        let response: ApiResponse<T> = request.send().await?.json().await?;

        if !response.ok {
            return Err(MediabotError::Transport(format!(
                "{} failed: {}",
                method,
                response.description.unwrap_or_else(|| "no description".to_string())
            )));
        }
        response
            .result
            .ok_or_else(|| MediabotError::Transport(format!("{} returned no result", method)))
    }

    /// Check the token. Returns the bot's username.
    pub async fn get_me(&self) -> Result<String> {
        let me: Value = self.call("getMe", &json!({}), None).await?;
        Ok(me["username"].as_str().unwrap_or("unknown").to_string())
    }

    /// Long-poll for updates after `offset`.
    pub async fn get_updates(&self, offset: i64, timeout_secs: u64) -> Result<Vec<Update>> {
        self.call(
            "getUpdates",
            &json!({
                "offset": offset,
                "timeout": timeout_secs,
                "allowed_updates": ["message", "callback_query"],
            }),
            Some(Duration::from_secs(timeout_secs + POLL_GRACE_SECS)),
        )
        .await
    }

    pub async fn send_message(&self, chat: ChatId, reply: &Reply) -> Result<()> {
        let _: Value = self
            .call("sendMessage", &message_body(chat, reply, self.max_message_chars), None)
            .await?;
        Ok(())
    }

    pub async fn answer_callback(&self, query_id: &str) -> Result<()> {
        let _: bool = self
            .call("answerCallbackQuery", &json!({ "callback_query_id": query_id }), None)
            .await?;
        Ok(())
    }

    /// Fetch an uploaded file into the uploads directory.
    #[instrument(skip(self))]
    pub async fn download_file(&self, file_id: &str) -> Result<PathBuf> {
        let info: FileInfo = self.call("getFile", &json!({ "file_id": file_id }), None).await?;
        let remote = info
            .file_path
            .ok_or_else(|| MediabotError::Transport("getFile returned no file_path".to_string()))?;

        let bytes = self
            .http
            .get(format!("{}/{}", self.file_url, remote))
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;

        let dest = self.uploads_dir.join(local_name(&remote, file_id));
        let dir = self.uploads_dir.clone();
        tokio::task::spawn_blocking(move || save_atomically(&dir, &dest, &bytes).map(|_| dest))
            .await
            .map_err(|e| MediabotError::Transport(e.to_string()))?
    }

    /// Turn an update into a bot event, answering callbacks and fetching
    /// uploads on the way.
    pub async fn prepare(&self, update: Update) -> Result<Option<Inbound>> {
        let Some(incoming) = classify(update) else {
            return Ok(None);
        };
        match incoming {
            Incoming::Ready(inbound) => Ok(Some(inbound)),
            Incoming::Callback { query_id, inbound } => {
                if let Err(e) = self.answer_callback(&query_id).await {
                    warn!("Could not answer callback {}: {}", query_id, e);
                }
                Ok(Some(inbound))
            }
            Incoming::Upload {
                user,
                chat,
                file_id,
                kind,
                caption,
            } => {
                let path = self.download_file(&file_id).await?;
                Ok(Some(Inbound {
                    user,
                    chat,
                    event: Event::File { path, kind, caption },
                }))
            }
        }
    }
}

/// Write through a temp file in the same directory so readers never see a
/// partial file.
fn save_atomically(dir: &Path, dest: &Path, bytes: &[u8]) -> Result<()> {
    std::fs::create_dir_all(dir)?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.persist(dest).map_err(|e| MediabotError::Io(e.error))?;
    Ok(())
}

#[async_trait]
impl Outbox for TelegramClient {
    async fn send(&self, chat: ChatId, reply: Reply) -> Result<()> {
        self.send_message(chat, &reply).await
    }
}
