//! Routes inbound events to menus, session flows and the agent.

use super::menu::{back_menu, download_menu, main_menu, processing_menu, Action};
use super::message::{ChatId, Command, Event, FileKind, Inbound, Outbox, Reply};
use crate::agent::{Agent, AgentOutcome};
use crate::config::Prompts;
use crate::error::{MediabotError, Result};
use crate::media::{Quality, TargetFormat};
use crate::session::{FlowInput, SessionStore, UploadAction, UrlExtractor, UserContext, ARCHIVE_DONE};
use crate::text::FAILURE_MARKER;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

/// Replies shorter than this without a failure get the main menu attached.
const SHORT_REPLY_CHARS: usize = 200;

const WELCOME: &str = "🤖 Welcome to Smart Media Assistant!

I can:
📹 Download videos up to 4K from most sites
🔄 Convert between media formats
✂️ Trim videos
🖼️ Resize, compress and convert images
📦 Zip and unzip files

🚀 Send a link or pick an option below.";

const HELP: &str = "🆘 How to use me:

1️⃣ To download: send a link, then pick a quality.
2️⃣ For details: press \"📊 Detailed info\" after sending a link.
3️⃣ To convert: press \"🔄 Convert files\", pick a format, then send the file.
4️⃣ To trim: press \"✂️ Trim\", send the video, then send the start and end (e.g. 10 45 or 1:05 1:30).
5️⃣ To zip: press \"📦 Zip files\", send the files, then send done.

💡 You can also just write what you want in plain words.
Commands: /tools, /clear, /help";

const MISSING_LINK: &str = "No link found. Send a link first.";

/// Settings the front end needs beyond the agent.
#[derive(Debug, Clone)]
pub struct BotOptions {
    /// Where created archives are written.
    pub processed_dir: PathBuf,
    /// Bound on error causes shown to users.
    pub max_error_chars: usize,
}

/// The chat front end shared by every transport.
pub struct Bot {
    agent: Agent,
    sessions: SessionStore,
    prompts: Prompts,
    urls: UrlExtractor,
    options: BotOptions,
}

impl Bot {
    pub fn new(agent: Agent, sessions: SessionStore, prompts: Prompts, options: BotOptions) -> Self {
        Self {
            agent,
            sessions,
            prompts,
            urls: UrlExtractor::new(),
            options,
        }
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Handle one event, sending every reply through `outbox`.
    ///
    /// Holds the user's context for the whole event.
    #[instrument(skip(self, outbox), fields(user = inbound.user))]
    pub async fn handle(&self, inbound: Inbound, outbox: &dyn Outbox) -> Result<()> {
        let user = inbound.user;
        let clears = inbound.event == Event::Command(Command::Clear);
        let shared = self.sessions.context(user).await;

        let result = {
            let mut ctx = shared.lock().await;
            ctx.touch();

            let chat = inbound.chat;
            match inbound.event {
                Event::Command(cmd) => self.on_command(cmd, chat, &mut ctx, outbox).await,
                Event::Text(text) => self.on_text(&text, chat, &mut ctx, outbox).await,
                Event::Button(data) => self.on_button(&data, chat, &mut ctx, outbox).await,
                Event::File { path, kind, caption } => {
                    self.on_file(path, kind, caption, chat, &mut ctx, outbox).await
                }
            }
        };

        if clears {
            drop(shared);
            self.sessions.remove(user).await;
        }
        result
    }

    async fn on_command(
        &self,
        cmd: Command,
        chat: ChatId,
        ctx: &mut UserContext,
        outbox: &dyn Outbox,
    ) -> Result<()> {
        debug!("Command {:?}", cmd);
        match cmd {
            Command::Start => outbox.send(chat, Reply::with_menu(WELCOME, main_menu())).await,
            Command::Help => outbox.send(chat, Reply::with_menu(self.tools_info(), main_menu())).await,
            Command::Tools => outbox.send(chat, Reply::text(self.tools_info())).await,
            Command::Clear => {
                ctx.clear();
                info!("Session cleared");
                outbox
                    .send(chat, Reply::text("🧹 Conversation memory and session cleared."))
                    .await
            }
            Command::Unknown(name) => {
                outbox
                    .send(chat, Reply::text(format!("Unknown command /{}. Try /help.", name)))
                    .await
            }
        }
    }

    async fn on_text(&self, text: &str, chat: ChatId, ctx: &mut UserContext, outbox: &dyn Outbox) -> Result<()> {
        if text.trim().is_empty() {
            return outbox
                .send(chat, Reply::text(format!("{} I can't process this message.", FAILURE_MARKER)))
                .await;
        }

        // A link always wins over flow input; the pending operation stays as is.
        if let Some(url) = self.urls.extract(text) {
            info!("Link detected: {}", url);
            ctx.state.observe_url(url.clone());
            outbox
                .send(chat, Reply::text("🔗 Link detected! Fetching the details..."))
                .await?;

            let instruction = self
                .prompts
                .fill(&self.prompts.instructions.media_info, &[("url", &url)]);
            let answer = self.ask_agent(&instruction, ctx).await;
            outbox.send(chat, Reply::text(answer)).await?;

            ctx.state.offer_quality();
            return outbox
                .send(chat, Reply::with_menu("🎯 Choose what to do:", download_menu()))
                .await;
        }

        if let Some(flow) = ctx.state.on_text(text) {
            return self.on_flow_input(flow, chat, ctx, outbox).await;
        }

        outbox.send(chat, Reply::text("🤖 Working on it...")).await?;
        let answer = self.ask_agent(text, ctx).await;
        let offer_menu = answer.chars().count() < SHORT_REPLY_CHARS && !answer.contains(FAILURE_MARKER);
        outbox.send(chat, Reply::text(answer)).await?;
        if offer_menu {
            outbox
                .send(chat, Reply::with_menu("💡 Or use the menu:", main_menu()))
                .await?;
        }
        Ok(())
    }

    async fn on_button(&self, data: &str, chat: ChatId, ctx: &mut UserContext, outbox: &dyn Outbox) -> Result<()> {
        let Some(action) = Action::parse(data) else {
            warn!("Unknown button data: {}", data);
            return outbox
                .send(chat, Reply::text(format!("{} This button is no longer supported.", FAILURE_MARKER)))
                .await;
        };
        debug!("Button {:?}", action);

        match action {
            Action::BackToMain => {
                outbox
                    .send(chat, Reply::with_menu("🏠 Main menu, pick a service:", main_menu()))
                    .await
            }
            Action::ShowTools => outbox.send(chat, Reply::with_menu(self.tools_info(), back_menu())).await,
            Action::ShowHelp => outbox.send(chat, Reply::with_menu(HELP, back_menu())).await,
            Action::ModeDownload => {
                ctx.state.offer_quality();
                outbox
                    .send(chat, Reply::with_menu("📹 Pick a download quality:", download_menu()))
                    .await
            }
            Action::ModeConvert | Action::ModeEdit => {
                outbox
                    .send(chat, Reply::with_menu("🔄 Pick an operation:", processing_menu()))
                    .await
            }
            Action::ModeInfo | Action::DetailedInfo => self.detailed_info(chat, ctx, outbox).await,
            Action::ModeImage => {
                outbox
                    .send(
                        chat,
                        Reply::text("🖼️ Send an image and tell me what to do: resize, compress or convert."),
                    )
                    .await
            }
            Action::ModeZip => {
                ctx.state.begin_archive();
                outbox
                    .send(
                        chat,
                        Reply::text(format!(
                            "📦 Send the files to zip, then send {} when finished.",
                            ARCHIVE_DONE
                        )),
                    )
                    .await
            }
            Action::Download(quality) => self.download(quality, chat, ctx, outbox).await,
            Action::Convert(format) => {
                ctx.state.begin_convert(format);
                outbox
                    .send(
                        chat,
                        Reply::text(format!(
                            "🔄 Send the file to convert to {}",
                            format.extension().to_uppercase()
                        )),
                    )
                    .await
            }
            Action::Trim | Action::ExtractSegment => {
                ctx.state.begin_trim();
                outbox
                    .send(chat, Reply::text("✂️ Send the video you want to cut."))
                    .await
            }
            Action::Compress => {
                outbox
                    .send(
                        chat,
                        Reply::text("🗜️ Send an image or video and say how small it should be."),
                    )
                    .await
            }
            Action::Enhance => {
                outbox
                    .send(
                        chat,
                        Reply::text("✨ Send the file and describe the result you want."),
                    )
                    .await
            }
        }
    }

    /// Run a quality choice against the pending link, then consume it.
    async fn download(&self, quality: Quality, chat: ChatId, ctx: &mut UserContext, outbox: &dyn Outbox) -> Result<()> {
        let url = match ctx.state.require_url() {
            Ok(url) => url,
            Err(e) => return self.missing_link(e, chat, outbox).await,
        };

        outbox
            .send(chat, Reply::text(format!("⚡ Downloading {}...", quality.label())))
            .await?;

        let template = if quality.is_audio() {
            &self.prompts.instructions.download_audio
        } else {
            &self.prompts.instructions.download_video
        };
        let instruction = self
            .prompts
            .fill(template, &[("url", &url), ("quality", quality.as_str())]);
        let answer = self.ask_agent(&instruction, ctx).await;
        outbox.send(chat, Reply::text(answer)).await?;

        ctx.state.consume_url();
        Ok(())
    }

    async fn detailed_info(&self, chat: ChatId, ctx: &mut UserContext, outbox: &dyn Outbox) -> Result<()> {
        let url = match ctx.state.require_url() {
            Ok(url) => url,
            Err(e) => return self.missing_link(e, chat, outbox).await,
        };
        let instruction = self
            .prompts
            .fill(&self.prompts.instructions.media_info, &[("url", &url)]);
        let answer = self.ask_agent(&instruction, ctx).await;
        outbox.send(chat, Reply::text(answer)).await
    }

    async fn missing_link(&self, err: MediabotError, chat: ChatId, outbox: &dyn Outbox) -> Result<()> {
        debug!("{}", err);
        outbox
            .send(chat, Reply::text(format!("{} {}", FAILURE_MARKER, MISSING_LINK)))
            .await
    }

    async fn on_file(
        &self,
        path: PathBuf,
        kind: FileKind,
        caption: Option<String>,
        chat: ChatId,
        ctx: &mut UserContext,
        outbox: &dyn Outbox,
    ) -> Result<()> {
        info!("Received {} at {:?}", kind, path);

        match ctx.state.on_upload(path) {
            UploadAction::Describe(path) => {
                let mut instruction = self.prompts.fill(
                    &self.prompts.instructions.file_uploaded,
                    &[("kind", &kind.to_string()), ("path", &display(&path))],
                );
                if let Some(caption) = caption.filter(|c| !c.trim().is_empty()) {
                    instruction.push_str("\nThe user wrote: ");
                    instruction.push_str(&caption);
                }
                let answer = self.ask_agent(&instruction, ctx).await;
                outbox
                    .send(chat, Reply::text(format!("📁 Got your {}!\n\n{}", kind, answer)))
                    .await?;
                outbox
                    .send(chat, Reply::with_menu("🛠️ Processing options:", processing_menu()))
                    .await
            }
            UploadAction::Convert { path, format } => self.convert(&path, format, chat, ctx, outbox).await,
            UploadAction::AwaitTrimWindow(_) => {
                outbox
                    .send(
                        chat,
                        Reply::text("✂️ Got it. Now send the start and end, e.g. 10 45 or 1:05 1:30."),
                    )
                    .await
            }
            UploadAction::Collected(count) => {
                outbox
                    .send(
                        chat,
                        Reply::text(format!(
                            "📦 Added ({} file(s) so far). Send more or send {}.",
                            count, ARCHIVE_DONE
                        )),
                    )
                    .await
            }
        }
    }

    async fn convert(
        &self,
        path: &Path,
        format: TargetFormat,
        chat: ChatId,
        ctx: &mut UserContext,
        outbox: &dyn Outbox,
    ) -> Result<()> {
        outbox
            .send(
                chat,
                Reply::text(format!("🔄 Converting to {}...", format.extension().to_uppercase())),
            )
            .await?;
        let instruction = self.prompts.fill(
            &self.prompts.instructions.convert_file,
            &[("path", &display(path)), ("format", format.extension())],
        );
        let answer = self.ask_agent(&instruction, ctx).await;
        outbox.send(chat, Reply::text(answer)).await
    }

    async fn on_flow_input(
        &self,
        flow: FlowInput,
        chat: ChatId,
        ctx: &mut UserContext,
        outbox: &dyn Outbox,
    ) -> Result<()> {
        match flow {
            FlowInput::Trim { path, start, end } => {
                let instruction = self.prompts.fill(
                    &self.prompts.instructions.trim_video,
                    &[
                        ("path", &display(&path)),
                        ("start", &start.to_string()),
                        ("end", &end.to_string()),
                    ],
                );
                outbox.send(chat, Reply::text("✂️ Trimming...")).await?;
                let answer = self.ask_agent(&instruction, ctx).await;
                outbox.send(chat, Reply::text(answer)).await
            }
            FlowInput::TrimUsage => {
                outbox
                    .send(
                        chat,
                        Reply::text("⏱️ Send the start and end like 10 45 or 1:05 1:30. Use /clear to cancel."),
                    )
                    .await
            }
            FlowInput::Archive(files) => {
                let output = self.archive_path();
                let list = files.iter().map(|f| display(f)).collect::<Vec<_>>().join(", ");
                let instruction = self.prompts.fill(
                    &self.prompts.instructions.create_archive,
                    &[("output", &display(&output)), ("files", &list)],
                );
                outbox.send(chat, Reply::text("📦 Creating the archive...")).await?;
                let answer = self.ask_agent(&instruction, ctx).await;
                outbox.send(chat, Reply::text(answer)).await
            }
            FlowInput::ArchiveEmpty => {
                outbox
                    .send(
                        chat,
                        Reply::text(format!("{} No files yet. Send at least one file first.", FAILURE_MARKER)),
                    )
                    .await
            }
        }
    }

    /// Run the agent, turning any failure into user-facing text.
    async fn ask_agent(&self, input: &str, ctx: &mut UserContext) -> String {
        match self.agent.run(input, &mut ctx.memory).await {
            Ok(response) => {
                if response.outcome == AgentOutcome::Aborted {
                    warn!("Agent aborted after {} iterations", response.iterations);
                }
                for call in &response.tool_calls {
                    debug!("Tool call {}", call);
                }
                response.content
            }
            Err(e) => {
                warn!("Agent failed: {}", e);
                e.user_message(self.options.max_error_chars)
            }
        }
    }

    fn archive_path(&self) -> PathBuf {
        let stamp = chrono::Utc::now().format("%Y%m%d_%H%M%S");
        self.options.processed_dir.join(format!("archive_{}.zip", stamp))
    }

    pub fn tool_count(&self) -> usize {
        self.agent.tools().len()
    }

    /// Names and descriptions of the registered tools.
    pub fn tools_info(&self) -> String {
        let mut out = String::from("🛠️ Available tools:\n");
        for spec in self.agent.tools().specs() {
            out.push_str(&format!("\n• {}: {}", spec.name, spec.description));
        }
        out.push_str("\n\n");
        out.push_str(HELP);
        out
    }
}

fn display(path: &Path) -> String {
    path.display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{ChatModel, ModelReply, ModelRequest, ToolCallRequest};
    use crate::session::{PendingOperation, Stage};
    use crate::tools::{ParamKind, ParamSpec, ToolHandler, ToolOutcome, ToolRegistry, ToolSpec};
    use async_trait::async_trait;
    use serde_json::Value;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// Answers with the input it was given, so tests can see the instruction.
    struct EchoModel;

    #[async_trait]
    impl ChatModel for EchoModel {
        async fn next_action(&self, request: &ModelRequest) -> Result<ModelReply> {
            Ok(ModelReply::Final(format!("echo: {}", request.input)))
        }
    }

    /// Always asks for a tool, never answers.
    struct LoopingModel;

    #[async_trait]
    impl ChatModel for LoopingModel {
        async fn next_action(&self, _request: &ModelRequest) -> Result<ModelReply> {
            Ok(ModelReply::ToolCalls(vec![ToolCallRequest {
                id: "c".into(),
                name: "noop".into(),
                arguments: "{}".into(),
            }]))
        }
    }

    struct Noop;

    #[async_trait]
    impl ToolHandler for Noop {
        async fn call(&self, _args: Value) -> ToolOutcome {
            ToolOutcome::success("ok")
        }
    }

    #[derive(Default)]
    struct CollectingOutbox {
        sent: Mutex<Vec<(ChatId, Reply)>>,
    }

    impl CollectingOutbox {
        fn texts(&self) -> Vec<String> {
            self.sent.lock().unwrap().iter().map(|(_, r)| r.text.clone()).collect()
        }

        fn last(&self) -> Reply {
            self.sent.lock().unwrap().last().map(|(_, r)| r.clone()).unwrap()
        }
    }

    #[async_trait]
    impl Outbox for CollectingOutbox {
        async fn send(&self, chat: ChatId, reply: Reply) -> Result<()> {
            self.sent.lock().unwrap().push((chat, reply));
            Ok(())
        }
    }

    fn bot_with(model: Arc<dyn ChatModel>) -> Bot {
        let mut registry = ToolRegistry::new();
        registry
            .register(
                ToolSpec::new("noop", "Does nothing").param(ParamSpec::optional("x", ParamKind::String, "x")),
                Arc::new(Noop),
            )
            .unwrap();
        let agent = Agent::new(model, Arc::new(registry), "sys").with_max_iterations(3);
        Bot::new(
            agent,
            SessionStore::new(20, Duration::from_secs(3600)),
            Prompts::default(),
            BotOptions {
                processed_dir: PathBuf::from("/tmp/mediabot-test"),
                max_error_chars: 100,
            },
        )
    }

    fn bot() -> Bot {
        bot_with(Arc::new(EchoModel))
    }

    async fn send(bot: &Bot, outbox: &CollectingOutbox, event: Event) {
        bot.handle(Inbound { user: 1, chat: 10, event }, outbox).await.unwrap();
    }

    async fn snapshot(bot: &Bot) -> (Option<String>, PendingOperation, Stage, usize) {
        let shared = bot.sessions().context(1).await;
        let ctx = shared.lock().await;
        (
            ctx.state.pending_url().map(String::from),
            ctx.state.pending_operation(),
            ctx.state.stage(),
            ctx.memory.len(),
        )
    }

    #[tokio::test]
    async fn test_link_fetches_info_and_offers_qualities() {
        let bot = bot();
        let outbox = CollectingOutbox::default();

        send(&bot, &outbox, Event::Text("look https://youtu.be/abc".into())).await;

        let texts = outbox.texts();
        assert_eq!(texts.len(), 3);
        assert!(texts[1].contains("https://youtu.be/abc"));
        assert_eq!(outbox.last().menu, Some(download_menu()));

        let (url, _, stage, _) = snapshot(&bot).await;
        assert_eq!(url.as_deref(), Some("https://youtu.be/abc"));
        assert_eq!(stage, Stage::AwaitingQualityChoice);
    }

    #[tokio::test]
    async fn test_quality_button_uses_and_consumes_link() {
        let bot = bot();
        let outbox = CollectingOutbox::default();

        send(&bot, &outbox, Event::Text("https://youtu.be/abc".into())).await;
        send(&bot, &outbox, Event::Button("download_audio_high".into())).await;

        let answer = outbox.last().text;
        assert!(answer.contains("audio"));
        assert!(answer.contains("audio_high"));
        assert!(answer.contains("https://youtu.be/abc"));

        let (url, _, stage, _) = snapshot(&bot).await;
        assert_eq!(url, None);
        assert_eq!(stage, Stage::Idle);
    }

    #[tokio::test]
    async fn test_quality_button_without_link_asks_for_one() {
        let bot = bot();
        let outbox = CollectingOutbox::default();

        send(&bot, &outbox, Event::Button("download_ultra".into())).await;

        assert_eq!(outbox.texts(), vec![format!("❌ {}", MISSING_LINK)]);
        let (_, _, _, memory) = snapshot(&bot).await;
        assert_eq!(memory, 0);
    }

    #[tokio::test]
    async fn test_convert_flow_feeds_upload_to_agent() {
        let bot = bot();
        let outbox = CollectingOutbox::default();

        send(&bot, &outbox, Event::Button("convert_mp3".into())).await;
        let (_, op, stage, _) = snapshot(&bot).await;
        assert_eq!(op, PendingOperation::Convert);
        assert_eq!(stage, Stage::AwaitingOperationInput);

        send(
            &bot,
            &outbox,
            Event::File {
                path: "uploads/song.mp4".into(),
                kind: FileKind::Video,
                caption: None,
            },
        )
        .await;

        let answer = outbox.last().text;
        assert!(answer.contains("uploads/song.mp4"));
        assert!(answer.contains("mp3"));
        let (_, op, _, _) = snapshot(&bot).await;
        assert_eq!(op, PendingOperation::Idle);
    }

    #[tokio::test]
    async fn test_clear_then_plain_text_has_no_stale_operation() {
        let bot = bot();
        let outbox = CollectingOutbox::default();

        send(&bot, &outbox, Event::Text("https://youtu.be/abc".into())).await;
        send(&bot, &outbox, Event::Button("edit_trim".into())).await;
        send(&bot, &outbox, Event::Command(Command::Clear)).await;

        let (url, op, stage, memory) = snapshot(&bot).await;
        assert_eq!((url, op, stage, memory), (None, PendingOperation::Idle, Stage::Idle, 0));

        send(&bot, &outbox, Event::Text("hello there".into())).await;
        let texts = outbox.texts();
        assert!(texts.iter().any(|t| t == "echo: hello there"));
        let (url, op, _, memory) = snapshot(&bot).await;
        assert_eq!(url, None);
        assert_eq!(op, PendingOperation::Idle);
        assert_eq!(memory, 2);
    }

    #[tokio::test]
    async fn test_clear_forgets_the_user() {
        let bot = bot();
        let outbox = CollectingOutbox::default();

        send(&bot, &outbox, Event::Text("https://youtu.be/abc".into())).await;
        assert_eq!(bot.sessions().len().await, 1);

        send(&bot, &outbox, Event::Command(Command::Clear)).await;
        assert!(bot.sessions().is_empty().await);
    }

    #[tokio::test]
    async fn test_plain_text_keeps_pending_link() {
        let bot = bot();
        let outbox = CollectingOutbox::default();

        send(&bot, &outbox, Event::Text("https://youtu.be/abc".into())).await;
        send(&bot, &outbox, Event::Text("what is this video about".into())).await;

        assert!(outbox.texts().iter().any(|t| t == "echo: what is this video about"));
        let (url, op, _, _) = snapshot(&bot).await;
        assert_eq!(url.as_deref(), Some("https://youtu.be/abc"));
        assert_eq!(op, PendingOperation::Idle);
    }

    #[tokio::test]
    async fn test_link_during_trim_is_picked_up() {
        let bot = bot();
        let outbox = CollectingOutbox::default();

        send(&bot, &outbox, Event::Button("edit_trim".into())).await;
        send(
            &bot,
            &outbox,
            Event::File {
                path: "uploads/clip.mp4".into(),
                kind: FileKind::Video,
                caption: None,
            },
        )
        .await;
        send(&bot, &outbox, Event::Text("actually grab https://youtu.be/abc instead".into())).await;

        assert_eq!(outbox.last().menu, Some(download_menu()));
        let (url, op, stage, _) = snapshot(&bot).await;
        assert_eq!(url.as_deref(), Some("https://youtu.be/abc"));
        assert_eq!(op, PendingOperation::Trim);
        assert_eq!(stage, Stage::AwaitingQualityChoice);

        // The trim still accepts its window afterwards.
        send(&bot, &outbox, Event::Text("5 12".into())).await;
        let answer = outbox.last().text;
        assert!(answer.contains("uploads/clip.mp4"));
        let (url, op, _, _) = snapshot(&bot).await;
        assert_eq!(op, PendingOperation::Idle);
        assert_eq!(url.as_deref(), Some("https://youtu.be/abc"));
    }

    #[tokio::test]
    async fn test_archive_flow_collects_until_done() {
        let bot = bot();
        let outbox = CollectingOutbox::default();

        send(&bot, &outbox, Event::Button("mode_zip".into())).await;
        for name in ["a.txt", "b.txt"] {
            send(
                &bot,
                &outbox,
                Event::File {
                    path: PathBuf::from("uploads").join(name),
                    kind: FileKind::Document,
                    caption: None,
                },
            )
            .await;
        }
        assert!(outbox.last().text.contains("2 file(s)"));

        send(&bot, &outbox, Event::Text("done".into())).await;
        let answer = outbox.last().text;
        assert!(answer.contains("uploads/a.txt, uploads/b.txt"));
        assert!(answer.contains("archive_"));
    }

    #[tokio::test]
    async fn test_aborted_agent_reply_is_marked() {
        let bot = bot_with(Arc::new(LoopingModel));
        let outbox = CollectingOutbox::default();

        send(&bot, &outbox, Event::Text("do something".into())).await;

        let texts = outbox.texts();
        assert_eq!(texts.len(), 2);
        assert!(texts[1].starts_with("❌"));
    }

    #[tokio::test]
    async fn test_unknown_button_is_reported() {
        let bot = bot();
        let outbox = CollectingOutbox::default();
        send(&bot, &outbox, Event::Button("self_destruct".into())).await;
        assert!(outbox.last().text.starts_with("❌"));
    }

    #[tokio::test]
    async fn test_start_shows_main_menu() {
        let bot = bot();
        let outbox = CollectingOutbox::default();
        send(&bot, &outbox, Event::Command(Command::Start)).await;
        assert_eq!(outbox.last().menu, Some(main_menu()));

        send(&bot, &outbox, Event::Command(Command::Tools)).await;
        assert!(outbox.last().text.contains("• noop: Does nothing"));
    }
}
