//! Per-user session state machine.

use crate::error::{MediabotError, Result};
use crate::media::TargetFormat;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Multi-step operation waiting for user input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PendingOperation {
    #[default]
    Idle,
    Convert,
    Trim,
    Archive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Stage {
    #[default]
    Idle,
    UrlPending,
    AwaitingQualityChoice,
    AwaitingOperationInput,
}

/// What to do with a file the user just uploaded.
#[derive(Debug, Clone, PartialEq)]
pub enum UploadAction {
    /// No flow is waiting; ask the agent what can be done with it.
    Describe(PathBuf),
    Convert { path: PathBuf, format: TargetFormat },
    /// Trim source stored; the time window comes next.
    AwaitTrimWindow(PathBuf),
    /// File added to the archive list, which now holds this many files.
    Collected(usize),
}

/// What to do with a text message while a flow is waiting.
#[derive(Debug, Clone, PartialEq)]
pub enum FlowInput {
    Trim { path: PathBuf, start: f64, end: f64 },
    /// The trim window could not be read.
    TrimUsage,
    Archive(Vec<PathBuf>),
    /// `done` arrived before any file.
    ArchiveEmpty,
}

const PARAM_FORMAT: &str = "format";
const PARAM_FILE: &str = "file";

/// Word that closes an archive collection.
pub const ARCHIVE_DONE: &str = "done";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    pending_url: Option<String>,
    pending_operation: PendingOperation,
    operation_params: BTreeMap<String, String>,
    collected: Vec<PathBuf>,
    stage: Stage,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn pending_url(&self) -> Option<&str> {
        self.pending_url.as_deref()
    }

    pub fn pending_operation(&self) -> PendingOperation {
        self.pending_operation
    }

    pub fn operation_param(&self, name: &str) -> Option<&str> {
        self.operation_params.get(name).map(String::as_str)
    }

    /// A link arrived in free text. Replaces any earlier link and keeps the
    /// pending operation.
    pub fn observe_url(&mut self, url: String) {
        self.pending_url = Some(url);
        self.stage = Stage::UrlPending;
    }

    /// The quality menu was shown for the pending link.
    pub fn offer_quality(&mut self) {
        if self.pending_url.is_some() {
            self.stage = Stage::AwaitingQualityChoice;
        }
    }

    /// The pending link, or `SessionStateMissing` when there is none.
    pub fn require_url(&self) -> Result<String> {
        self.pending_url
            .clone()
            .ok_or_else(|| MediabotError::SessionStateMissing("link".to_string()))
    }

    /// The download for the pending link was delivered.
    pub fn consume_url(&mut self) {
        self.pending_url = None;
        self.settle();
    }

    pub fn begin_convert(&mut self, format: TargetFormat) {
        self.begin(PendingOperation::Convert);
        self.operation_params
            .insert(PARAM_FORMAT.to_string(), format.extension().to_string());
    }

    pub fn begin_trim(&mut self) {
        self.begin(PendingOperation::Trim);
    }

    pub fn begin_archive(&mut self) {
        self.begin(PendingOperation::Archive);
    }

    fn begin(&mut self, operation: PendingOperation) {
        self.pending_operation = operation;
        self.operation_params.clear();
        self.collected.clear();
        self.stage = Stage::AwaitingOperationInput;
    }

    /// Route an uploaded file through the pending operation.
    pub fn on_upload(&mut self, path: PathBuf) -> UploadAction {
        match self.pending_operation {
            PendingOperation::Idle => UploadAction::Describe(path),
            PendingOperation::Convert => {
                let format = self
                    .operation_param(PARAM_FORMAT)
                    .and_then(TargetFormat::parse)
                    .unwrap_or(TargetFormat::Mp3);
                self.finish_operation();
                UploadAction::Convert { path, format }
            }
            PendingOperation::Trim => {
                self.operation_params
                    .insert(PARAM_FILE.to_string(), path.display().to_string());
                UploadAction::AwaitTrimWindow(path)
            }
            PendingOperation::Archive => {
                self.collected.push(path);
                UploadAction::Collected(self.collected.len())
            }
        }
    }

    /// Offer a text message to the pending operation.
    ///
    /// Returns `None` when no flow wants the text, so it goes to the agent.
    pub fn on_text(&mut self, text: &str) -> Option<FlowInput> {
        match self.pending_operation {
            PendingOperation::Trim => {
                let path = PathBuf::from(self.operation_param(PARAM_FILE)?);
                match parse_window(text) {
                    Some((start, end)) => {
                        self.finish_operation();
                        Some(FlowInput::Trim { path, start, end })
                    }
                    None => Some(FlowInput::TrimUsage),
                }
            }
            PendingOperation::Archive if text.trim().eq_ignore_ascii_case(ARCHIVE_DONE) => {
                if self.collected.is_empty() {
                    return Some(FlowInput::ArchiveEmpty);
                }
                let files = std::mem::take(&mut self.collected);
                self.finish_operation();
                Some(FlowInput::Archive(files))
            }
            _ => None,
        }
    }

    fn finish_operation(&mut self) {
        self.pending_operation = PendingOperation::Idle;
        self.operation_params.clear();
        self.collected.clear();
        self.settle();
    }

    /// Recompute the stage after a step completes.
    fn settle(&mut self) {
        self.stage = if self.pending_operation != PendingOperation::Idle {
            Stage::AwaitingOperationInput
        } else if self.pending_url.is_some() {
            Stage::UrlPending
        } else {
            Stage::Idle
        };
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Parse `"<start> <end>"`, each in seconds or `m:ss` / `h:mm:ss`.
pub fn parse_window(text: &str) -> Option<(f64, f64)> {
    let mut parts = text
        .split(|c: char| c.is_whitespace() || c == '-' || c == ',')
        .filter(|p| !p.is_empty());
    let start = parse_timestamp(parts.next()?)?;
    let end = parse_timestamp(parts.next()?)?;
    if parts.next().is_some() {
        return None;
    }
    Some((start, end))
}

fn parse_timestamp(s: &str) -> Option<f64> {
    let mut total = 0.0;
    for part in s.split(':') {
        let value: f64 = part.parse().ok()?;
        if value < 0.0 || !value.is_finite() {
            return None;
        }
        total = total * 60.0 + value;
    }
    Some(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_keeps_pending_operation() {
        let mut state = SessionState::new();
        state.begin_convert(TargetFormat::Wav);
        state.observe_url("https://youtu.be/a".into());

        assert_eq!(state.stage(), Stage::UrlPending);
        assert_eq!(state.pending_operation(), PendingOperation::Convert);
        assert_eq!(state.operation_param("format"), Some("wav"));

        state.observe_url("https://youtu.be/b".into());
        assert_eq!(state.pending_url(), Some("https://youtu.be/b"));
    }

    #[test]
    fn test_quality_choice_consumes_url() {
        let mut state = SessionState::new();
        assert!(matches!(
            state.require_url(),
            Err(MediabotError::SessionStateMissing(_))
        ));

        state.observe_url("https://youtu.be/a".into());
        state.offer_quality();
        assert_eq!(state.stage(), Stage::AwaitingQualityChoice);
        assert_eq!(state.require_url().unwrap(), "https://youtu.be/a");

        state.consume_url();
        assert_eq!(state.stage(), Stage::Idle);
        assert!(state.pending_url().is_none());
    }

    #[test]
    fn test_convert_flow() {
        let mut state = SessionState::new();
        assert_eq!(
            state.on_upload("a.mp4".into()),
            UploadAction::Describe("a.mp4".into())
        );

        state.begin_convert(TargetFormat::Mp3);
        assert_eq!(state.stage(), Stage::AwaitingOperationInput);
        assert_eq!(state.on_text("hello?"), None);
        assert_eq!(
            state.on_upload("a.mp4".into()),
            UploadAction::Convert {
                path: "a.mp4".into(),
                format: TargetFormat::Mp3
            }
        );
        assert_eq!(state.pending_operation(), PendingOperation::Idle);
        assert_eq!(state.stage(), Stage::Idle);
    }

    #[test]
    fn test_trim_flow() {
        let mut state = SessionState::new();
        state.begin_trim();
        // No file yet, so text goes to the agent.
        assert_eq!(state.on_text("10 20"), None);

        assert_eq!(
            state.on_upload("clip.mp4".into()),
            UploadAction::AwaitTrimWindow("clip.mp4".into())
        );
        assert_eq!(state.on_text("from the start"), Some(FlowInput::TrimUsage));
        assert_eq!(state.pending_operation(), PendingOperation::Trim);

        assert_eq!(
            state.on_text("1:05 90"),
            Some(FlowInput::Trim {
                path: "clip.mp4".into(),
                start: 65.0,
                end: 90.0
            })
        );
        assert_eq!(state.stage(), Stage::Idle);
    }

    #[test]
    fn test_archive_flow() {
        let mut state = SessionState::new();
        state.begin_archive();
        assert_eq!(state.on_text("DONE"), Some(FlowInput::ArchiveEmpty));
        assert_eq!(state.on_upload("a.txt".into()), UploadAction::Collected(1));
        assert_eq!(state.on_upload("b.txt".into()), UploadAction::Collected(2));
        assert_eq!(state.on_text("more coming"), None);
        assert_eq!(
            state.on_text(" done "),
            Some(FlowInput::Archive(vec!["a.txt".into(), "b.txt".into()]))
        );
        assert_eq!(state.pending_operation(), PendingOperation::Idle);
    }

    #[test]
    fn test_reset() {
        let mut state = SessionState::new();
        state.observe_url("https://youtu.be/a".into());
        state.begin_archive();
        state.on_upload("a.txt".into());
        state.reset();
        assert_eq!(state, SessionState::default());
    }

    #[test]
    fn test_parse_window() {
        assert_eq!(parse_window("10 20"), Some((10.0, 20.0)));
        assert_eq!(parse_window("0:30-1:00"), Some((30.0, 60.0)));
        assert_eq!(parse_window("1:00:00, 1:00:30.5"), Some((3600.0, 3630.5)));
        assert_eq!(parse_window("10"), None);
        assert_eq!(parse_window("a b"), None);
        assert_eq!(parse_window("1 2 3"), None);
    }
}
