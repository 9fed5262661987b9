//! Tagged tool results.

use crate::error::MediabotError;
use crate::text::{truncate, FAILURE_MARKER};

/// Why a tool call failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    InvalidArguments,
    NotFound,
    Unsupported,
    MissingProgram,
    External,
}

impl FailureKind {
    pub fn for_error(err: &MediabotError) -> Self {
        match err {
            MediabotError::SchemaValidation { .. } | MediabotError::InvalidInput(_) => {
                FailureKind::InvalidArguments
            }
            MediabotError::FileNotFound(_) => FailureKind::NotFound,
            MediabotError::UnsupportedFormat(_) => FailureKind::Unsupported,
            MediabotError::ToolNotFound(_) => FailureKind::MissingProgram,
            _ => FailureKind::External,
        }
    }
}

/// What a tool handler produced.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutcome {
    Success(String),
    Failure { kind: FailureKind, message: String },
}

impl ToolOutcome {
    pub fn success(message: impl Into<String>) -> Self {
        ToolOutcome::Success(message.into())
    }

    pub fn failure(kind: FailureKind, message: impl Into<String>) -> Self {
        ToolOutcome::Failure {
            kind,
            message: message.into(),
        }
    }

    /// Failure carrying `context` ("Download", "Conversion", ...) and the cause.
    pub fn from_error(context: &str, err: &MediabotError) -> Self {
        ToolOutcome::Failure {
            kind: FailureKind::for_error(err),
            message: format!("{} error: {}", context, err),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ToolOutcome::Success(_))
    }

    /// Text handed to the model. Failure causes are cut to `max_error_chars`.
    pub fn render(&self, max_error_chars: usize) -> String {
        match self {
            ToolOutcome::Success(text) => text.clone(),
            ToolOutcome::Failure { message, .. } => {
                format!("{} {}", FAILURE_MARKER, truncate(message, max_error_chars))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_kind_mapping() {
        let cases = [
            (MediabotError::FileNotFound("x".into()), FailureKind::NotFound),
            (MediabotError::UnsupportedFormat("flac".into()), FailureKind::Unsupported),
            (MediabotError::ToolNotFound("ffmpeg".into()), FailureKind::MissingProgram),
            (MediabotError::InvalidInput("bad".into()), FailureKind::InvalidArguments),
            (MediabotError::external("Download", "403"), FailureKind::External),
        ];
        for (err, kind) in cases {
            assert_eq!(FailureKind::for_error(&err), kind);
        }
    }

    #[test]
    fn test_render_failure_is_marked_and_bounded() {
        let outcome = ToolOutcome::from_error("Download", &MediabotError::external("Download", "e".repeat(1000)));
        let text = outcome.render(120);
        assert!(text.starts_with("❌ Download error:"));
        assert!(text.chars().count() <= 122);
    }

    #[test]
    fn test_render_success_verbatim() {
        assert_eq!(ToolOutcome::success("✅ done").render(5), "✅ done");
    }
}
