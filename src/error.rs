//! Error types for mediabot.

use thiserror::Error;

/// Library-level error type for mediabot operations.
#[derive(Error, Debug)]
pub enum MediabotError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Tool already registered: {0}")]
    DuplicateTool(String),

    #[error("Invalid arguments for '{tool}': field '{field}' {reason}")]
    SchemaValidation {
        tool: String,
        field: String,
        reason: String,
    },

    #[error("{operation} failed: {message}")]
    ExternalOperation { operation: String, message: String },

    #[error("Stopped after {0} agent iterations without a final answer")]
    IterationCapExceeded(usize),

    #[error("No {0} is pending for this chat")]
    SessionStateMissing(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("External tool not found: {0}. Please install it and ensure it's in your PATH.")]
    ToolNotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Model error: {0}")]
    Model(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

impl MediabotError {
    /// Shorthand for a failed call into an external program or library.
    pub fn external(operation: &str, message: impl Into<String>) -> Self {
        MediabotError::ExternalOperation {
            operation: operation.to_string(),
            message: message.into(),
        }
    }

    /// Shorthand for an argument that failed schema validation.
    pub fn schema(tool: &str, field: &str, reason: impl Into<String>) -> Self {
        MediabotError::SchemaValidation {
            tool: tool.to_string(),
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    /// Render as a short chat message carrying the failure marker.
    pub fn user_message(&self, max_chars: usize) -> String {
        format!("{} {}", crate::text::FAILURE_MARKER, crate::text::truncate(&self.to_string(), max_chars))
    }
}

/// Result type alias for mediabot operations.
pub type Result<T> = std::result::Result<T, MediabotError>;
