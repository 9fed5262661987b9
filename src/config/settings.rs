//! Configuration settings for mediabot.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub telegram: TelegramSettings,
    pub llm: LlmSettings,
    pub agent: AgentSettings,
    pub media: MediaSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Root directory for all working files.
    pub data_dir: String,
    /// Where downloaded media lands.
    pub downloads_dir: String,
    /// Where files sent by users are stored.
    pub uploads_dir: String,
    /// Where converted, trimmed and edited files are written.
    pub processed_dir: String,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            data_dir: "~/.mediabot".to_string(),
            downloads_dir: "~/.mediabot/downloads".to_string(),
            uploads_dir: "~/.mediabot/uploads".to_string(),
            processed_dir: "~/.mediabot/processed".to_string(),
            log_level: "warn".to_string(),
        }
    }
}

/// Telegram Bot API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramSettings {
    /// Bot access token. `TELEGRAM_TOKEN` overrides it.
    pub token: Option<String>,
    /// Bot API base URL.
    pub api_base: String,
    /// Long-poll timeout in seconds.
    pub poll_timeout_seconds: u64,
    /// Secret expected in `X-Telegram-Bot-Api-Secret-Token` (webhook mode).
    pub webhook_secret: Option<String>,
    /// Longest message sent in one piece.
    pub max_message_chars: usize,
}

impl Default for TelegramSettings {
    fn default() -> Self {
        Self {
            token: None,
            api_base: "https://api.telegram.org".to_string(),
            poll_timeout_seconds: 30,
            webhook_secret: None,
            max_message_chars: 4000,
        }
    }
}

/// Language model endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    /// OpenAI-compatible API base URL.
    pub base_url: String,
    /// Model identifier.
    pub model: String,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            base_url: "https://openrouter.ai/api/v1".to_string(),
            model: "microsoft/phi-3-mini-128k-instruct:free".to_string(),
            api_key_env: "OPENROUTER_API_KEY".to_string(),
            temperature: 0.7,
            timeout_seconds: 300,
        }
    }
}

impl LlmSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

/// Agent loop and per-user state settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentSettings {
    /// Hard cap on model round trips per user turn.
    pub max_iterations: usize,
    /// Number of user/assistant exchanges kept per user.
    pub memory_pairs: usize,
    /// Sessions untouched for this long are dropped.
    pub session_idle_seconds: u64,
    /// Longest error cause shown to a user.
    pub max_error_chars: usize,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            max_iterations: 5,
            memory_pairs: 10,
            session_idle_seconds: 3600,
            max_error_chars: 100,
        }
    }
}

impl AgentSettings {
    /// Memory capacity in turns (two per exchange).
    pub fn memory_capacity(&self) -> usize {
        self.memory_pairs * 2
    }

    pub fn session_idle(&self) -> Duration {
        Duration::from_secs(self.session_idle_seconds)
    }
}

/// Media adapter settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaSettings {
    /// Longest description returned by the info tool.
    pub max_description_chars: usize,
    /// Longest failure cause returned by a tool.
    pub max_tool_error_chars: usize,
    /// Fetch subtitles alongside video downloads.
    pub write_subtitles: bool,
}

impl Default for MediaSettings {
    fn default() -> Self {
        Self {
            max_description_chars: 200,
            max_tool_error_chars: 300,
            write_subtitles: false,
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to the default configuration file.
    pub fn save(&self) -> crate::error::Result<()> {
        self.save_to(&Self::default_config_path())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::MediabotError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("mediabot")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    pub fn data_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.data_dir)
    }

    pub fn downloads_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.downloads_dir)
    }

    pub fn uploads_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.uploads_dir)
    }

    pub fn processed_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.processed_dir)
    }

    /// Create every working directory.
    pub fn ensure_dirs(&self) -> crate::error::Result<()> {
        for dir in [
            self.data_dir(),
            self.downloads_dir(),
            self.uploads_dir(),
            self.processed_dir(),
        ] {
            std::fs::create_dir_all(dir)?;
        }
        Ok(())
    }

    /// Resolve the bot token, preferring an explicit override (CLI flag or env).
    pub fn telegram_token(&self, override_token: Option<&str>) -> crate::error::Result<String> {
        override_token
            .map(str::to_string)
            .or_else(|| self.telegram.token.clone())
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| {
                crate::error::MediabotError::Config(
                    "Telegram token not set. Use --token, TELEGRAM_TOKEN or [telegram].token".to_string(),
                )
            })
    }

    /// Apply a `section.key = value` assignment, as used by `config set`.
    pub fn set_value(&mut self, key: &str, value: &str) -> crate::error::Result<()> {
        let mut doc: toml::Value = toml::Value::try_from(&*self)
            .map_err(|e| crate::error::MediabotError::Config(e.to_string()))?;

        let (section, field) = key.split_once('.').ok_or_else(|| {
            crate::error::MediabotError::Config(format!("Expected 'section.key', got '{}'", key))
        })?;

        let table = doc
            .get_mut(section)
            .and_then(|s| s.as_table_mut())
            .ok_or_else(|| crate::error::MediabotError::Config(format!("Unknown section: {}", section)))?;

        let parsed = match table.get(field) {
            Some(toml::Value::Integer(_)) => value
                .parse::<i64>()
                .map(toml::Value::Integer)
                .map_err(|_| crate::error::MediabotError::Config(format!("{} expects an integer", key)))?,
            Some(toml::Value::Float(_)) => value
                .parse::<f64>()
                .map(toml::Value::Float)
                .map_err(|_| crate::error::MediabotError::Config(format!("{} expects a number", key)))?,
            Some(toml::Value::Boolean(_)) => value
                .parse::<bool>()
                .map(toml::Value::Boolean)
                .map_err(|_| crate::error::MediabotError::Config(format!("{} expects true or false", key)))?,
            // Strings and unset optional fields both take the raw text
            _ => toml::Value::String(value.to_string()),
        };
        table.insert(field.to_string(), parsed);

        *self = doc
            .try_into()
            .map_err(|e: toml::de::Error| crate::error::MediabotError::Config(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.agent.max_iterations, 5);
        assert_eq!(settings.agent.memory_capacity(), 20);
        assert_eq!(settings.media.max_description_chars, 200);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let settings: Settings = toml::from_str("[agent]\nmax_iterations = 3\n").unwrap();
        assert_eq!(settings.agent.max_iterations, 3);
        assert_eq!(settings.agent.memory_pairs, 10);
        assert_eq!(settings.llm.api_key_env, "OPENROUTER_API_KEY");
    }

    #[test]
    fn test_set_value() {
        let mut settings = Settings::default();
        settings.set_value("agent.max_iterations", "7").unwrap();
        settings.set_value("llm.model", "gpt-4o-mini").unwrap();
        settings.set_value("telegram.token", "123:abc").unwrap();
        assert_eq!(settings.agent.max_iterations, 7);
        assert_eq!(settings.llm.model, "gpt-4o-mini");
        assert_eq!(settings.telegram.token.as_deref(), Some("123:abc"));

        assert!(settings.set_value("agent.max_iterations", "many").is_err());
        assert!(settings.set_value("nosection.key", "1").is_err());
    }

    #[test]
    fn test_token_resolution() {
        let mut settings = Settings::default();
        assert!(settings.telegram_token(None).is_err());
        settings.telegram.token = Some("from-file".to_string());
        assert_eq!(settings.telegram_token(None).unwrap(), "from-file");
        assert_eq!(settings.telegram_token(Some("from-env")).unwrap(), "from-env");
    }
}
