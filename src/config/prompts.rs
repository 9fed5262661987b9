//! Prompt templates for mediabot.
//!
//! Prompts can be customized by placing TOML files in the custom prompts directory.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Prompts {
    pub agent: AgentPrompts,
    /// Instructions synthesized from button presses and uploads.
    pub instructions: InstructionPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: HashMap<String, String>,
}

/// System instructions for the agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentPrompts {
    pub system: String,
}

impl Default for AgentPrompts {
    fn default() -> Self {
        Self {
            system: r#"You are Smart Media Assistant, a friendly media helper inside a chat app.

Your job is to help users download, convert and edit media by calling the tools you have.

Tools:
- download_media: download a video or its audio at a chosen quality (ultra, high, medium, low, audio_high, audio_normal)
- media_info: look up title, duration, channel and available qualities for a link
- playlist_info: list the first entries of a playlist link
- convert_file: convert a local video/audio file to mp3, wav, aac, mp4, avi or mov
- process_image: resize, compress or convert a local image
- manage_archive: create a zip from files or extract a zip
- trim_video: cut a local video between two timestamps in seconds

Rules:
- Understand the request before acting. If there is a link, fetch its info first.
- Never claim an operation happened unless a tool reported success.
- If a tool fails, explain why in one sentence and suggest an alternative.
- Offer clear choices (qualities, formats) when the request is ambiguous.
- Keep replies short and use emoji sparingly to mark status.
- Answer in the language the user writes in."#
                .to_string(),
        }
    }
}

/// Templates turning button presses and uploads into agent input.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InstructionPrompts {
    pub media_info: String,
    pub download_video: String,
    pub download_audio: String,
    pub file_uploaded: String,
    pub convert_file: String,
    pub trim_video: String,
    pub create_archive: String,
}

impl Default for InstructionPrompts {
    fn default() -> Self {
        Self {
            media_info: "Get detailed information about this link: {{url}}".to_string(),
            download_video: "Download the video from this link in {{quality}} quality: {{url}}"
                .to_string(),
            download_audio: "Download the audio from this link in {{quality}} quality: {{url}}"
                .to_string(),
            file_uploaded: "The user uploaded a new {{kind}}: {{path}}. Which operations are available for it?"
                .to_string(),
            convert_file: "Convert the file {{path}} to {{format}}.".to_string(),
            trim_video: "Trim the video {{path}} from {{start}} to {{end}} seconds.".to_string(),
            create_archive: "Create a zip archive at {{output}} containing these files: {{files}}"
                .to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts from the default location, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let agent_path = custom_path.join("agent.toml");
            if agent_path.exists() {
                let content = std::fs::read_to_string(&agent_path)?;
                prompts.agent = toml::from_str(&content)?;
            }

            let instructions_path = custom_path.join("instructions.toml");
            if instructions_path.exists() {
                let content = std::fs::read_to_string(&instructions_path)?;
                prompts.instructions = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        let mut result = template.to_string();
        for (key, value) in vars {
            result = result.replace(&format!("{{{{{}}}}}", key), value);
        }
        result
    }

    /// Render a template from `(name, value)` pairs merged over the config variables.
    /// Provided pairs take precedence.
    pub fn fill(&self, template: &str, pairs: &[(&str, &str)]) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in pairs {
            merged.insert((*key).to_string(), (*value).to_string());
        }
        Self::render(template, &merged)
    }

    /// The system prompt with config variables applied.
    pub fn system(&self) -> String {
        Self::render(&self.agent.system, &self.variables)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_prompts() {
        let prompts = Prompts::default();
        assert!(prompts.agent.system.contains("download_media"));
        assert!(prompts.instructions.download_video.contains("{{url}}"));
    }

    #[test]
    fn test_render_template() {
        let template = "Hello {{name}}, you have {{count}} messages.";
        let mut vars = HashMap::new();
        vars.insert("name".to_string(), "Alice".to_string());
        vars.insert("count".to_string(), "5".to_string());

        let result = Prompts::render(template, &vars);
        assert_eq!(result, "Hello Alice, you have 5 messages.");
    }

    #[test]
    fn test_fill_overrides_config_variables() {
        let mut prompts = Prompts::default();
        prompts.variables.insert("url".to_string(), "ignored".to_string());
        prompts.variables.insert("quality".to_string(), "low".to_string());

        let out = prompts.fill(
            &prompts.instructions.download_video,
            &[("url", "https://youtu.be/abc")],
        );
        assert_eq!(
            out,
            "Download the video from this link in low quality: https://youtu.be/abc"
        );
    }
}
