//! Client for OpenAI-compatible chat completion endpoints.

use crate::config::LlmSettings;
use crate::error::{MediabotError, Result};
use async_openai::{config::OpenAIConfig, Client};
use std::time::Duration;

/// Create a client for `base_url` with a request timeout.
///
/// The timeout bounds every model call; there is no other cancellation.
pub fn create_client(base_url: &str, api_key: &str, timeout: Duration) -> Result<Client<OpenAIConfig>> {
    let http_client = reqwest::Client::builder().timeout(timeout).build()?;

    let config = OpenAIConfig::new()
        .with_api_base(base_url.trim_end_matches('/'))
        .with_api_key(api_key);

    Ok(Client::with_config(config).with_http_client(http_client))
}

/// Read the API key named by `settings.api_key_env`.
pub fn api_key(settings: &LlmSettings) -> Result<String> {
    std::env::var(&settings.api_key_env)
        .ok()
        .filter(|k| !k.trim().is_empty())
        .ok_or_else(|| {
            MediabotError::Config(format!(
                "No API key found. Set the {} environment variable.",
                settings.api_key_env
            ))
        })
}

/// Client configured from settings.
pub fn client_from_settings(settings: &LlmSettings) -> Result<Client<OpenAIConfig>> {
    create_client(&settings.base_url, &api_key(settings)?, settings.timeout())
}
