//! Webhook server receiving Telegram updates over HTTP.

use super::spawn_update;
use super::telegram::{TelegramClient, Update};
use crate::bot::Bot;
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{debug, warn};

/// Header Telegram fills with the secret given to `setWebhook`.
pub const SECRET_HEADER: &str = "x-telegram-bot-api-secret-token";

pub const WEBHOOK_PATH: &str = "/telegram/webhook";

struct AppState {
    bot: Arc<Bot>,
    client: Arc<TelegramClient>,
    secret: Option<String>,
}

pub fn router(bot: Arc<Bot>, client: Arc<TelegramClient>, secret: Option<String>) -> Router {
    let state = Arc::new(AppState { bot, client, secret });

    Router::new()
        .route("/health", get(health))
        .route(WEBHOOK_PATH, post(receive_update))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

/// Accept an update and handle it in the background. Returns before the
/// agent runs.
async fn receive_update(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(update): Json<Update>,
) -> StatusCode {
    if let Some(expected) = &state.secret {
        let given = headers.get(SECRET_HEADER).and_then(|v| v.to_str().ok());
        if given != Some(expected.as_str()) {
            warn!("Rejected webhook call with a missing or wrong secret");
            return StatusCode::UNAUTHORIZED;
        }
    }

    debug!("Webhook update {}", update.update_id);
    spawn_update(state.bot.clone(), state.client.clone(), update);
    StatusCode::OK
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{Agent, ChatModel, ModelReply, ModelRequest};
    use crate::bot::BotOptions;
    use crate::config::Prompts;
    use crate::error::Result;
    use crate::session::SessionStore;
    use crate::tools::ToolRegistry;
    use async_trait::async_trait;
    use std::time::Duration;

    struct Silent;

    #[async_trait]
    impl ChatModel for Silent {
        async fn next_action(&self, _request: &ModelRequest) -> Result<ModelReply> {
            Ok(ModelReply::Final(String::new()))
        }
    }

    async fn serve(secret: Option<&str>) -> String {
        let agent = Agent::new(Arc::new(Silent), Arc::new(ToolRegistry::new()), "sys");
        let bot = Bot::new(
            agent,
            SessionStore::new(4, Duration::from_secs(60)),
            Prompts::default(),
            BotOptions {
                processed_dir: std::env::temp_dir(),
                max_error_chars: 100,
            },
        );
        let client = TelegramClient::new("http://127.0.0.1:9", "TOKEN", std::env::temp_dir(), 4000).unwrap();
        let app = router(Arc::new(bot), Arc::new(client), secret.map(String::from));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_health() {
        let base = serve(None).await;
        let body: serde_json::Value = reqwest::get(format!("{}/health", base))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_secret_is_enforced() {
        let base = serve(Some("s3cret")).await;
        let http = reqwest::Client::new();
        let url = format!("{}{}", base, WEBHOOK_PATH);
        let update = json!({ "update_id": 1 });

        let denied = http.post(&url).json(&update).send().await.unwrap();
        assert_eq!(denied.status(), reqwest::StatusCode::UNAUTHORIZED);

        let wrong = http
            .post(&url)
            .header(SECRET_HEADER, "nope")
            .json(&update)
            .send()
            .await
            .unwrap();
        assert_eq!(wrong.status(), reqwest::StatusCode::UNAUTHORIZED);

        let accepted = http
            .post(&url)
            .header(SECRET_HEADER, "s3cret")
            .json(&update)
            .send()
            .await
            .unwrap();
        assert_eq!(accepted.status(), reqwest::StatusCode::OK);
    }
}
