//! The language model seam.

use super::memory::{ConversationTurn, Role};
use crate::config::LlmSettings;
use crate::error::{MediabotError, Result};
use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionMessageToolCall, ChatCompletionRequestAssistantMessageArgs,
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestToolMessageArgs, ChatCompletionRequestUserMessageArgs, ChatCompletionTool,
    ChatCompletionToolType, CreateChatCompletionRequestArgs, FunctionCall,
};
use async_openai::Client;
use async_trait::async_trait;
use tracing::debug;

/// A tool call proposed by the model.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCallRequest {
    pub id: String,
    pub name: String,
    /// Raw JSON text as the model produced it.
    pub arguments: String,
}

/// One step of the scratch record kept during a single invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum ScratchStep {
    /// A tool call and the text it produced.
    Tool { call: ToolCallRequest, result: String },
    /// Feedback about output the loop could not act on.
    Note(String),
}

/// Everything the model sees for one decision.
#[derive(Debug, Clone)]
pub struct ModelRequest {
    pub system: String,
    pub history: Vec<ConversationTurn>,
    pub input: String,
    pub scratch: Vec<ScratchStep>,
    pub tools: Vec<ChatCompletionTool>,
}

/// The model's next action.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelReply {
    Final(String),
    /// Proposed calls, in the model's order.
    ToolCalls(Vec<ToolCallRequest>),
    /// Output that is neither an answer nor a call.
    Malformed(String),
}

#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn next_action(&self, request: &ModelRequest) -> Result<ModelReply>;
}

/// Chat completions model with function calling.
pub struct OpenAiModel {
    client: Client<OpenAIConfig>,
    model: String,
    temperature: f32,
}

impl OpenAiModel {
    pub fn new(client: Client<OpenAIConfig>, model: &str, temperature: f32) -> Self {
        Self {
            client,
            model: model.to_string(),
            temperature,
        }
    }

    pub fn from_settings(settings: &LlmSettings) -> Result<Self> {
        let client = crate::openai::client_from_settings(settings)?;
        Ok(Self::new(client, &settings.model, settings.temperature))
    }

    fn messages(request: &ModelRequest) -> Result<Vec<ChatCompletionRequestMessage>> {
        let mut messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(request.system.clone())
                .build()
                .map_err(model_err)?
                .into(),
        ];

        for turn in &request.history {
            messages.push(match turn.role {
                Role::User => user_message(turn.content.clone())?,
                Role::Assistant => assistant_message(turn.content.clone())?,
                Role::Tool => assistant_message(format!("Tool result: {}", turn.content))?,
            });
        }

        messages.push(user_message(request.input.clone())?);

        for step in &request.scratch {
            match step {
                ScratchStep::Tool { call, result } => {
                    messages.push(
                        ChatCompletionRequestAssistantMessageArgs::default()
                            .tool_calls(vec![ChatCompletionMessageToolCall {
                                id: call.id.clone(),
                                r#type: ChatCompletionToolType::Function,
                                function: FunctionCall {
                                    name: call.name.clone(),
                                    arguments: call.arguments.clone(),
                                },
                            }])
                            .build()
                            .map_err(model_err)?
                            .into(),
                    );
                    messages.push(
                        ChatCompletionRequestToolMessageArgs::default()
                            .tool_call_id(call.id.clone())
                            .content(result.clone())
                            .build()
                            .map_err(model_err)?
                            .into(),
                    );
                }
                ScratchStep::Note(note) => messages.push(user_message(note.clone())?),
            }
        }

        Ok(messages)
    }
}

fn model_err(e: impl std::fmt::Display) -> MediabotError {
    MediabotError::Model(e.to_string())
}

fn user_message(content: String) -> Result<ChatCompletionRequestMessage> {
    Ok(ChatCompletionRequestUserMessageArgs::default()
        .content(content)
        .build()
        .map_err(model_err)?
        .into())
}

fn assistant_message(content: String) -> Result<ChatCompletionRequestMessage> {
    Ok(ChatCompletionRequestAssistantMessageArgs::default()
        .content(content)
        .build()
        .map_err(model_err)?
        .into())
}

#[async_trait]
impl ChatModel for OpenAiModel {
    async fn next_action(&self, request: &ModelRequest) -> Result<ModelReply> {
        let mut builder = CreateChatCompletionRequestArgs::default();
        builder
            .model(&self.model)
            .messages(Self::messages(request)?)
            .temperature(self.temperature);
        if !request.tools.is_empty() {
            builder.tools(request.tools.clone());
        }
        let completion = builder.build().map_err(model_err)?;

        let response = self
            .client
            .chat()
            .create(completion)
            .await
            .map_err(|e| MediabotError::Model(format!("Chat API error: {}", e)))?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| MediabotError::Model("No response from model".to_string()))?;

        let calls: Vec<ToolCallRequest> = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|c| ToolCallRequest {
                id: if c.id.is_empty() {
                    format!("call_{}", uuid::Uuid::new_v4().simple())
                } else {
                    c.id
                },
                name: c.function.name,
                arguments: c.function.arguments,
            })
            .collect();

        if !calls.is_empty() {
            debug!("Model proposed {} tool call(s)", calls.len());
            return Ok(ModelReply::ToolCalls(calls));
        }

        match choice.message.content {
            Some(text) if !text.trim().is_empty() => Ok(ModelReply::Final(text)),
            _ => Ok(ModelReply::Malformed(
                "The reply was empty. Answer the user or call one of the tools.".to_string(),
            )),
        }
    }
}
