//! LLM agent that answers media requests by calling tools.
//!
//! The agent sends the system prompt, the user's recent history and the new
//! input to a chat model, executes the first tool call it proposes, feeds
//! the result back and repeats until the model answers or the iteration
//! cap is hit.

mod memory;
mod model;
mod runner;

pub use memory::{ConversationMemory, ConversationTurn, Role};
pub use model::{ChatModel, ModelReply, ModelRequest, OpenAiModel, ScratchStep, ToolCallRequest};
pub use runner::{Agent, AgentOutcome, AgentResponse, ToolCallRecord, DEFAULT_MAX_ITERATIONS};
