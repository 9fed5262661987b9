//! Agent loop with a hard iteration cap.

use super::memory::{ConversationMemory, ConversationTurn};
use super::model::{ChatModel, ModelReply, ModelRequest, ScratchStep, ToolCallRequest};
use crate::error::{MediabotError, Result};
use crate::text::{truncate, FAILURE_MARKER};
use crate::tools::ToolRegistry;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Default cap on model calls per invocation.
pub const DEFAULT_MAX_ITERATIONS: usize = 5;

/// How an invocation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentOutcome {
    Final,
    Aborted,
}

/// Response from an agent run.
#[derive(Debug)]
pub struct AgentResponse {
    /// Text for the user: the model's answer or the abort message.
    pub content: String,
    pub outcome: AgentOutcome,
    /// Record of all tool calls made during execution.
    pub tool_calls: Vec<ToolCallRecord>,
    /// Number of model calls used.
    pub iterations: usize,
}

/// Record of a tool call made by the agent.
#[derive(Debug, Clone)]
pub struct ToolCallRecord {
    pub name: String,
    pub arguments: String,
    pub result: String,
}

impl std::fmt::Display for ToolCallRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.name, self.arguments)
    }
}

/// Drives the model against the tool registry.
pub struct Agent {
    model: Arc<dyn ChatModel>,
    tools: Arc<ToolRegistry>,
    system_prompt: String,
    max_iterations: usize,
    max_error_chars: usize,
}

impl Agent {
    pub fn new(model: Arc<dyn ChatModel>, tools: Arc<ToolRegistry>, system_prompt: &str) -> Self {
        Self {
            model,
            tools,
            system_prompt: system_prompt.to_string(),
            max_iterations: DEFAULT_MAX_ITERATIONS,
            max_error_chars: 300,
        }
    }

    /// Set maximum iterations for the agent loop.
    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    /// Bound on tool error text handed back to the model and to the user.
    pub fn with_max_error_chars(mut self, max: usize) -> Self {
        self.max_error_chars = max;
        self
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Run one user turn against `memory`.
    ///
    /// At most one tool call runs per iteration. Malformed model output is
    /// fed back as a note and costs an iteration. Once the cap is reached
    /// the run aborts with a generic failure message; side effects of tool
    /// calls already made are kept. Input and output are appended to
    /// `memory` on both outcomes. Model transport errors are returned as is
    /// and leave `memory` untouched.
    pub async fn run(&self, input: &str, memory: &mut ConversationMemory) -> Result<AgentResponse> {
        let mut request = ModelRequest {
            system: self.system_prompt.clone(),
            history: memory.snapshot(),
            input: input.to_string(),
            scratch: Vec::new(),
            tools: self.tools.definitions(),
        };

        let mut tool_calls = Vec::new();
        let mut iterations = 0;

        while iterations < self.max_iterations {
            iterations += 1;
            debug!("Agent iteration {}", iterations);

            match self.model.next_action(&request).await? {
                ModelReply::Final(content) => {
                    info!(
                        "Agent finished after {} iteration(s) and {} tool call(s)",
                        iterations,
                        tool_calls.len()
                    );
                    return Ok(self.finish(input, content, AgentOutcome::Final, tool_calls, iterations, memory));
                }
                ModelReply::ToolCalls(calls) => {
                    let mut calls = calls.into_iter();
                    let Some(call) = calls.next() else {
                        request.scratch.push(ScratchStep::Note(
                            "No tool call was given. Answer the user or call one of the tools.".to_string(),
                        ));
                        continue;
                    };
                    let skipped = calls.count();
                    if skipped > 0 {
                        debug!("Ignoring {} extra tool call(s) this iteration", skipped);
                    }

                    let result = self.execute_tool_call(&call).await;
                    tool_calls.push(ToolCallRecord {
                        name: call.name.clone(),
                        arguments: call.arguments.clone(),
                        result: result.clone(),
                    });
                    request.scratch.push(ScratchStep::Tool { call, result });
                }
                ModelReply::Malformed(note) => {
                    warn!("Malformed model output: {}", note);
                    request.scratch.push(ScratchStep::Note(note));
                }
            }
        }

        warn!("Agent hit the iteration cap ({})", self.max_iterations);
        let content = MediabotError::IterationCapExceeded(self.max_iterations).user_message(self.max_error_chars);
        Ok(self.finish(input, content, AgentOutcome::Aborted, tool_calls, iterations, memory))
    }

    /// Execute a single tool call, rendering every failure as text.
    async fn execute_tool_call(&self, call: &ToolCallRequest) -> String {
        let arguments = if call.arguments.trim().is_empty() {
            Value::Object(Default::default())
        } else {
            match serde_json::from_str::<Value>(&call.arguments) {
                Ok(v) => v,
                Err(e) => {
                    return format!(
                        "{} {}",
                        FAILURE_MARKER,
                        truncate(
                            &format!("Arguments for '{}' are not valid JSON: {}", call.name, e),
                            self.max_error_chars
                        )
                    )
                }
            }
        };

        match self.tools.dispatch(&call.name, &arguments).await {
            Ok(outcome) => outcome.render(self.max_error_chars),
            Err(e) => e.user_message(self.max_error_chars),
        }
    }

    fn finish(
        &self,
        input: &str,
        content: String,
        outcome: AgentOutcome,
        tool_calls: Vec<ToolCallRecord>,
        iterations: usize,
        memory: &mut ConversationMemory,
    ) -> AgentResponse {
        memory.append(ConversationTurn::user(input));
        memory.append(ConversationTurn::assistant(content.clone()));

        AgentResponse {
            content,
            outcome,
            tool_calls,
            iterations,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::Role;
    use crate::tools::{ParamKind, ParamSpec, ToolHandler, ToolOutcome, ToolSpec};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Replays scripted replies, repeating the last one forever.
    struct ScriptedModel {
        replies: Vec<ModelReply>,
        calls: AtomicUsize,
        seen: Mutex<Vec<ModelRequest>>,
    }

    impl ScriptedModel {
        fn new(replies: Vec<ModelReply>) -> Arc<Self> {
            Arc::new(Self {
                replies,
                calls: AtomicUsize::new(0),
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl ChatModel for ScriptedModel {
        async fn next_action(&self, request: &ModelRequest) -> Result<ModelReply> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen.lock().unwrap().push(request.clone());
            Ok(self.replies[n.min(self.replies.len() - 1)].clone())
        }
    }

    struct Echo {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ToolHandler for Echo {
        async fn call(&self, args: Value) -> ToolOutcome {
            self.calls.fetch_add(1, Ordering::SeqCst);
            ToolOutcome::success(format!("✅ {}", args["text"].as_str().unwrap_or_default()))
        }
    }

    fn call(name: &str, arguments: &str) -> ToolCallRequest {
        ToolCallRequest {
            id: "call_1".into(),
            name: name.into(),
            arguments: arguments.into(),
        }
    }

    fn registry() -> (Arc<ToolRegistry>, Arc<Echo>) {
        let echo = Arc::new(Echo {
            calls: AtomicUsize::new(0),
        });
        let mut registry = ToolRegistry::new();
        registry
            .register(
                ToolSpec::new("echo", "Repeat").param(ParamSpec::required("text", ParamKind::String, "Text")),
                echo.clone(),
            )
            .unwrap();
        (Arc::new(registry), echo)
    }

    #[tokio::test]
    async fn test_always_tool_stops_at_cap() {
        let model = ScriptedModel::new(vec![ModelReply::ToolCalls(vec![call("echo", r#"{"text":"x"}"#)])]);
        let (tools, echo) = registry();
        let agent = Agent::new(model.clone(), tools, "sys").with_max_iterations(5);
        let mut memory = ConversationMemory::new(20);

        let response = agent.run("loop forever", &mut memory).await.unwrap();

        assert_eq!(response.outcome, AgentOutcome::Aborted);
        assert_eq!(response.iterations, 5);
        assert_eq!(model.calls.load(Ordering::SeqCst), 5);
        assert_eq!(echo.calls.load(Ordering::SeqCst), 5);
        assert!(response.content.starts_with("❌"));
        assert!(response.content.contains("5 agent iterations"));
    }

    #[tokio::test]
    async fn test_immediate_answer_is_verbatim() {
        let model = ScriptedModel::new(vec![ModelReply::Final("Hello! Send me a link.".into())]);
        let (tools, echo) = registry();
        let agent = Agent::new(model, tools, "sys");
        let mut memory = ConversationMemory::new(20);

        let response = agent.run("hi", &mut memory).await.unwrap();

        assert_eq!(response.outcome, AgentOutcome::Final);
        assert_eq!(response.content, "Hello! Send me a link.");
        assert!(response.tool_calls.is_empty());
        assert_eq!(echo.calls.load(Ordering::SeqCst), 0);

        let turns = memory.snapshot();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].role, Role::User);
        assert_eq!(turns[1].content, "Hello! Send me a link.");
    }

    #[tokio::test]
    async fn test_only_first_call_runs_and_result_is_fed_back() {
        let model = ScriptedModel::new(vec![
            ModelReply::ToolCalls(vec![call("echo", r#"{"text":"one"}"#), call("echo", r#"{"text":"two"}"#)]),
            ModelReply::Final("done".into()),
        ]);
        let (tools, echo) = registry();
        let agent = Agent::new(model.clone(), tools, "sys");
        let mut memory = ConversationMemory::new(20);

        let response = agent.run("go", &mut memory).await.unwrap();

        assert_eq!(echo.calls.load(Ordering::SeqCst), 1);
        assert_eq!(response.tool_calls.len(), 1);
        assert_eq!(response.tool_calls[0].result, "✅ one");

        let seen = model.seen.lock().unwrap();
        assert!(matches!(
            &seen[1].scratch[0],
            ScratchStep::Tool { result, .. } if result == "✅ one"
        ));
    }

    #[tokio::test]
    async fn test_malformed_output_becomes_error_turn() {
        let model = ScriptedModel::new(vec![
            ModelReply::ToolCalls(vec![call("nope", "{}")]),
            ModelReply::ToolCalls(vec![call("echo", "{not json")]),
            ModelReply::ToolCalls(vec![call("echo", "{}")]),
            ModelReply::Malformed("empty".into()),
            ModelReply::Final("recovered".into()),
        ]);
        let (tools, echo) = registry();
        let agent = Agent::new(model.clone(), tools, "sys");
        let mut memory = ConversationMemory::new(20);

        let response = agent.run("go", &mut memory).await.unwrap();

        assert_eq!(response.outcome, AgentOutcome::Final);
        assert_eq!(response.iterations, 5);
        assert_eq!(echo.calls.load(Ordering::SeqCst), 0);
        assert!(response.tool_calls.iter().all(|c| c.result.starts_with("❌")));
        assert!(response.tool_calls[0].result.contains("'name'"));
        assert!(response.tool_calls[2].result.contains("'text'"));

        let seen = model.seen.lock().unwrap();
        assert!(matches!(seen[4].scratch[3], ScratchStep::Note(_)));
    }

    #[tokio::test]
    async fn test_history_is_snapshotted_before_the_turn() {
        let model = ScriptedModel::new(vec![ModelReply::Final("ok".into())]);
        let (tools, _) = registry();
        let agent = Agent::new(model.clone(), tools, "sys");
        let mut memory = ConversationMemory::new(20);
        memory.append(ConversationTurn::user("earlier"));

        agent.run("now", &mut memory).await.unwrap();

        let seen = model.seen.lock().unwrap();
        assert_eq!(seen[0].history.len(), 1);
        assert_eq!(seen[0].input, "now");
        assert_eq!(memory.len(), 3);
    }
}
