//! Named tool registry with schema-checked dispatch.

use super::outcome::ToolOutcome;
use super::schema::ToolSpec;
use crate::error::{MediabotError, Result};
use async_openai::types::ChatCompletionTool;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Implementation behind a registered tool.
///
/// Handlers receive arguments that already passed schema validation and must
/// report every failure through `ToolOutcome::Failure`.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn call(&self, args: Value) -> ToolOutcome;
}

struct RegisteredTool {
    spec: ToolSpec,
    handler: Arc<dyn ToolHandler>,
}

/// Tools in registration order, addressable by name.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<RegisteredTool>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tool. Names are unique for the registry's lifetime.
    pub fn register(&mut self, spec: ToolSpec, handler: Arc<dyn ToolHandler>) -> Result<()> {
        if self.index.contains_key(&spec.name) {
            return Err(MediabotError::DuplicateTool(spec.name));
        }
        debug!("Registering tool {}", spec.name);
        self.index.insert(spec.name.clone(), self.tools.len());
        self.tools.push(RegisteredTool { spec, handler });
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn spec(&self, name: &str) -> Option<&ToolSpec> {
        self.index.get(name).map(|&i| &self.tools[i].spec)
    }

    /// Specs in registration order.
    pub fn specs(&self) -> impl Iterator<Item = &ToolSpec> {
        self.tools.iter().map(|t| &t.spec)
    }

    /// Function-calling definitions for every tool.
    pub fn definitions(&self) -> Vec<ChatCompletionTool> {
        self.specs().map(ToolSpec::to_function).collect()
    }

    /// Validate `args` against the named tool's schema and run it.
    ///
    /// Unknown names and invalid arguments fail with `SchemaValidation`
    /// before any handler runs.
    pub async fn dispatch(&self, name: &str, args: &Value) -> Result<ToolOutcome> {
        let tool = self
            .index
            .get(name)
            .map(|&i| &self.tools[i])
            .ok_or_else(|| {
                MediabotError::schema(name, "name", format!("'{}' is not a registered tool", name))
            })?;

        let validated = tool.spec.validate(args)?;

        info!("Calling tool {} with args: {}", name, validated);
        let started = Instant::now();
        let outcome = tool.handler.call(validated).await;
        info!(
            "Tool {} finished in {}ms (success: {})",
            name,
            started.elapsed().as_millis(),
            outcome.is_success()
        );

        Ok(outcome)
    }
}
