//! Tools exposed to the reasoning service.
//!
//! A [`ToolRegistry`] holds the tools for the lifetime of the system. Each
//! answer opens a [`ToolTurn`], which owns the per-question call counters
//! and the sources gathered by tool calls, so concurrent answers never share
//! state.

mod outline;
mod search;

pub use outline::CourseOutlineTool;
pub use search::CourseSearchTool;

use crate::types::Source;
use async_trait::async_trait;
use lectern_core::{AppError, AppResult};
use lectern_llm::ToolDefinition;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Result of one tool call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolOutput {
    /// Text returned to the reasoning service
    pub content: String,

    /// Sources the content was drawn from
    pub sources: Vec<Source>,
}

impl ToolOutput {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            sources: Vec::new(),
        }
    }
}

#[async_trait]
pub trait Tool: Send + Sync {
    fn definition(&self) -> ToolDefinition;

    /// Calls allowed per answer; `None` means unlimited.
    fn max_calls_per_turn(&self) -> Option<usize> {
        None
    }

    async fn execute(&self, input: &Value) -> AppResult<ToolOutput>;
}

/// Named tools, in registration order.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) -> AppResult<()> {
        let name = tool.definition().name;
        if name.trim().is_empty() {
            return Err(AppError::Config("Tool name must not be empty".to_string()));
        }
        if self.get(&name).is_some() {
            return Err(AppError::Config(format!(
                "Tool '{}' is already registered",
                name
            )));
        }

        tracing::debug!("Registered tool '{}'", name);
        self.tools.push(tool);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.definition().name == name)
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.definition()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Start the tool state for one answer.
    pub fn turn(&self) -> ToolTurn<'_> {
        ToolTurn {
            registry: self,
            calls: HashMap::new(),
            sources: Vec::new(),
        }
    }
}

/// Per-answer tool state.
pub struct ToolTurn<'a> {
    registry: &'a ToolRegistry,
    calls: HashMap<String, usize>,
    sources: Vec<Source>,
}

impl ToolTurn<'_> {
    /// Run a tool by name and return the text for the reasoning service.
    ///
    /// Unknown tools, exhausted call limits and tool failures come back as
    /// text so the model can recover; none of them fail the answer.
    pub async fn execute(&mut self, name: &str, input: &Value) -> String {
        let Some(tool) = self.registry.get(name) else {
            tracing::warn!("Model requested unknown tool '{}'", name);
            return format!("Tool '{}' not found", name);
        };

        let calls = self.calls.entry(name.to_string()).or_insert(0);
        if let Some(limit) = tool.max_calls_per_turn() {
            if *calls >= limit {
                tracing::info!("Rejected call {} to '{}' (limit {})", *calls + 1, name, limit);
                return format!(
                    "Tool '{}' may only be called {} time(s) per question. Answer using the results already provided.",
                    name, limit
                );
            }
        }
        *calls += 1;

        tracing::debug!("Executing tool '{}' with input {}", name, input);
        match tool.execute(input).await {
            Ok(output) => {
                for source in output.sources {
                    if !self.sources.contains(&source) {
                        self.sources.push(source);
                    }
                }
                output.content
            }
            Err(e) => {
                tracing::warn!("Tool '{}' failed: {}", name, e);
                format!("Tool execution failed: {}", e)
            }
        }
    }

    pub fn call_count(&self, name: &str) -> usize {
        self.calls.get(name).copied().unwrap_or(0)
    }

    pub fn sources(&self) -> &[Source] {
        &self.sources
    }

    pub fn into_sources(self) -> Vec<Source> {
        self.sources
    }
}

/// Required string parameter.
pub(crate) fn required_str<'v>(input: &'v Value, key: &str) -> AppResult<&'v str> {
    optional_str(input, key)
        .ok_or_else(|| AppError::Knowledge(format!("Missing required parameter '{}'", key)))
}

/// Optional, non-blank string parameter.
pub(crate) fn optional_str<'v>(input: &'v Value, key: &str) -> Option<&'v str> {
    input
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Optional lesson number; models sometimes send numbers as strings.
pub(crate) fn optional_u32(input: &Value, key: &str) -> AppResult<Option<u32>> {
    match input.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .map(Some)
            .ok_or_else(|| AppError::Knowledge(format!("Invalid '{}': {}", key, n))),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| AppError::Knowledge(format!("Invalid '{}': {}", key, s))),
        Some(other) => Err(AppError::Knowledge(format!("Invalid '{}': {}", key, other))),
    }
}
