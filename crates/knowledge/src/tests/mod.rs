//! End-to-end tests: documents on disk through ingestion, the tool loop and
//! sessions, with a scripted reasoning client.

mod answer_flow;

use crate::config::RagConfig;
use crate::embeddings::providers::TrigramProvider;
use crate::rag::RagSystem;
use crate::store::{MemoryStore, VectorStore};
use async_trait::async_trait;
use lectern_core::{AppError, AppResult};
use lectern_llm::{
    ChatRequest, ChatResponse, ContentBlock, LlmClient, LlmUsage, StopReason,
};
use serde_json::Value;
use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

pub(crate) const TESTING_COURSE: &str = "Course Title: Intro to Testing
Course Link: https://example.com/testing
Course Instructor: Ada Lovelace

Lesson 1: Why Test
Lesson Link: https://example.com/testing/1
Automated tests catch regressions before a release. They also document expected behavior.

Lesson 2: Fixtures
Lesson Link: https://example.com/testing/2
Fixtures prepare shared state for tests. Temporary directories keep each test isolated from the others.
";

pub(crate) const MCP_COURSE: &str = "Course Title: MCP: Build Rich-Context AI Apps
Course Link: https://example.com/mcp
Course Instructor: Elie Schoppik

Lesson 0: Introduction
Lesson Link: https://example.com/mcp/0
The Model Context Protocol connects assistants to tools and data sources.

Lesson 1: Servers
Servers expose tools, resources and prompts over a standard transport.
";

/// Reasoning client that replays canned responses and records requests.
#[derive(Default)]
pub(crate) struct ScriptedClient {
    responses: Mutex<VecDeque<AppResult<ChatResponse>>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedClient {
    pub fn new(responses: Vec<AppResult<ChatResponse>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmClient for ScriptedClient {
    fn provider_name(&self) -> &str {
        "scripted"
    }

    async fn chat(&self, request: &ChatRequest) -> AppResult<ChatResponse> {
        self.requests.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(AppError::Llm("script exhausted".to_string())))
    }
}

pub(crate) fn text_reply(text: &str) -> AppResult<ChatResponse> {
    Ok(ChatResponse {
        content: vec![ContentBlock::text(text)],
        stop_reason: StopReason::EndTurn,
        model: "scripted".to_string(),
        usage: LlmUsage::new(10, 5),
    })
}

pub(crate) fn tool_reply(calls: &[(&str, Value)]) -> AppResult<ChatResponse> {
    Ok(ChatResponse {
        content: calls
            .iter()
            .enumerate()
            .map(|(i, (name, input))| ContentBlock::ToolUse {
                id: format!("toolu_{}", i),
                name: name.to_string(),
                input: input.clone(),
            })
            .collect(),
        stop_reason: StopReason::ToolUse,
        model: "scripted".to_string(),
        usage: LlmUsage::new(10, 5),
    })
}

/// Tool result texts sent in a request, in order.
pub(crate) fn tool_results(request: &ChatRequest) -> Vec<String> {
    request
        .messages
        .iter()
        .flat_map(|m| m.content.iter())
        .filter_map(|block| match block {
            ContentBlock::ToolResult { content, .. } => Some(content.clone()),
            _ => None,
        })
        .collect()
}

pub(crate) fn write_docs(workspace: &Path, files: &[(&str, &str)]) {
    let docs = workspace.join("docs");
    std::fs::create_dir_all(&docs).unwrap();
    for (name, content) in files {
        std::fs::write(docs.join(name), content).unwrap();
    }
}

pub(crate) fn system_with_store(
    workspace: &Path,
    client: Arc<ScriptedClient>,
    store: Arc<dyn VectorStore>,
) -> RagSystem {
    RagSystem::new(
        workspace,
        RagConfig::default(),
        client,
        "test-model",
        Arc::new(TrigramProvider::new(256)),
        store,
    )
    .unwrap()
}

/// A system over a temp workspace with both courses ingested.
pub(crate) async fn ingested_system(client: Arc<ScriptedClient>) -> (TempDir, RagSystem) {
    let temp = TempDir::new().unwrap();
    write_docs(
        temp.path(),
        &[("testing.txt", TESTING_COURSE), ("mcp.txt", MCP_COURSE)],
    );

    let system = system_with_store(temp.path(), client, Arc::new(MemoryStore::new()));
    system.ingest_docs(false).await.unwrap();
    (temp, system)
}
