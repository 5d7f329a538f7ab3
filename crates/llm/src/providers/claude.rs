//! Claude (Anthropic Messages API) provider implementation.
//!
//! API: https://docs.anthropic.com/en/api/messages

use crate::client::{
    ChatMessage, ChatRequest, ChatResponse, ContentBlock, LlmClient, LlmUsage, StopReason,
    ToolChoice, ToolDefinition,
};
use lectern_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

const DEFAULT_API_VERSION: &str = "2023-06-01";

/// Messages API request format.
///
/// Message content blocks already use the API's `text` / `tool_use` /
/// `tool_result` shapes, so they serialize as-is.
#[derive(Debug, Serialize)]
struct ClaudeRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<&'a [ToolDefinition]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<ClaudeToolChoice>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct ClaudeToolChoice {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ClaudeResponse {
    model: String,
    content: Vec<ClaudeBlock>,
    #[serde(default)]
    stop_reason: Option<String>,
    #[serde(default)]
    usage: ClaudeUsage,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ClaudeBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Value,
    },
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Default, Deserialize)]
struct ClaudeUsage {
    #[serde(default)]
    input_tokens: u32,
    #[serde(default)]
    output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ClaudeErrorBody {
    error: ClaudeErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ClaudeErrorDetail {
    #[serde(rename = "type")]
    kind: String,
    message: String,
}

/// Claude client.
pub struct ClaudeClient {
    base_url: String,
    api_key: String,
    api_version: String,
    client: reqwest::Client,
}

impl ClaudeClient {
    /// Create a client against the public API endpoint.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: "https://api.anthropic.com".to_string(),
            api_key: api_key.into(),
            api_version: DEFAULT_API_VERSION.to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }

    fn to_claude_request<'a>(&self, request: &'a ChatRequest) -> ClaudeRequest<'a> {
        ClaudeRequest {
            model: &request.model,
            max_tokens: request.max_tokens,
            system: request.system.as_deref(),
            messages: &request.messages,
            tools: (!request.tools.is_empty()).then_some(request.tools.as_slice()),
            tool_choice: match request.tool_choice {
                ToolChoice::None if !request.tools.is_empty() => {
                    Some(ClaudeToolChoice { kind: "none" })
                }
                _ => None,
            },
            temperature: request.temperature,
        }
    }

    fn convert_response(&self, response: ClaudeResponse) -> ChatResponse {
        let content = response
            .content
            .into_iter()
            .filter_map(|block| match block {
                ClaudeBlock::Text { text } => Some(ContentBlock::Text { text }),
                ClaudeBlock::ToolUse { id, name, input } => {
                    Some(ContentBlock::ToolUse { id, name, input })
                }
                ClaudeBlock::Unknown => None,
            })
            .collect();

        let stop_reason = match response.stop_reason.as_deref() {
            Some("end_turn") | Some("stop_sequence") | None => StopReason::EndTurn,
            Some("tool_use") => StopReason::ToolUse,
            Some("max_tokens") => StopReason::MaxTokens,
            Some(_) => StopReason::Other,
        };

        ChatResponse {
            content,
            stop_reason,
            model: response.model,
            usage: LlmUsage::new(response.usage.input_tokens, response.usage.output_tokens),
        }
    }
}

#[async_trait::async_trait]
impl LlmClient for ClaudeClient {
    fn provider_name(&self) -> &str {
        "claude"
    }

    async fn chat(&self, request: &ChatRequest) -> AppResult<ChatResponse> {
        tracing::info!(model = %request.model, tools = request.tools.len(), "Sending chat request to Claude");

        let body = self.to_claude_request(request);
        let url = format!("{}/v1/messages", self.base_url);

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", &self.api_version)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Llm(format!("Failed to send request to Claude: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            let detail = serde_json::from_str::<ClaudeErrorBody>(&error_text)
                .map(|b| format!("{}: {}", b.error.kind, b.error.message))
                .unwrap_or(error_text);
            return Err(AppError::Llm(format!(
                "Claude API error ({}): {}",
                status, detail
            )));
        }

        let claude_response: ClaudeResponse = response
            .json()
            .await
            .map_err(|e| AppError::Llm(format!("Failed to parse Claude response: {}", e)))?;

        tracing::info!(
            stop_reason = ?claude_response.stop_reason,
            "Received chat response from Claude"
        );

        Ok(self.convert_response(claude_response))
    }
}
