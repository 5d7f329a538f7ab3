use super::types::RagResponse;
use crate::chunker::Chunker;
use crate::config::RagConfig;
use crate::embeddings::{create_provider, EmbeddingProvider};
use crate::index::CourseIndex;
use crate::session::SessionManager;
use crate::store::{SqliteStore, VectorStore};
use crate::tools::{CourseOutlineTool, CourseSearchTool, ToolOutput, ToolRegistry};
use crate::types::{CourseAnalytics, SearchFilter, SearchResult};
use lectern_core::{AppConfig, AppError, AppResult};
use lectern_llm::{
    create_client, ChatMessage, ChatRequest, ChatResponse, ContentBlock, LlmClient, ToolChoice,
    ToolDefinition,
};
use lectern_prompt::{build_prompt, resolve_prompt, PromptDefinition, ANSWER_PROMPT_ID};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// The course assistant.
pub struct RagSystem {
    pub(super) config: RagConfig,
    pub(super) workspace: PathBuf,
    pub(super) chunker: Chunker,
    pub(super) index: Arc<CourseIndex>,
    tools: ToolRegistry,
    outline_tool: CourseOutlineTool,
    sessions: SessionManager,
    llm: Arc<dyn LlmClient>,
    model: String,
    prompt: PromptDefinition,
}

impl RagSystem {
    /// Assemble a system from its parts.
    ///
    /// The answer prompt comes from `.lectern/prompts/rag.answer.yml` when the
    /// workspace has one, otherwise from the built-in default.
    pub fn new(
        workspace: &Path,
        config: RagConfig,
        llm: Arc<dyn LlmClient>,
        model: impl Into<String>,
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStore>,
    ) -> AppResult<Self> {
        config.validate()?;
        let chunker = Chunker::from_config(&config)?;
        let index = Arc::new(CourseIndex::new(embedder, store, config.max_results));

        let mut tools = ToolRegistry::new();
        tools.register(Arc::new(CourseSearchTool::new(Arc::clone(&index))))?;
        tools.register(Arc::new(CourseOutlineTool::new(Arc::clone(&index))))?;

        let prompt = resolve_prompt(workspace, ANSWER_PROMPT_ID)?;

        Ok(Self {
            sessions: SessionManager::new(config.max_history),
            outline_tool: CourseOutlineTool::new(Arc::clone(&index)),
            workspace: workspace.to_path_buf(),
            config,
            chunker,
            index,
            tools,
            llm,
            model: model.into(),
            prompt,
        })
    }

    /// Build the reasoning client, embedding provider and SQLite store from
    /// configuration.
    pub async fn from_config(app: &AppConfig, config: RagConfig) -> AppResult<Self> {
        let endpoint = app.resolve_endpoint(&app.provider);
        let api_key = app.resolve_api_key(&app.provider);
        let llm = create_client(&app.provider, endpoint.as_deref(), api_key.as_deref())
            .map_err(|e| AppError::Config(format!("Failed to create LLM client: {}", e)))?;

        let embedder = create_provider(&config.embedding).await?;
        let store_path = config.vector_store_file(&app.workspace);
        let store = Arc::new(SqliteStore::open(&store_path, &config.embedding)?);

        tracing::info!(
            "RAG system ready (provider: {}, model: {}, embeddings: {}/{}, store: {:?})",
            llm.provider_name(),
            app.model,
            embedder.provider_name(),
            embedder.model_name(),
            store_path
        );

        Self::new(&app.workspace, config, llm, &app.model, embedder, store)
    }

    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    pub fn index(&self) -> &CourseIndex {
        &self.index
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    pub fn tool_definitions(&self) -> Vec<ToolDefinition> {
        self.tools.definitions()
    }

    /// Answer a question within a session, creating the session if needed.
    ///
    /// The reasoning service decides whether to call tools. After
    /// `max_tool_rounds` rounds of tool calls it gets one last call in which
    /// the tools stay defined but may not be called. The session only records the turn when an answer is produced.
    pub async fn answer(&self, query: &str, session_id: Option<&str>) -> AppResult<RagResponse> {
        let session_id = self.sessions.get_or_create(session_id).await;
        let history = self.sessions.format_history(&session_id).await;
        let built = build_prompt(&self.prompt, query, history.as_deref())?;

        tracing::info!(
            "Answering in session {} (history: {})",
            session_id,
            built.metadata.history_included
        );

        let definitions = self.tools.definitions();
        let mut turn = self.tools.turn();
        let mut messages = vec![ChatMessage::user(built.user)];

        let mut response = self
            .chat(&built.system, &messages, &definitions, ToolChoice::Auto)
            .await?;
        let mut rounds = 0;
        while response.wants_tools() && rounds < self.config.max_tool_rounds {
            let mut results = Vec::new();
            for (id, name, input) in response.tool_uses() {
                let output = turn.execute(name, input).await;
                results.push(ContentBlock::tool_result(id, output));
            }
            messages.push(ChatMessage::assistant(response.content.clone()));
            messages.push(ChatMessage::tool_results(results));
            rounds += 1;

            let tool_choice = if rounds < self.config.max_tool_rounds {
                ToolChoice::Auto
            } else {
                ToolChoice::None
            };
            response = self
                .chat(&built.system, &messages, &definitions, tool_choice)
                .await?;
        }

        let answer = response.text().trim().to_string();
        if answer.is_empty() {
            return Err(AppError::Generation(
                "Reasoning service returned no answer text".to_string(),
            ));
        }

        let sources = turn.into_sources();
        tracing::info!(
            "Answered after {} tool round(s) with {} source(s)",
            rounds,
            sources.len()
        );

        self.sessions.append(&session_id, query, &answer).await;

        Ok(RagResponse {
            answer,
            sources,
            session_id,
        })
    }

    async fn chat(
        &self,
        system: &str,
        messages: &[ChatMessage],
        tools: &[ToolDefinition],
        tool_choice: ToolChoice,
    ) -> AppResult<ChatResponse> {
        let request = ChatRequest::new(&self.model, messages.to_vec())
            .with_system(system)
            .with_tools(tools.to_vec())
            .with_tool_choice(tool_choice)
            .with_max_tokens(self.config.max_tokens)
            .with_temperature(self.config.temperature);

        self.llm.chat(&request).await.map_err(|e| match e {
            AppError::Llm(message) | AppError::Generation(message) => {
                AppError::Generation(message)
            }
            other => AppError::Generation(other.to_string()),
        })
    }

    /// Search without the reasoning service. `course_name` may be partial;
    /// `Ok(None)` means it matched no course.
    pub async fn search(
        &self,
        query: &str,
        course_name: Option<&str>,
        lesson_number: Option<u32>,
        k: Option<usize>,
    ) -> AppResult<Option<Vec<SearchResult>>> {
        let course_title = match course_name {
            Some(name) => match self.index.resolve_course(name).await? {
                Some(title) => Some(title),
                None => return Ok(None),
            },
            None => None,
        };

        let filter = SearchFilter {
            course_title,
            lesson_number,
        };
        self.index.search(query, &filter, k).await.map(Some)
    }

    /// Outline text for a possibly partial course name.
    pub async fn outline(&self, course_name: &str) -> AppResult<String> {
        let ToolOutput { content, .. } = self.outline_tool.outline(course_name).await?;
        Ok(content)
    }

    pub fn course_analytics(&self) -> AppResult<CourseAnalytics> {
        self.index.analytics()
    }
}
