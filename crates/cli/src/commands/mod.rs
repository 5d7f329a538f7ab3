//! Command handlers for the Lectern CLI.
//!
//! This module organizes all CLI commands into separate submodules.

pub mod ask;
pub mod chat;
pub mod courses;
pub mod ingest;
pub mod outline;
pub mod search;

// Re-export command types for convenience
pub use ask::AskCommand;
pub use chat::ChatCommand;
pub use courses::CoursesCommand;
pub use ingest::IngestCommand;
pub use outline::OutlineCommand;
pub use search::SearchCommand;

use lectern_core::{config::AppConfig, AppError, AppResult};
use lectern_knowledge::{RagConfig, RagResponse, RagSystem};
use serde::Serialize;

/// Build the RAG system from the workspace configuration.
pub async fn open_system(config: &AppConfig) -> AppResult<RagSystem> {
    let rag_config = RagConfig::load(&config.workspace)?;
    RagSystem::from_config(config, rag_config).await
}

/// Ingest the configured docs folder before answering questions.
pub async fn ingest_on_startup(system: &RagSystem) -> AppResult<()> {
    let stats = system.ingest_docs(false).await?;
    if stats.courses_added > 0 {
        tracing::info!(
            "Loaded {} new course(s) with {} chunks",
            stats.courses_added,
            stats.chunks_added
        );
    }
    Ok(())
}

pub fn print_json<T: Serialize>(value: &T) -> AppResult<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| AppError::Serialization(e.to_string()))?;
    println!("{}", json);
    Ok(())
}

/// Answer text followed by a numbered source list.
pub fn print_answer(response: &RagResponse) {
    println!("{}", response.answer);

    if !response.sources.is_empty() {
        println!();
        println!("Sources:");
        for (i, source) in response.sources.iter().enumerate() {
            match &source.link {
                Some(link) => println!("  {}. {} <{}>", i + 1, source.text, link),
                None => println!("  {}. {}", i + 1, source.text),
            }
        }
    }
}
