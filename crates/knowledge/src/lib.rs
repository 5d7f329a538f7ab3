//! Course knowledge base and retrieval-augmented answering.
//!
//! Course documents are parsed into lessons, chunked with overlap, embedded
//! and stored in a vector store. [`RagSystem`] answers questions by letting
//! the reasoning service call the course search and outline tools.

pub mod chunker;
pub mod config;
pub mod document;
pub mod embeddings;
pub mod index;
pub mod parser;
pub mod rag;
pub mod session;
pub mod store;
pub mod tools;
pub mod types;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use chunker::Chunker;
pub use config::RagConfig;
pub use embeddings::{create_provider, EmbeddingConfig, EmbeddingProvider};
pub use index::CourseIndex;
pub use rag::{DocumentOutcome, RagResponse, RagSystem};
pub use session::{SessionManager, Turn};
pub use store::{MemoryStore, SqliteStore, VectorStore};
pub use tools::{CourseOutlineTool, CourseSearchTool, Tool, ToolOutput, ToolRegistry};
pub use types::{
    Course, CourseAnalytics, CourseChunk, CourseRecord, IngestStats, Lesson, SearchFilter,
    SearchResult, Source,
};
