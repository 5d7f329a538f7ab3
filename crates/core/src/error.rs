//! Error types for Lectern.
//!
//! A single error enum covers configuration, I/O, reasoning-service,
//! document ingestion, retrieval and prompt failures.

use thiserror::Error;

/// Unified error type for Lectern.
///
/// All fallible functions return `Result<T, AppError>`.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Transport or protocol errors from an LLM provider
    #[error("LLM error: {0}")]
    Llm(String),

    /// The reasoning service could not produce an answer
    #[error("Generation error: {0}")]
    Generation(String),

    /// A course document is missing required structure
    #[error("Malformed document: {0}")]
    MalformedDocument(String),

    /// Embedding index, vector store and retrieval errors
    #[error("Knowledge error: {0}")]
    Knowledge(String),

    /// Prompt system errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
