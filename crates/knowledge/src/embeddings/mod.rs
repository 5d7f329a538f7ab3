//! Embedding providers.
//!
//! Turn chunk and query text into fixed-dimension vectors. `trigram` runs
//! offline and is deterministic; `ollama` calls a local embedding model.

pub mod config;
pub mod provider;
pub mod providers;

pub use config::EmbeddingConfig;
pub use provider::{create_provider, EmbeddingProvider};
