//! Retrieval configuration (`.lectern/rag.yaml`).

use crate::embeddings::EmbeddingConfig;
use lectern_core::config::STATE_DIR;
use lectern_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Chunking, retrieval, session and generation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RagConfig {
    /// Maximum characters per chunk
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Characters shared between consecutive chunks of a lesson
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,

    /// Search results returned per query
    #[serde(default = "default_max_results")]
    pub max_results: usize,

    /// Conversation turns kept per session
    #[serde(default = "default_max_history")]
    pub max_history: usize,

    /// Tool-use rounds before the final tool-free call
    #[serde(default = "default_max_tool_rounds")]
    pub max_tool_rounds: usize,

    #[serde(default)]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Course documents, relative to the workspace
    #[serde(default = "default_docs_path")]
    pub docs_path: PathBuf,

    /// SQLite vector store, relative to the workspace
    #[serde(default = "default_vector_store_path")]
    pub vector_store_path: PathBuf,

    #[serde(default)]
    pub embedding: EmbeddingConfig,
}

fn default_chunk_size() -> usize {
    800
}

fn default_chunk_overlap() -> usize {
    100
}

fn default_max_results() -> usize {
    5
}

fn default_max_history() -> usize {
    2
}

fn default_max_tool_rounds() -> usize {
    2
}

fn default_max_tokens() -> u32 {
    800
}

fn default_docs_path() -> PathBuf {
    PathBuf::from("docs")
}

fn default_vector_store_path() -> PathBuf {
    PathBuf::from(STATE_DIR).join("vector_store.sqlite")
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            max_results: default_max_results(),
            max_history: default_max_history(),
            max_tool_rounds: default_max_tool_rounds(),
            temperature: 0.0,
            max_tokens: default_max_tokens(),
            docs_path: default_docs_path(),
            vector_store_path: default_vector_store_path(),
            embedding: EmbeddingConfig::default(),
        }
    }
}

impl RagConfig {
    /// Load from `.lectern/rag.yaml`, falling back to defaults when absent.
    pub fn load(workspace: &Path) -> AppResult<Self> {
        let config_path = get_config_path(workspace);

        let config = if config_path.exists() {
            let content = fs::read_to_string(&config_path).map_err(|e| {
                AppError::Config(format!("Failed to read config at {:?}: {}", config_path, e))
            })?;

            let config: RagConfig = serde_yaml::from_str(&content).map_err(|e| {
                AppError::Config(format!("Failed to parse config at {:?}: {}", config_path, e))
            })?;

            tracing::debug!("Loaded retrieval config from {:?}", config_path);
            config
        } else {
            tracing::debug!("No retrieval config at {:?}, using defaults", config_path);
            Self::default()
        };

        config.validate()?;
        Ok(config)
    }

    /// Write to `.lectern/rag.yaml`.
    pub fn save(&self, workspace: &Path) -> AppResult<()> {
        let config_path = get_config_path(workspace);

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                AppError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        let yaml = serde_yaml::to_string(self)?;
        fs::write(&config_path, yaml).map_err(|e| {
            AppError::Config(format!("Failed to write config to {:?}: {}", config_path, e))
        })?;

        tracing::debug!("Saved retrieval config to {:?}", config_path);
        Ok(())
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.chunk_size == 0 {
            return Err(AppError::Config("chunkSize must be greater than 0".to_string()));
        }

        if self.chunk_overlap >= self.chunk_size {
            return Err(AppError::Config(format!(
                "chunkOverlap ({}) must be smaller than chunkSize ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }

        if self.max_results == 0 {
            return Err(AppError::Config("maxResults must be greater than 0".to_string()));
        }

        if self.max_tool_rounds == 0 {
            return Err(AppError::Config(
                "maxToolRounds must be greater than 0".to_string(),
            ));
        }

        if self.max_tokens == 0 {
            return Err(AppError::Config("maxTokens must be greater than 0".to_string()));
        }

        if self.embedding.dimensions == 0 {
            return Err(AppError::Config(
                "embedding.dimensions must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Docs directory resolved against the workspace.
    pub fn docs_dir(&self, workspace: &Path) -> PathBuf {
        workspace.join(&self.docs_path)
    }

    /// Vector store file resolved against the workspace.
    pub fn vector_store_file(&self, workspace: &Path) -> PathBuf {
        workspace.join(&self.vector_store_path)
    }
}

/// Path of the retrieval config file.
pub fn get_config_path(workspace: &Path) -> PathBuf {
    workspace.join(STATE_DIR).join("rag.yaml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_default_config() {
        let temp = TempDir::new().unwrap();
        let config = RagConfig::load(temp.path()).unwrap();

        assert_eq!(config.chunk_size, 800);
        assert_eq!(config.chunk_overlap, 100);
        assert_eq!(config.max_results, 5);
        assert_eq!(config.max_history, 2);
        assert_eq!(config.max_tool_rounds, 2);
        assert_eq!(config.max_tokens, 800);
        assert_eq!(config.embedding.provider, "trigram");
        assert!(config
            .vector_store_file(temp.path())
            .ends_with(".lectern/vector_store.sqlite"));
    }

    #[test]
    fn test_save_and_load_config() {
        let temp = TempDir::new().unwrap();
        let config = RagConfig {
            chunk_size: 1024,
            max_results: 3,
            ..Default::default()
        };

        config.save(temp.path()).unwrap();

        let loaded = RagConfig::load(temp.path()).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config: RagConfig = serde_yaml::from_str("chunkSize: 500\nmaxHistory: 4\n").unwrap();
        assert_eq!(config.chunk_size, 500);
        assert_eq!(config.max_history, 4);
        assert_eq!(config.chunk_overlap, 100);
        assert_eq!(config.docs_path, PathBuf::from("docs"));
    }

    #[test]
    fn test_overlap_must_be_smaller_than_size() {
        let config = RagConfig {
            chunk_size: 100,
            chunk_overlap: 100,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(AppError::Config(_))));
    }

    #[test]
    fn test_zero_tool_rounds_is_invalid() {
        let config = RagConfig {
            max_tool_rounds: 0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("maxToolRounds"));
    }

    #[test]
    fn test_invalid_file_is_config_error() {
        let temp = TempDir::new().unwrap();
        let path = get_config_path(temp.path());
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "chunkSize: [not a number]").unwrap();

        assert!(matches!(RagConfig::load(temp.path()), Err(AppError::Config(_))));
    }
}
