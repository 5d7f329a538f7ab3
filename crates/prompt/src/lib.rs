//! Prompt system for Lectern.
//!
//! This crate provides the answer prompt used by the orchestrator:
//! - YAML-based prompt definitions with a built-in default
//! - Workspace overrides under `.lectern/prompts/`
//! - Handlebars rendering of the system prompt (with conversation history)
//!   and of the user query

pub mod builder;
pub mod defaults;
pub mod loader;
pub mod types;

// Re-export main types
pub use builder::build_prompt;
pub use defaults::{default_answer_prompt, ANSWER_PROMPT_ID};
pub use loader::{load_prompt, resolve_prompt};
pub use types::{BuiltPrompt, BuiltPromptMetadata, PromptDefinition};
