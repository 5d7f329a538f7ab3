//! Orchestrator response types.

use crate::types::Source;
use serde::{Deserialize, Serialize};

/// Answer to one question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RagResponse {
    /// Answer text from the reasoning service
    pub answer: String,

    /// Sources gathered by tool calls while answering, in first-use order
    pub sources: Vec<Source>,

    /// Session the turn was recorded in
    pub session_id: String,
}

/// Outcome of ingesting one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DocumentOutcome {
    Added { course_title: String, chunks: usize },
    AlreadyIndexed { course_title: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_response_serialization() {
        let response = RagResponse {
            answer: "Tests catch regressions.".to_string(),
            sources: vec![Source {
                text: "Intro to Testing - Lesson 1".to_string(),
                link: Some("https://example.com/1".to_string()),
            }],
            session_id: "session_1".to_string(),
        };

        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({
                "answer": "Tests catch regressions.",
                "sources": [{"text": "Intro to Testing - Lesson 1", "link": "https://example.com/1"}],
                "session_id": "session_1"
            })
        );
    }

    #[test]
    fn test_document_outcome_tagging() {
        let outcome = DocumentOutcome::AlreadyIndexed {
            course_title: "A".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&outcome).unwrap(),
            json!({"status": "already_indexed", "course_title": "A"})
        );
    }
}
