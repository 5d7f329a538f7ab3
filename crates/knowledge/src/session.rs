//! In-memory conversation sessions with bounded history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use tokio::sync::RwLock;
use uuid::Uuid;

/// One question and its answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub query: String,
    pub response: String,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct Session {
    turns: VecDeque<Turn>,
}

/// Maps session ids to their most recent turns.
///
/// Nothing is persisted; sessions end with the process or on
/// [`SessionManager::remove`].
#[derive(Debug)]
pub struct SessionManager {
    max_history: usize,
    sessions: RwLock<HashMap<String, Session>>,
}

impl SessionManager {
    pub fn new(max_history: usize) -> Self {
        Self {
            max_history,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Return `session_id`, registering it if unknown, or allocate a new id.
    pub async fn get_or_create(&self, session_id: Option<&str>) -> String {
        let id = match session_id.map(str::trim).filter(|s| !s.is_empty()) {
            Some(id) => id.to_string(),
            None => Uuid::new_v4().to_string(),
        };

        let mut sessions = self.sessions.write().await;
        if !sessions.contains_key(&id) {
            tracing::debug!("Created session {}", id);
            sessions.insert(id.clone(), Session::default());
        }
        id
    }

    /// Record a turn, dropping the oldest beyond the history limit.
    pub async fn append(&self, session_id: &str, query: &str, response: &str) {
        let mut sessions = self.sessions.write().await;
        let session = sessions.entry(session_id.to_string()).or_default();

        session.turns.push_back(Turn {
            query: query.to_string(),
            response: response.to_string(),
            at: Utc::now(),
        });
        while session.turns.len() > self.max_history {
            session.turns.pop_front();
        }
    }

    /// Turns oldest first; empty for unknown sessions.
    pub async fn history(&self, session_id: &str) -> Vec<Turn> {
        self.sessions
            .read()
            .await
            .get(session_id)
            .map(|s| s.turns.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// History as `User:` / `Assistant:` lines, or `None` when empty.
    pub async fn format_history(&self, session_id: &str) -> Option<String> {
        let turns = self.history(session_id).await;
        if turns.is_empty() {
            return None;
        }

        Some(
            turns
                .iter()
                .map(|t| format!("User: {}\nAssistant: {}", t.query, t.response))
                .collect::<Vec<_>>()
                .join("\n"),
        )
    }

    /// Drop a session. Returns whether it existed.
    pub async fn remove(&self, session_id: &str) -> bool {
        self.sessions.write().await.remove(session_id).is_some()
    }

    pub async fn exists(&self, session_id: &str) -> bool {
        self.sessions.read().await.contains_key(session_id)
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}
