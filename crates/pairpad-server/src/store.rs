//! Session store: maps session IDs to their shared document state.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use pairpad_common::Language;

/// The shared state of one session: one code document, one language.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    pub code: String,
    pub language: Language,
}

/// Thread-safe session store.
///
/// All mutations go through the single write lock, so updates to a given
/// session are linearizable: a reader never observes a half-applied change.
/// Sessions live for the process lifetime; there is no deletion.
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<String, SessionState>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Create a session eagerly. Returns false if it already exists.
    pub async fn create(&self, session_id: &str) -> bool {
        let mut map = self.sessions.write().await;
        if map.contains_key(session_id) {
            return false;
        }
        map.insert(session_id.to_string(), SessionState::default());
        true
    }

    /// Return the session's state, creating it with defaults if absent.
    pub async fn get_or_create(&self, session_id: &str) -> SessionState {
        let mut map = self.sessions.write().await;
        map.entry(session_id.to_string()).or_default().clone()
    }

    /// Replace the session's code. Returns false (update dropped) if the
    /// session does not exist.
    pub async fn apply_code_change(&self, session_id: &str, code: String) -> bool {
        let mut map = self.sessions.write().await;
        match map.get_mut(session_id) {
            Some(session) => {
                session.code = code;
                true
            }
            None => false,
        }
    }

    /// Replace the session's language. Same contract as code changes.
    pub async fn apply_language_change(&self, session_id: &str, language: Language) -> bool {
        let mut map = self.sessions.write().await;
        match map.get_mut(session_id) {
            Some(session) => {
                session.language = language;
                true
            }
            None => false,
        }
    }

    /// Current state of a session, if it exists.
    pub async fn snapshot(&self, session_id: &str) -> Option<SessionState> {
        self.sessions.read().await.get(session_id).cloned()
    }

    /// Number of live sessions.
    pub async fn count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}
