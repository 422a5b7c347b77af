//! Session Memory Store — process-wide, per-session chat transcripts.
//!
//! Sessions are keyed by a caller-supplied string, created lazily on first
//! access, and live for the lifetime of the process. Transcripts are strictly
//! append-only: a turn is never mutated, reordered, or removed.
//!
//! The store is shared mutable state across concurrent requests, so every
//! operation takes the map lock. `append_exchange` records a (user, assistant)
//! pair under a single lock acquisition so no reader can ever observe a
//! half-recorded turn.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sentinel session key used when the caller does not supply one.
pub const DEFAULT_SESSION_ID: &str = "default_session";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One transcript entry. `created_at` records wall-clock arrival order;
/// transcript order and arrival order are always identical.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
            created_at: Utc::now(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
            created_at: Utc::now(),
        }
    }
}

/// Process-wide mapping from session key to ordered transcript.
///
/// Cloning shares the underlying map. Constructed once in `main` and injected
/// through `AppState`; nothing reads it as a global.
#[derive(Clone, Default)]
pub struct SessionStore {
    inner: Arc<Mutex<HashMap<String, Vec<Turn>>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read-only snapshot of a session's transcript, in chronological order.
    /// Creates an empty session if the key has never been seen (idempotent).
    pub fn history(&self, session_id: &str) -> Vec<Turn> {
        let mut sessions = self.lock();
        sessions.entry(session_id.to_string()).or_default().clone()
    }

    /// Appends a single turn to a session's transcript.
    #[allow(dead_code)]
    pub fn append(&self, session_id: &str, turn: Turn) {
        let mut sessions = self.lock();
        sessions.entry(session_id.to_string()).or_default().push(turn);
    }

    /// Appends a completed (user, assistant) exchange atomically.
    ///
    /// Called only after the whole turn has succeeded; a failed turn leaves
    /// the transcript untouched, so no user-only orphan entry can exist.
    pub fn append_exchange(&self, session_id: &str, question: &str, answer: &str) {
        let mut sessions = self.lock();
        let transcript = sessions.entry(session_id.to_string()).or_default();
        transcript.push(Turn::user(question));
        transcript.push(Turn::assistant(answer));
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Vec<Turn>>> {
        self.inner.lock().expect("session store lock poisoned")
    }
}

/// Resolves the caller-supplied session key, falling back to the sentinel.
/// Blank keys count as unset; no other validation is applied.
pub fn resolve_session_id(raw: Option<String>) -> String {
    match raw {
        Some(id) if !id.trim().is_empty() => id,
        _ => DEFAULT_SESSION_ID.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_creates_empty_session() {
        let store = SessionStore::new();
        assert!(store.history("fresh").is_empty());
        // Lookup is idempotent: the second call sees the same empty session.
        assert!(store.history("fresh").is_empty());
    }

    #[test]
    fn test_append_preserves_chronological_order() {
        let store = SessionStore::new();
        store.append("s1", Turn::user("first"));
        store.append("s1", Turn::assistant("second"));
        store.append("s1", Turn::user("third"));

        let history = store.history("s1");
        let texts: Vec<&str> = history.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_n_exchanges_yield_2n_alternating_turns() {
        let store = SessionStore::new();
        for i in 0..5 {
            store.append_exchange("s1", &format!("q{i}"), &format!("a{i}"));
        }

        let history = store.history("s1");
        assert_eq!(history.len(), 10);
        for (i, turn) in history.iter().enumerate() {
            let expected = if i % 2 == 0 { Role::User } else { Role::Assistant };
            assert_eq!(turn.role, expected, "turn {i} has wrong role");
        }
    }

    #[test]
    fn test_sessions_are_isolated_by_key() {
        let store = SessionStore::new();
        store.append_exchange("alice", "q", "a");
        store.append_exchange("bob", "x", "y");

        assert_eq!(store.history("alice").len(), 2);
        assert_eq!(store.history("bob").len(), 2);
        assert_eq!(store.history("alice")[0].text, "q");
        assert_eq!(store.history("bob")[0].text, "x");
    }

    #[test]
    fn test_history_returns_snapshot_not_live_view() {
        let store = SessionStore::new();
        store.append_exchange("s1", "q0", "a0");
        let snapshot = store.history("s1");
        store.append_exchange("s1", "q1", "a1");

        assert_eq!(snapshot.len(), 2);
        assert_eq!(store.history("s1").len(), 4);
    }

    #[test]
    fn test_resolve_session_id_defaults() {
        assert_eq!(resolve_session_id(None), DEFAULT_SESSION_ID);
        assert_eq!(resolve_session_id(Some("".to_string())), DEFAULT_SESSION_ID);
        assert_eq!(resolve_session_id(Some("   ".to_string())), DEFAULT_SESSION_ID);
        assert_eq!(resolve_session_id(Some("career-chat".to_string())), "career-chat");
    }

    #[test]
    fn test_turn_role_serializes_lowercase() {
        let turn = Turn::user("hello");
        let json = serde_json::to_value(&turn).unwrap();
        assert_eq!(json["role"], "user");
        let turn = Turn::assistant("hi");
        let json = serde_json::to_value(&turn).unwrap();
        assert_eq!(json["role"], "assistant");
    }
}
