//! In-memory session and transcript storage.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role of a transcript message author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// User question.
    User,
    /// Assistant answer.
    Assistant,
}

/// One turn in a conversation transcript.
///
/// Messages are immutable once appended; the store only ever hands out
/// owned copies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Role of the message author.
    pub role: MessageRole,
    /// Message text.
    pub content: String,
    /// Time the message was stored.
    pub timestamp: DateTime<Utc>,
}

/// Snapshot of a single conversation session.
///
/// This is plain owned data: mutating a snapshot never affects the state
/// held by the [`SessionStore`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Unique session identifier.
    pub id: String,
    /// Transcript in insertion order.
    pub messages: Vec<Message>,
    /// Session creation time.
    pub created_at: DateTime<Utc>,
    /// Time of the most recent append (creation time if empty).
    pub updated_at: DateTime<Utc>,
}

/// Basic per-session counters.
#[derive(Debug, Clone, Serialize)]
pub struct SessionStats {
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub message_count: usize,
}

/// Errors raised by the session store.
///
/// `NotFound` is the only failure the store itself produces; validation
/// and provider failures belong to the handler layer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// The requested session identifier is unknown.
    #[error("session not found: {id}")]
    NotFound {
        /// Identifier that was looked up.
        id: String,
    },
}

impl SessionError {
    fn not_found(id: &str) -> Self {
        Self::NotFound { id: id.to_string() }
    }
}

/// Thread-safe store for sessions.
///
/// All state lives behind one mutex scoped to the whole mapping, so every
/// operation is fully serialized with respect to every other. Sessions live
/// for the process lifetime; there is no expiry or eviction.
///
/// Lock discipline: `std::sync::Mutex` is not reentrant, so no public
/// operation may call another while holding the guard. Each operation is a
/// single short critical section with no I/O inside it.
#[derive(Debug, Clone)]
pub struct SessionStore {
    inner: Arc<Mutex<HashMap<String, SessionEntry>>>,
}

/// Store-internal session state. Snapshots are cloned out of this.
#[derive(Debug)]
struct SessionEntry {
    messages: Vec<Message>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl SessionEntry {
    fn new() -> Self {
        let now = Utc::now();
        Self {
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    fn snapshot(&self, id: &str) -> Session {
        Session {
            id: id.to_string(),
            messages: self.messages.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    /// Create a new, empty session store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Create a new session with a fresh UUID and return its snapshot.
    ///
    /// Never fails; a v4 UUID cannot collide with a live session in
    /// practice, and the insertion replaces nothing.
    #[must_use]
    pub fn create(&self) -> Session {
        self.create_with_id(Uuid::new_v4().to_string())
    }

    /// Create a session under a caller-supplied identifier.
    ///
    /// Used by the handler layer when it decides to auto-create a session
    /// for an id the client presented but the store has never seen. An
    /// existing session under the same id is left untouched.
    pub fn create_with_id(&self, id: impl Into<String>) -> Session {
        let id = id.into();
        let mut guard = self.lock();
        let entry = guard.entry(id.clone()).or_insert_with(SessionEntry::new);
        entry.snapshot(&id)
    }

    /// Get a snapshot of a session by id.
    pub fn get(&self, id: &str) -> Result<Session, SessionError> {
        let guard = self.lock();
        guard
            .get(id)
            .map(|entry| entry.snapshot(id))
            .ok_or_else(|| SessionError::not_found(id))
    }

    /// Atomically append a message to a session's transcript.
    ///
    /// Returns the updated snapshot. The append is all-or-nothing: a
    /// concurrent reader observes the transcript either without the new
    /// message or with it complete, never in between.
    pub fn append_message(
        &self,
        id: &str,
        role: MessageRole,
        content: impl Into<String>,
    ) -> Result<Session, SessionError> {
        let message = Message {
            role,
            content: content.into(),
            timestamp: Utc::now(),
        };

        let mut guard = self.lock();
        let entry = guard.get_mut(id).ok_or_else(|| SessionError::not_found(id))?;
        entry.updated_at = message.timestamp;
        entry.messages.push(message);
        Ok(entry.snapshot(id))
    }

    /// Get the full transcript of a session in insertion order.
    pub fn messages(&self, id: &str) -> Result<Vec<Message>, SessionError> {
        let guard = self.lock();
        guard
            .get(id)
            .map(|entry| entry.messages.clone())
            .ok_or_else(|| SessionError::not_found(id))
    }

    /// Return basic counters for a session.
    pub fn stats(&self, id: &str) -> Result<SessionStats, SessionError> {
        let guard = self.lock();
        guard
            .get(id)
            .map(|entry| SessionStats {
                created_at: entry.created_at,
                updated_at: entry.updated_at,
                message_count: entry.messages.len(),
            })
            .ok_or_else(|| SessionError::not_found(id))
    }

    /// Remove a session and its transcript, returning the final snapshot.
    pub fn remove(&self, id: &str) -> Option<Session> {
        let mut guard = self.lock();
        guard.remove(id).map(|entry| entry.snapshot(id))
    }

    /// List all known session ids.
    #[must_use]
    pub fn list_ids(&self) -> Vec<String> {
        self.lock().keys().cloned().collect()
    }

    /// Number of live sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Check if there are no sessions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, SessionEntry>> {
        // A poisoned mutex means another thread panicked mid-append; the
        // map itself is still structurally sound, so keep serving.
        self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}
