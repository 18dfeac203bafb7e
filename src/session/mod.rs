//! Session and transcript management.
//!
//! This module provides in-memory session storage for managing conversation
//! state across multiple requests. Sessions are identified by UUID and contain
//! the full message history; all state is volatile and scoped to the process.
//!
//! # Architecture
//!
//! - [`Session`]: Snapshot of a single conversation session
//! - [`SessionStore`]: Thread-safe store for all active sessions
//!
//! # Example
//!
//! ```rust
//! use academic_query_assistant::session::{MessageRole, SessionStore};
//!
//! let store = SessionStore::new();
//! let session = store.create();
//! store
//!     .append_message(&session.id, MessageRole::User, "What is entropy?")
//!     .unwrap();
//!
//! let messages = store.messages(&session.id).unwrap();
//! assert_eq!(messages.len(), 1);
//! ```

mod store;

pub use store::{Message, MessageRole, Session, SessionError, SessionStats, SessionStore};
