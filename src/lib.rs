//! Academic Query Assistant
//!
//! A minimal REST backend for handling academic questions, session
//! histories, and AI answers.
//!
//! # Architecture
//!
//! - **Server**: Axum-based HTTP API (health, session, chat, history)
//! - **Session Store**: process-local, mutex-guarded transcript storage
//! - **AI Provider**: deterministic mock by default, OpenAI-compatible
//!   client when an API key is configured
//!
//! # Modules
//!
//! - [`ai`]: AI client trait and implementations
//! - [`config`]: configuration loading (CLI, env, config file)
//! - [`server`]: router and request handlers
//! - [`session`]: session and transcript management

// Allow pedantic clippy warnings that don't add value for this codebase
#![allow(clippy::cargo_common_metadata)]
#![allow(clippy::multiple_crate_versions)]
#![allow(clippy::unused_async)]

pub mod ai;
pub mod config;
pub mod server;
pub mod session;

use std::sync::Arc;

use crate::ai::AiClient;
use crate::config::AppConfig;
use crate::session::SessionStore;

/// Application state shared across all handlers.
///
/// Constructed once at startup and injected into the router; the store
/// is the only shared mutable resource.
#[derive(Clone)]
pub struct AppState {
    /// Session store for conversation management.
    pub sessions: SessionStore,
    /// AI client selected at process start (mock or real).
    pub ai: Arc<dyn AiClient>,
    /// Global configuration.
    pub config: Arc<AppConfig>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("sessions", &self.sessions)
            .field("config", &self.config)
            .finish()
    }
}
