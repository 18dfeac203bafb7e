//! Academic Query Assistant Server
//!
//! Entry point for the academic question-answering REST backend.

use mimalloc::MiMalloc;

/// Global allocator for improved performance (M-MIMALLOC-APPS).
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

use std::sync::Arc;

use dotenvy::dotenv;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use academic_query_assistant::AppState;
use academic_query_assistant::ai;
use academic_query_assistant::config::{AppConfig, load_ai_settings};
use academic_query_assistant::server::start_server;
use academic_query_assistant::session::SessionStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing (M-LOG-STRUCTURED)
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    // Load .env (if present)
    let _ = dotenv();

    let config = match AppConfig::load() {
        Ok(c) => Arc::new(c),
        Err(e) => {
            eprintln!("Configuration error: {e}");
            std::process::exit(1);
        }
    };

    let settings = load_ai_settings();
    info!(
        name: "ai.config.loaded",
        model = %settings.model,
        app_env = %settings.app_env,
        mock = settings.api_key.is_none(),
        "AI configuration loaded"
    );

    let state = AppState {
        sessions: SessionStore::new(),
        ai: ai::build_client(&settings),
        config: Arc::clone(&config),
    };

    start_server(config, state).await
}
