use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use std::env;

use crate::ai::AiSettings;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file path
    #[arg(short, long, env = "CONFIG_FILE")]
    pub config: Option<String>,

    /// Port to listen on
    #[arg(long, env = "PORT")]
    pub port: Option<u16>,

    /// Host to bind
    #[arg(long, env = "HOST")]
    pub host: Option<String>,

    /// Allowed CORS origin for the browser frontend
    #[arg(long, env = "CORS_ALLOWED_ORIGIN")]
    pub cors_allowed_origin: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub cors: CorsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    pub allowed_origin: String,
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from_args(std::env::args())
    }

    /// Load configuration with the usual layering:
    /// defaults < config file < `AQA_`-prefixed env vars < CLI flags.
    pub fn load_from_args<I, T>(args: I) -> Result<Self, config::ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let cli =
            Cli::try_parse_from(args).map_err(|e| config::ConfigError::Message(e.to_string()))?;

        let mut builder = Config::builder()
            .set_default("server.port", 8000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("cors.allowed_origin", "http://localhost:3000")?;

        // Optional config file (via --config / CONFIG_FILE), then ./config.yaml
        // as a cwd fallback.
        if let Some(path) = &cli.config {
            builder = builder.add_source(File::with_name(path));
        } else {
            builder = builder.add_source(File::with_name("config").required(false));
        }

        // Environment variables prefixed with AQA_, e.g. AQA_SERVER__PORT=8000.
        builder = builder.add_source(
            Environment::with_prefix("AQA")
                .separator("__")
                .try_parsing(true),
        );

        // CLI flags (and their env fallbacks handled by clap) win.
        if let Some(port) = cli.port {
            builder = builder.set_override("server.port", port)?;
        }
        if let Some(host) = cli.host {
            builder = builder.set_override("server.host", host)?;
        }
        if let Some(origin) = cli.cors_allowed_origin {
            builder = builder.set_override("cors.allowed_origin", origin)?;
        }

        let cfg = builder.build()?;
        cfg.try_deserialize()
    }
}

/// Load AI provider settings from the environment.
///
/// Missing `OPENAI_API_KEY` is not an error: it selects the deterministic
/// mock client so the service runs without credentials.
#[must_use]
pub fn load_ai_settings() -> AiSettings {
    AiSettings {
        api_key: env::var("OPENAI_API_KEY")
            .ok()
            .filter(|s| !s.trim().is_empty()),
        model: env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string()),
        base_url: env::var("OPENAI_BASE_URL")
            .ok()
            .filter(|s| !s.trim().is_empty()),
        app_env: env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        mock_seed: env::var("MOCK_DETERMINISTIC_SEED")
            .unwrap_or_else(|_| "academic-query-assistant".to_string()),
    }
}
