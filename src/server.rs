use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use tower_http::cors::{AllowHeaders, CorsLayer};
use tower_http::trace::TraceLayer;

use tracing::info;

use crate::AppState;
use crate::ai::ChatMessage;
use crate::config::AppConfig;
use crate::session::{Message, MessageRole, SessionError, SessionStore};

/// Session header used by the frontend to carry the conversation id.
static X_SESSION_ID: HeaderName = HeaderName::from_static("x-session-id");

/// Start the Axum server with the provided configuration.
pub async fn start_server(config: Arc<AppConfig>, state: AppState) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(
        name: "server.started",
        address = %addr,
        "Server started"
    );

    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}

/// Build the application router.
///
/// Exposed separately from [`start_server`] so integration tests can mount
/// the router without binding a socket.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(
            state
                .config
                .cors
                .allowed_origin
                .parse::<HeaderValue>()
                .unwrap_or_else(|_| HeaderValue::from_static("http://localhost:3000")),
        )
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
        .expose_headers([X_SESSION_ID.clone()]);

    Router::new()
        .route("/", get(health_check))
        .route("/session", get(create_session))
        .route("/chat", post(chat))
        .route("/history", get(get_history))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ─────────────────────────────────────────────────────────────────────────────
// Error taxonomy
// ─────────────────────────────────────────────────────────────────────────────

/// Errors surfaced by the API handlers.
///
/// The store only ever raises `NotFound`; validation and upstream
/// failures are detected here, above the store boundary.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Malformed input, rejected before it reaches the store.
    #[error("{0}")]
    Validation(String),
    /// Unknown session identifier.
    #[error(transparent)]
    NotFound(#[from] SessionError),
    /// The AI provider call failed.
    #[error("upstream AI provider error: {0}")]
    Upstream(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::Validation(msg) => {
                let detail = serde_json::json!([{
                    "loc": ["body", "question"],
                    "msg": msg,
                    "type": "value_error",
                }]);
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    Json(serde_json::json!({ "detail": detail })),
                )
                    .into_response()
            }
            Self::NotFound(err) => (
                StatusCode::NOT_FOUND,
                Json(serde_json::json!({ "detail": err.to_string() })),
            )
                .into_response(),
            Self::Upstream(msg) => {
                tracing::warn!(name: "ai.upstream.error", error = %msg, "AI provider call failed");
                (
                    StatusCode::BAD_GATEWAY,
                    Json(serde_json::json!({ "detail": msg })),
                )
                    .into_response()
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// API Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// Request body for the chat endpoint.
#[derive(Debug, Deserialize)]
struct ChatRequest {
    /// The user's question.
    question: String,
    /// Optional context to improve the answer (e.g. subject).
    #[serde(default)]
    context: Option<String>,
    /// Limit on previous messages included in the provider prompt.
    /// `0` means unlimited.
    #[serde(default = "default_max_history")]
    max_history: usize,
}

fn default_max_history() -> usize {
    10
}

/// Response body for the chat endpoint.
#[derive(Debug, Serialize)]
struct ChatResponse {
    /// Echo of the session id used.
    session_id: String,
    /// AI-generated answer.
    answer: String,
}

/// Response body for the history endpoint.
#[derive(Debug, Serialize)]
struct HistoryResponse {
    /// The session whose history is returned.
    session_id: String,
    /// Transcript in insertion order.
    messages: Vec<Message>,
}

/// GET / - Health check.
async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "message": "Healthy" }))
}

/// GET /session - Create a new chat session.
async fn create_session(State(state): State<AppState>) -> Json<serde_json::Value> {
    let session = state.sessions.create();
    tracing::debug!(session_id = %session.id, "Created new session");
    Json(serde_json::json!({ "session_id": session.id }))
}

/// POST /chat - Submit a question and receive an AI-generated answer.
///
/// The session is carried in the `X-Session-Id` header. When the header
/// is missing or blank a new session is created, echoed back in the
/// response header, and the success status is 201 instead of 200.
async fn chat(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<ChatRequest>,
) -> Result<Response, ApiError> {
    tracing::info!(
        question_length = req.question.len(),
        max_history = req.max_history,
        "Received chat request"
    );

    let question = req.question.trim().to_string();
    validate_question(&question).map_err(ApiError::Validation)?;

    let (session_id, created) = ensure_session(&state.sessions, &headers);

    state
        .sessions
        .append_message(&session_id, MessageRole::User, question)?;

    // Build the provider prompt from a capped slice of the history. The
    // provider call happens outside the store lock; on failure the user
    // message stays as the last transcript entry.
    let history = state.sessions.messages(&session_id)?;
    let mut prompt: Vec<ChatMessage> = history_tail(&history, req.max_history)
        .iter()
        .map(ChatMessage::from)
        .collect();

    if let Some(context) = req.context.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
        prompt.insert(0, ChatMessage::system(format!("Context: {context}")));
    }

    let answer = state
        .ai
        .generate_reply(&prompt)
        .await
        .map_err(|e| ApiError::Upstream(e.to_string()))?;

    state
        .sessions
        .append_message(&session_id, MessageRole::Assistant, answer.clone())?;

    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };

    tracing::debug!(
        session_id = %session_id,
        created = created,
        answer_length = answer.len(),
        "Chat request processed"
    );

    Ok(with_session_header(
        status,
        created.then(|| session_id.clone()),
        Json(ChatResponse { session_id, answer }),
    ))
}

/// GET /history - Get the chat history for a session.
///
/// A missing header creates a fresh empty session (201 + header echo);
/// a supplied but unknown id is a not-found error.
async fn get_history(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    match header_session_id(&headers) {
        Some(session_id) => {
            let messages = state.sessions.messages(&session_id)?;
            Ok(with_session_header(
                StatusCode::OK,
                None,
                Json(HistoryResponse {
                    session_id,
                    messages,
                }),
            ))
        }
        None => {
            let session = state.sessions.create();
            tracing::debug!(session_id = %session.id, "Created empty session for history request");
            Ok(with_session_header(
                StatusCode::CREATED,
                Some(session.id.clone()),
                Json(HistoryResponse {
                    session_id: session.id,
                    messages: Vec::new(),
                }),
            ))
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

/// Extract a non-blank session id from the `X-Session-Id` header.
fn header_session_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get(&X_SESSION_ID)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

/// Resolve the session for a chat request.
///
/// A supplied id is honored even if the store has never seen it (the
/// session is auto-created under that id); the created flag is only set
/// when no id was supplied at all, since that is when the client needs
/// the header echo to learn its session.
fn ensure_session(sessions: &SessionStore, headers: &HeaderMap) -> (String, bool) {
    match header_session_id(headers) {
        Some(id) => {
            if sessions.get(&id).is_err() {
                let _ = sessions.create_with_id(&id);
            }
            (id, false)
        }
        None => (sessions.create().id, true),
    }
}

/// Heuristic validation for incoming questions.
fn validate_question(trimmed: &str) -> Result<(), String> {
    if trimmed.is_empty() {
        return Err("question must be a non-empty string".to_string());
    }
    if trimmed.chars().count() > 1000 {
        return Err("question is too long; maximum 1000 characters".to_string());
    }
    if !trimmed.chars().any(char::is_alphanumeric) {
        return Err("question appears unclear; please include alphanumeric characters".to_string());
    }
    if trimmed.chars().count() < 3 {
        return Err("question is too short; please provide more details".to_string());
    }
    Ok(())
}

/// Last `limit` messages of the transcript; `0` means the whole thing.
fn history_tail(history: &[Message], limit: usize) -> &[Message] {
    if limit == 0 || history.len() <= limit {
        history
    } else {
        &history[history.len() - limit..]
    }
}

/// Build a response, echoing the session id header when one was created.
fn with_session_header(
    status: StatusCode,
    created_id: Option<String>,
    body: impl IntoResponse,
) -> Response {
    let mut response = (status, body).into_response();
    if let Some(id) = created_id
        && let Ok(value) = HeaderValue::from_str(&id)
    {
        response.headers_mut().insert(X_SESSION_ID.clone(), value);
    }
    response
}
