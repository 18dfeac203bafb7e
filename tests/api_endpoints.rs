//! End-to-end tests for the HTTP API.
//!
//! Each test mounts the router on an in-process test server with an
//! explicitly constructed state, so no environment variables or network
//! access are involved.

use std::sync::Arc;

use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::{Value, json};

use academic_query_assistant::AppState;
use academic_query_assistant::ai::{AiClient, ChatMessage, MockClient};
use academic_query_assistant::config::{AppConfig, CorsConfig, ServerConfig};
use academic_query_assistant::server::build_router;
use academic_query_assistant::session::SessionStore;

const SESSION_HEADER: &str = "x-session-id";

fn test_config() -> Arc<AppConfig> {
    Arc::new(AppConfig {
        server: ServerConfig {
            port: 0,
            host: "127.0.0.1".to_string(),
        },
        cors: CorsConfig {
            allowed_origin: "http://localhost:3000".to_string(),
        },
    })
}

fn mock_server() -> TestServer {
    server_with_client(Arc::new(MockClient::new("test-seed", "gpt-4o-mini")))
}

fn server_with_client(ai: Arc<dyn AiClient>) -> TestServer {
    let state = AppState {
        sessions: SessionStore::new(),
        ai,
        config: test_config(),
    };
    TestServer::new(build_router(state)).expect("failed to start test server")
}

/// AI client that always fails, simulating an upstream provider outage.
struct FailingClient;

#[async_trait::async_trait]
impl AiClient for FailingClient {
    async fn generate_reply(&self, _messages: &[ChatMessage]) -> anyhow::Result<String> {
        anyhow::bail!("simulated openai error")
    }
}

#[tokio::test]
async fn test_health_check_ok() {
    let server = mock_server();

    let response = server.get("/").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.json::<Value>()["message"], "Healthy");
}

#[tokio::test]
async fn test_session_returns_uuid() {
    let server = mock_server();

    let response = server.get("/session").await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let body = response.json::<Value>();
    let sid = body["session_id"].as_str().expect("missing session_id");
    let parsed = uuid::Uuid::parse_str(sid).expect("session_id is not a UUID");
    assert_eq!(parsed.to_string(), sid);

    // The session is registered: its history is immediately readable.
    let history = server.get("/history").add_header(SESSION_HEADER, sid).await;
    assert_eq!(history.status_code(), StatusCode::OK);
    assert_eq!(history.json::<Value>()["messages"], json!([]));
}

#[tokio::test]
async fn test_chat_validation_errors() {
    let server = mock_server();

    let long = "x".repeat(1001);
    let cases = [
        ("", "non-empty"),
        ("  ", "non-empty"),
        ("??", "unclear"),
        ("ab", "too short"),
        (long.as_str(), "too long"),
    ];

    for (question, fragment) in cases {
        let response = server.post("/chat").json(&json!({ "question": question })).await;
        assert_eq!(
            response.status_code(),
            StatusCode::UNPROCESSABLE_ENTITY,
            "question {question:?} should be rejected"
        );

        let detail = response.json::<Value>()["detail"].clone();
        let msg = detail[0]["msg"].as_str().unwrap_or_default().to_string();
        assert!(
            msg.contains(fragment),
            "expected {fragment:?} in {msg:?} for question {question:?}"
        );
    }
}

#[tokio::test]
async fn test_chat_auto_creates_session() {
    let server = mock_server();

    let response = server
        .post("/chat")
        .json(&json!({ "question": "What is the Pythagorean theorem?" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);

    let header_id = response
        .headers()
        .get(SESSION_HEADER)
        .expect("missing X-Session-Id header")
        .to_str()
        .unwrap()
        .to_string();

    let body = response.json::<Value>();
    assert_eq!(body["session_id"], header_id.as_str());

    let answer = body["answer"].as_str().expect("missing answer");
    assert!(answer.starts_with("[MockAnswer:"));
}

#[tokio::test]
async fn test_chat_with_existing_session_is_200() {
    let server = mock_server();

    let sid = server.get("/session").await.json::<Value>()["session_id"]
        .as_str()
        .unwrap()
        .to_string();

    let response = server
        .post("/chat")
        .add_header(SESSION_HEADER, sid.as_str())
        .json(&json!({ "question": "Explain Newton's first law." }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert!(response.headers().get(SESSION_HEADER).is_none());
    assert_eq!(response.json::<Value>()["session_id"], sid.as_str());
}

#[tokio::test]
async fn test_history_returns_messages_for_session() {
    let server = mock_server();

    let chat = server
        .post("/chat")
        .json(&json!({ "question": "Explain Newton's first law." }))
        .await;
    assert_eq!(chat.status_code(), StatusCode::CREATED);
    let sid = chat
        .headers()
        .get(SESSION_HEADER)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();

    let response = server.get("/history").add_header(SESSION_HEADER, sid.as_str()).await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let body = response.json::<Value>();
    assert_eq!(body["session_id"], sid.as_str());

    let messages = body["messages"].as_array().expect("messages not a list");
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["role"], "user");
    assert_eq!(messages[0]["content"], "Explain Newton's first law.");
    assert_eq!(messages[1]["role"], "assistant");
    for message in messages {
        assert!(message["timestamp"].is_string());
    }
}

#[tokio::test]
async fn test_history_unknown_session_is_404() {
    let server = mock_server();

    let response = server
        .get("/history")
        .add_header(SESSION_HEADER, "never-issued-id")
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    assert!(
        response.json::<Value>()["detail"]
            .as_str()
            .unwrap()
            .contains("never-issued-id")
    );
}

#[tokio::test]
async fn test_history_without_header_creates_empty_session() {
    let server = mock_server();

    let response = server.get("/history").await;
    assert_eq!(response.status_code(), StatusCode::CREATED);

    let sid = response
        .headers()
        .get(SESSION_HEADER)
        .expect("missing X-Session-Id header")
        .to_str()
        .unwrap()
        .to_string();

    let body = response.json::<Value>();
    assert_eq!(body["session_id"], sid.as_str());
    assert_eq!(body["messages"], json!([]));
}

#[tokio::test]
async fn test_upstream_error_results_in_502() {
    let server = server_with_client(Arc::new(FailingClient));

    let sid = server.get("/session").await.json::<Value>()["session_id"]
        .as_str()
        .unwrap()
        .to_string();

    let response = server
        .post("/chat")
        .add_header(SESSION_HEADER, sid.as_str())
        .json(&json!({ "question": "Trigger upstream error" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_GATEWAY);
    assert!(
        response.json::<Value>()["detail"]
            .as_str()
            .unwrap()
            .contains("simulated openai error")
    );

    // No assistant message was appended on the failure path.
    let history = server.get("/history").add_header(SESSION_HEADER, sid.as_str()).await;
    let messages = history.json::<Value>()["messages"].as_array().unwrap().clone();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0]["role"], "user");
}

#[tokio::test]
async fn test_mock_answers_are_deterministic_per_conversation() {
    let server = mock_server();
    let question = json!({ "question": "What is entropy?" });

    let first = server.post("/chat").json(&question).await.json::<Value>();
    let second = server.post("/chat").json(&question).await.json::<Value>();

    // Fresh sessions with identical transcripts get identical mock replies.
    assert_eq!(first["answer"], second["answer"]);
}
