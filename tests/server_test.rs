// Integration tests for the HTTP server
//
// Each test runs the real router over a local socket, with the Gemini API
// replaced by a mockito server.

use std::net::SocketAddr;
use std::sync::Arc;

use solace::config::RateLimitSettings;
use solace::crisis::CrisisDetector;
use solace::emotion::EmotionEngine;
use solace::llm::GeminiProvider;
use solace::metrics::MetricsLogger;
use solace::server::{create_router, CompanionServer, ServerConfig};

/// Mock one Gemini completion that any request will match.
async fn mock_gemini(server: &mut mockito::ServerGuard, reply: &str) -> mockito::Mock {
    server
        .mock("POST", mockito::Matcher::Regex(":generateContent".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            serde_json::json!({
                "candidates": [{
                    "content": {"parts": [{"text": reply}]},
                    "finishReason": "STOP"
                }],
                "modelVersion": "gemini-2.0-flash"
            })
            .to_string(),
        )
        .create_async()
        .await
}

/// Start a companion server on an ephemeral port, returning its base URL.
async fn spawn_server(gemini_url: String, rate_limit: u32) -> String {
    let provider = GeminiProvider::new("test-key".to_string())
        .unwrap()
        .with_base_url(gemini_url);

    let metrics_logger =
        MetricsLogger::new(std::env::temp_dir().join("solace_test_metrics")).unwrap();

    let config = ServerConfig {
        bind_address: "127.0.0.1:0".to_string(),
        max_sessions: 10,
        session_timeout_minutes: 30,
        rate_limit: RateLimitSettings {
            limit: rate_limit,
            window_secs: 60,
            sweep_interval_secs: 600,
        },
    };

    let server = CompanionServer::new(
        config,
        Arc::new(provider),
        CrisisDetector::default(),
        EmotionEngine::default(),
        metrics_logger,
    )
    .unwrap();

    let app = create_router(Arc::new(server));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });

    format!("http://{}", addr)
}

#[tokio::test]
async fn test_chat_returns_suggestions_and_session() {
    let mut gemini = mockito::Server::new_async().await;
    let _mock = mock_gemini(&mut gemini, "That sounds hard. Want to talk it through?").await;

    let base = spawn_server(gemini.url(), 20).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/v1/chat", base))
        .json(&serde_json::json!({"message": "I am anxious about my interview"}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();

    assert_eq!(body["crisis"], false);
    assert!(body["message"]
        .as_str()
        .unwrap()
        .starts_with("That sounds hard."));
    assert_eq!(body["suggestions"][0]["tool"], "breathing");
    assert!(!body["session_id"].as_str().unwrap().is_empty());

    // The session is inspectable and holds both turns.
    let session_id = body["session_id"].as_str().unwrap();
    let session: serde_json::Value = client
        .get(format!("{}/v1/session/{}", base, session_id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(session["turn_count"], 2);
}

#[tokio::test]
async fn test_crisis_message_appends_helpline() {
    let mut gemini = mockito::Server::new_async().await;
    let _mock = mock_gemini(&mut gemini, "I'm really glad you told me.").await;

    let base = spawn_server(gemini.url(), 20).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/v1/chat", base))
        .json(&serde_json::json!({"message": "I want to kill myself"}))
        .send()
        .await
        .unwrap();

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["crisis"], true);
    let message = body["message"].as_str().unwrap();
    assert!(message.contains("I'm really glad you told me."));
    assert!(message.contains("988"), "helpline appended: {}", message);
}

#[tokio::test]
async fn test_rate_limit_rejects_with_429() {
    let mut gemini = mockito::Server::new_async().await;
    let _mock = mock_gemini(&mut gemini, "ok").await;

    let base = spawn_server(gemini.url(), 2).await;
    let client = reqwest::Client::new();

    // Same caller identity for every request.
    let send = || {
        client
            .post(format!("{}/v1/chat", base))
            .header("x-user-id", "student-1")
            .json(&serde_json::json!({"message": "hello"}))
            .send()
    };

    assert_eq!(send().await.unwrap().status(), 200);
    assert_eq!(send().await.unwrap().status(), 200);

    let rejected = send().await.unwrap();
    assert_eq!(rejected.status(), 429);
    assert_eq!(rejected.headers()["x-ratelimit-remaining"], "0");
    assert!(rejected.headers().contains_key("retry-after"));

    let body: serde_json::Value = rejected.json().await.unwrap();
    assert_eq!(body["error"]["type"], "rate_limited");

    // A different caller is unaffected.
    let other = client
        .post(format!("{}/v1/chat", base))
        .header("x-user-id", "student-2")
        .json(&serde_json::json!({"message": "hello"}))
        .send()
        .await
        .unwrap();
    assert_eq!(other.status(), 200);
}

#[tokio::test]
async fn test_empty_message_is_bad_request() {
    let mut gemini = mockito::Server::new_async().await;
    let _mock = mock_gemini(&mut gemini, "unused").await;

    let base = spawn_server(gemini.url(), 20).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/v1/chat", base))
        .json(&serde_json::json!({"message": "   "}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn test_tools_affirmation_health_and_metrics() {
    let mut gemini = mockito::Server::new_async().await;
    let _mock = mock_gemini(&mut gemini, "ok").await;

    let base = spawn_server(gemini.url(), 20).await;
    let client = reqwest::Client::new();

    let tools: serde_json::Value = client
        .get(format!("{}/v1/tools", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(tools.as_array().unwrap().len(), 8);
    assert!(tools
        .as_array()
        .unwrap()
        .iter()
        .any(|t| t["id"] == "breathing"));

    let affirmation: serde_json::Value = client
        .get(format!("{}/v1/affirmation", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(!affirmation["text"].as_str().unwrap().is_empty());

    let health: serde_json::Value = client
        .get(format!("{}/health", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["status"], "healthy");
    assert_eq!(health["provider"], "gemini");

    // Drive one chat request so the counters move.
    client
        .post(format!("{}/v1/chat", base))
        .json(&serde_json::json!({"message": "I am stressed"}))
        .send()
        .await
        .unwrap();

    let metrics = client
        .get(format!("{}/metrics", base))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(metrics.contains("solace_chat_requests_total 1"));
    assert!(metrics.contains("solace_suggestions_total{tool=\"breathing\"} 1"));
}

#[tokio::test]
async fn test_session_delete() {
    let mut gemini = mockito::Server::new_async().await;
    let _mock = mock_gemini(&mut gemini, "ok").await;

    let base = spawn_server(gemini.url(), 20).await;
    let client = reqwest::Client::new();

    let body: serde_json::Value = client
        .post(format!("{}/v1/chat", base))
        .json(&serde_json::json!({"message": "hello there"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let session_id = body["session_id"].as_str().unwrap().to_string();

    let deleted = client
        .delete(format!("{}/v1/session/{}", base, session_id))
        .send()
        .await
        .unwrap();
    assert_eq!(deleted.status(), 204);

    let gone = client
        .get(format!("{}/v1/session/{}", base, session_id))
        .send()
        .await
        .unwrap();
    assert_eq!(gone.status(), 404);
}
