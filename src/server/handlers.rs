// HTTP request handlers

use axum::{
    extract::{ConnectInfo, Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use super::{build_system_prompt, CompanionServer};
use crate::crisis::HELPLINE_TEXT;
use crate::emotion::DetectedEmotion;
use crate::llm::{ChatTurn, ProviderRequest};
use crate::metrics::{MetricsLogger, RequestMetric};
use crate::wellness::{self, WellnessTool};

/// How many recent conversation turns reach the provider per request.
const PROMPT_TURN_CAP: usize = 12;

/// Create the main application router
pub fn create_router(server: Arc<CompanionServer>) -> Router {
    Router::new()
        .route("/v1/chat", post(handle_chat))
        .route("/v1/session/:id", get(get_session).delete(delete_session))
        .route("/v1/tools", get(list_tools))
        .route("/v1/affirmation", get(get_affirmation))
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_endpoint))
        .with_state(server)
}

/// Request body for /v1/chat
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// The user's message
    pub message: String,
    /// Session ID for conversation continuity
    #[serde(default)]
    pub session_id: Option<String>,
}

/// Response body for /v1/chat
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub id: String,
    pub session_id: String,
    /// Assistant reply, with the helpline block appended on crisis
    pub message: String,
    /// Whether crisis screening fired for this message
    pub crisis: bool,
    /// Up to two wellness tool suggestions, highest confidence first
    pub suggestions: Vec<DetectedEmotion>,
}

/// Resolve the rate-limit identifier for a request.
///
/// An upstream gateway's user id header wins; otherwise the first
/// `x-forwarded-for` hop, otherwise the peer address.
fn caller_identifier(headers: &HeaderMap, peer: SocketAddr) -> String {
    if let Some(user_id) = headers.get("x-user-id").and_then(|v| v.to_str().ok()) {
        let user_id = user_id.trim();
        if !user_id.is_empty() {
            return format!("user:{}", user_id);
        }
    }

    if let Some(forwarded) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
        if let Some(first_hop) = forwarded.split(',').next() {
            let first_hop = first_hop.trim();
            if !first_hop.is_empty() {
                return format!("ip:{}", first_hop);
            }
        }
    }

    format!("ip:{}", peer.ip())
}

/// Handle POST /v1/chat - Main chat endpoint
async fn handle_chat(
    State(server): State<Arc<CompanionServer>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(request): Json<ChatRequest>,
) -> Result<Response, AppError> {
    let start_time = Instant::now();
    server.recorder().record_chat_request();

    if request.message.trim().is_empty() {
        let body = serde_json::json!({
            "error": { "message": "Message must not be empty", "type": "invalid_request" }
        });
        return Ok((StatusCode::BAD_REQUEST, Json(body)).into_response());
    }

    // Rate limit before any further work.
    let identifier = caller_identifier(&headers, peer);
    let limits = &server.config().rate_limit;
    let decision = server
        .rate_limiter()
        .check(&identifier, limits.limit, limits.window());

    if !decision.success {
        tracing::info!(identifier = %identifier, "Chat request rate limited");
        server.recorder().record_rate_limited();
        server.metrics_logger().log(&RequestMetric::new(
            MetricsLogger::hash_message(&request.message),
            true,
            false,
            vec![],
            start_time.elapsed().as_millis() as u64,
        ))?;

        return Ok(rate_limited_response(limits.limit, decision.reset));
    }

    // Screening runs on the raw message, independent of the provider call.
    let crisis = server.crisis_detector().detect(&request.message);
    let suggestions = server.emotion_engine().suggestions(&request.message);

    if crisis {
        server.recorder().record_crisis_detection();
    }
    for suggestion in &suggestions {
        server.recorder().record_suggestion(suggestion.tool.id());
    }

    // Get or create session and record the user's turn.
    let mut session = server
        .session_manager()
        .get_or_create(request.session_id.as_deref())?;
    session.push_turn(ChatTurn::user(request.message.clone()));

    let system_prompt = build_system_prompt(crisis, &suggestions);
    let provider_request = ProviderRequest::new(session.recent_turns(PROMPT_TURN_CAP).to_vec())
        .with_system(system_prompt);

    tracing::info!(
        session_id = %session.id,
        crisis,
        suggestions = suggestions.len(),
        "Forwarding chat request to provider"
    );

    let response = server.provider().send_message(&provider_request).await?;

    let mut message = response.text;
    if crisis {
        message.push_str("\n\n");
        message.push_str(HELPLINE_TEXT);
    }

    // Record the assistant turn and persist the session.
    session.push_turn(ChatTurn::assistant(message.clone()));
    session.touch();
    server
        .session_manager()
        .update(&session.id, session.clone())?;

    let elapsed_ms = start_time.elapsed().as_millis() as u64;
    server
        .recorder()
        .record_response_time(elapsed_ms as f64 / 1000.0);
    server.metrics_logger().log(&RequestMetric::new(
        MetricsLogger::hash_message(&request.message),
        false,
        crisis,
        suggestions.iter().map(|s| s.tool.id().to_string()).collect(),
        elapsed_ms,
    ))?;

    let body = ChatResponse {
        id: format!("chat_{}", uuid::Uuid::new_v4()),
        session_id: session.id,
        message,
        crisis,
        suggestions,
    };

    Ok(Json(body).into_response())
}

/// Build the 429 response with retry metadata.
fn rate_limited_response(limit: u32, reset: i64) -> Response {
    let now = chrono::Utc::now().timestamp_millis();
    let retry_after_secs = ((reset - now).max(0) as u64 + 999) / 1000;

    let body = serde_json::json!({
        "error": {
            "message": format!(
                "You're sending messages a little fast. Please wait about {} seconds and try again.",
                retry_after_secs.max(1)
            ),
            "type": "rate_limited"
        }
    });

    let mut response = (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response();
    let headers = response.headers_mut();
    headers.insert("x-ratelimit-limit", limit.into());
    headers.insert("x-ratelimit-remaining", 0.into());
    headers.insert("x-ratelimit-reset", reset.into());
    headers.insert("retry-after", retry_after_secs.max(1).into());

    response
}

/// Session information
#[derive(Debug, Serialize)]
pub struct SessionInfo {
    pub id: String,
    pub created_at: String,
    pub last_activity: String,
    pub turn_count: usize,
}

/// Handle GET /v1/session/:id - Retrieve session state
async fn get_session(
    State(server): State<Arc<CompanionServer>>,
    Path(session_id): Path<String>,
) -> Result<Response, AppError> {
    let Some(session) = server.session_manager().get(&session_id) else {
        return Ok(not_found("Session not found"));
    };

    let info = SessionInfo {
        id: session.id,
        created_at: session.created_at.to_rfc3339(),
        last_activity: session.last_activity.to_rfc3339(),
        turn_count: session.turns.len(),
    };

    Ok(Json(info).into_response())
}

/// Handle DELETE /v1/session/:id - Delete session
async fn delete_session(
    State(server): State<Arc<CompanionServer>>,
    Path(session_id): Path<String>,
) -> Result<Response, AppError> {
    if server.session_manager().delete(&session_id) {
        Ok(StatusCode::NO_CONTENT.into_response())
    } else {
        Ok(not_found("Session not found"))
    }
}

fn not_found(message: &str) -> Response {
    let body = serde_json::json!({
        "error": { "message": message, "type": "not_found" }
    });
    (StatusCode::NOT_FOUND, Json(body)).into_response()
}

/// One entry of the tool registry listing
#[derive(Debug, Serialize)]
pub struct ToolInfo {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
}

/// Handle GET /v1/tools - List the wellness tool registry
async fn list_tools() -> Json<Vec<ToolInfo>> {
    let tools = WellnessTool::ALL
        .iter()
        .map(|tool| ToolInfo {
            id: tool.id(),
            name: tool.display_name(),
            description: tool.description(),
        })
        .collect();

    Json(tools)
}

/// Affirmation response
#[derive(Debug, Serialize)]
pub struct AffirmationResponse {
    pub text: &'static str,
}

/// Handle GET /v1/affirmation - One randomly chosen affirmation
async fn get_affirmation() -> Json<AffirmationResponse> {
    Json(AffirmationResponse {
        text: wellness::random_affirmation(),
    })
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: String,
    pub uptime_seconds: u64,
    pub active_sessions: usize,
    pub provider: String,
}

/// Handle GET /health - Health check endpoint
async fn health_check(State(server): State<Arc<CompanionServer>>) -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "healthy".to_string(),
        uptime_seconds: server.uptime_seconds(),
        active_sessions: server.session_manager().active_count(),
        provider: server.provider().name().to_string(),
    })
}

/// Handle GET /metrics - Prometheus metrics endpoint
async fn metrics_endpoint(
    State(server): State<Arc<CompanionServer>>,
) -> Result<Response, AppError> {
    let metrics = server.recorder().render()?;
    Ok((StatusCode::OK, metrics).into_response())
}

/// Application error wrapper for proper HTTP error responses
pub struct AppError(anyhow::Error);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self.0, "Request failed");

        let body = serde_json::json!({
            "error": {
                "message": self.0.to_string(),
                "type": "api_error"
            }
        });

        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
