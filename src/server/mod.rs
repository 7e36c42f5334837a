// Solace - Companion Server Module
// HTTP service wiring chat requests through screening, rate limiting, and Gemini

mod handlers;
mod prompt;
mod session;

pub use handlers::{create_router, ChatRequest, ChatResponse};
pub use prompt::build_system_prompt;
pub use session::{SessionManager, SessionState};

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::RateLimitSettings;
use crate::crisis::CrisisDetector;
use crate::emotion::EmotionEngine;
use crate::llm::LlmProvider;
use crate::metrics::{MetricsLogger, MetricsRecorder};
use crate::ratelimit::RateLimiter;

/// Configuration for the HTTP server
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (e.g., "127.0.0.1:8080")
    pub bind_address: String,
    /// Maximum number of concurrent sessions
    pub max_sessions: usize,
    /// Session timeout in minutes
    pub session_timeout_minutes: u64,
    /// Rate limiter parameters applied to each chat caller
    pub rate_limit: RateLimitSettings,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8080".to_string(),
            max_sessions: 100,
            session_timeout_minutes: 30,
            rate_limit: RateLimitSettings::default(),
        }
    }
}

/// Main companion server structure
pub struct CompanionServer {
    /// LLM provider answering chat turns (shared across sessions)
    provider: Arc<dyn LlmProvider>,
    /// Crisis keyword screening
    crisis_detector: Arc<CrisisDetector>,
    /// Emotion keyword scoring
    emotion_engine: Arc<EmotionEngine>,
    /// Per-caller fixed-window rate limiting
    rate_limiter: Arc<RateLimiter>,
    /// Session manager
    session_manager: Arc<SessionManager>,
    /// Prometheus counters
    recorder: Arc<MetricsRecorder>,
    /// JSONL request logger
    metrics_logger: Arc<MetricsLogger>,
    /// Server configuration
    config: ServerConfig,
    /// Process start, for the health endpoint's uptime
    started_at: Instant,
}

impl CompanionServer {
    /// Create a new companion server
    pub fn new(
        config: ServerConfig,
        provider: Arc<dyn LlmProvider>,
        crisis_detector: CrisisDetector,
        emotion_engine: EmotionEngine,
        metrics_logger: MetricsLogger,
    ) -> Result<Self> {
        let session_manager =
            SessionManager::new(config.max_sessions, config.session_timeout_minutes);
        let rate_limiter = RateLimiter::new(config.rate_limit.sweep_interval());
        let recorder = MetricsRecorder::new()?;

        Ok(Self {
            provider,
            crisis_detector: Arc::new(crisis_detector),
            emotion_engine: Arc::new(emotion_engine),
            rate_limiter: Arc::new(rate_limiter),
            session_manager: Arc::new(session_manager),
            recorder: Arc::new(recorder),
            metrics_logger: Arc::new(metrics_logger),
            config,
            started_at: Instant::now(),
        })
    }

    /// Start the HTTP server and run until ctrl-c
    pub async fn serve(self) -> Result<()> {
        let addr: SocketAddr = self.config.bind_address.parse()?;

        self.rate_limiter.start();

        let app_state = Arc::new(self);
        let rate_limiter = Arc::clone(&app_state.rate_limiter);

        let app = create_router(Arc::clone(&app_state))
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive());

        tracing::info!("Starting Solace companion server on {}", addr);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutdown signal received");
        })
        .await?;

        rate_limiter.stop();

        Ok(())
    }

    /// Get reference to the LLM provider
    pub fn provider(&self) -> &Arc<dyn LlmProvider> {
        &self.provider
    }

    /// Get reference to the crisis detector
    pub fn crisis_detector(&self) -> &Arc<CrisisDetector> {
        &self.crisis_detector
    }

    /// Get reference to the emotion engine
    pub fn emotion_engine(&self) -> &Arc<EmotionEngine> {
        &self.emotion_engine
    }

    /// Get reference to the rate limiter
    pub fn rate_limiter(&self) -> &Arc<RateLimiter> {
        &self.rate_limiter
    }

    /// Get reference to session manager
    pub fn session_manager(&self) -> &Arc<SessionManager> {
        &self.session_manager
    }

    /// Get reference to the Prometheus recorder
    pub fn recorder(&self) -> &Arc<MetricsRecorder> {
        &self.recorder
    }

    /// Get reference to metrics logger
    pub fn metrics_logger(&self) -> &Arc<MetricsLogger> {
        &self.metrics_logger
    }

    /// Get server configuration
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Seconds since the server was constructed
    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
