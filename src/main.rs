// Solace - Mental-Wellness Companion Backend
// Main entry point

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;

use solace::config::{load_config, Config};
use solace::crisis::CrisisDetector;
use solace::emotion::EmotionEngine;
use solace::llm::GeminiProvider;
use solace::metrics::MetricsLogger;
use solace::server::{CompanionServer, ServerConfig};

#[derive(Parser, Debug)]
#[command(name = "solace")]
#[command(about = "Mental-wellness companion backend", version)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Parser, Debug)]
enum Command {
    /// Run the HTTP companion server
    Serve {
        /// Bind address (overrides the config file)
        #[arg(long)]
        bind: Option<String>,
    },
    /// Run crisis and emotion screening on a message and print the result
    Check {
        /// Message text to screen
        message: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let args = Args::parse();

    match args.command {
        Command::Serve { bind } => run_serve(bind).await,
        Command::Check { message } => run_check(&message),
    }
}

/// Initialize tracing with an env-filter and the log crate bridge
fn init_tracing() {
    use tracing_subscriber::prelude::*;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Bridge log crate -> tracing (for dependencies using log)
    tracing_log::LogTracer::init().ok();
}

/// Build the detector from config, honoring a keyword file override.
fn build_crisis_detector(config: &Config) -> Result<CrisisDetector> {
    match &config.crisis_keywords_path {
        Some(path) => CrisisDetector::load_from_file(path),
        None => Ok(CrisisDetector::default()),
    }
}

/// Build the emotion engine from config, honoring a rules file override.
fn build_emotion_engine(config: &Config) -> Result<EmotionEngine> {
    match &config.emotion_rules_path {
        Some(path) => EmotionEngine::load_from_file(path),
        None => Ok(EmotionEngine::default()),
    }
}

async fn run_serve(bind: Option<String>) -> Result<()> {
    let config = load_config()?;

    let crisis_detector = build_crisis_detector(&config)?;
    let emotion_engine = build_emotion_engine(&config)?;

    let metrics_dir = match &config.metrics_dir {
        Some(dir) => dir.clone(),
        None => dirs::home_dir()
            .context("Could not determine home directory")?
            .join(".solace/metrics"),
    };
    let metrics_logger = MetricsLogger::new(metrics_dir)?;

    let mut provider =
        GeminiProvider::new(config.gemini.api_key.clone())?.with_model(&config.gemini.model);
    if let Some(base_url) = &config.gemini.base_url {
        provider = provider.with_base_url(base_url);
    }

    let server_config = ServerConfig {
        bind_address: bind.unwrap_or_else(|| config.server.bind_address.clone()),
        max_sessions: config.server.max_sessions,
        session_timeout_minutes: config.server.session_timeout_minutes,
        rate_limit: config.rate_limit.clone(),
    };

    let server = CompanionServer::new(
        server_config,
        Arc::new(provider),
        crisis_detector,
        emotion_engine,
        metrics_logger,
    )?;

    server.serve().await
}

/// Print screening results for one message as JSON (debugging aid).
fn run_check(message: &str) -> Result<()> {
    // The check command needs no API key; fall back to built-in tables when
    // no config exists.
    let config = load_config().unwrap_or_else(|_| Config::from_api_key(String::new()));

    let crisis_detector = build_crisis_detector(&config)?;
    let emotion_engine = build_emotion_engine(&config)?;

    let output = serde_json::json!({
        "crisis": crisis_detector.detect(message),
        "suggestions": emotion_engine.suggestions(message),
    });

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
