// Configuration structs

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

fn default_bind_address() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_max_sessions() -> usize {
    100
}

fn default_session_timeout_minutes() -> u64 {
    30
}

fn default_rate_limit() -> u32 {
    20
}

fn default_rate_window_secs() -> u64 {
    60
}

fn default_sweep_interval_secs() -> u64 {
    600
}

fn default_model() -> String {
    "gemini-2.0-flash".to_string()
}

/// Gemini API settings.
#[derive(Debug, Clone, Deserialize)]
pub struct GeminiConfig {
    pub api_key: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Override for tests and proxies; the production endpoint when absent.
    #[serde(default)]
    pub base_url: Option<String>,
}

/// HTTP server settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub bind_address: String,
    pub max_sessions: usize,
    pub session_timeout_minutes: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            max_sessions: default_max_sessions(),
            session_timeout_minutes: default_session_timeout_minutes(),
        }
    }
}

/// Rate limiter settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RateLimitSettings {
    /// Requests allowed per identifier per window.
    pub limit: u32,
    pub window_secs: u64,
    pub sweep_interval_secs: u64,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            limit: default_rate_limit(),
            window_secs: default_rate_window_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

impl RateLimitSettings {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

/// Full application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub gemini: GeminiConfig,
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub rate_limit: RateLimitSettings,
    /// Directory for the JSONL request log. Defaults to ~/.solace/metrics.
    #[serde(default)]
    pub metrics_dir: Option<PathBuf>,
    /// Optional JSON file replacing the built-in crisis keyword list.
    #[serde(default)]
    pub crisis_keywords_path: Option<PathBuf>,
    /// Optional JSON file replacing the built-in emotion rule table.
    #[serde(default)]
    pub emotion_rules_path: Option<PathBuf>,
}

impl Config {
    /// Minimal config from just an API key (environment fallback path).
    pub fn from_api_key(api_key: String) -> Self {
        Self {
            gemini: GeminiConfig {
                api_key,
                model: default_model(),
                base_url: None,
            },
            server: ServerSettings::default(),
            rate_limit: RateLimitSettings::default(),
            metrics_dir: None,
            crisis_keywords_path: None,
            emotion_rules_path: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_toml_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            [gemini]
            api_key = "test-key"
            "#,
        )
        .unwrap();

        assert_eq!(config.gemini.api_key, "test-key");
        assert_eq!(config.gemini.model, "gemini-2.0-flash");
        assert_eq!(config.server.bind_address, "127.0.0.1:8080");
        assert_eq!(config.rate_limit.limit, 20);
        assert_eq!(config.rate_limit.window(), Duration::from_secs(60));
        assert!(config.crisis_keywords_path.is_none());
    }

    #[test]
    fn test_full_toml_overrides_defaults() {
        let config: Config = toml::from_str(
            r#"
            metrics_dir = "/tmp/solace-metrics"
            emotion_rules_path = "/tmp/rules.json"

            [gemini]
            api_key = "test-key"
            model = "gemini-1.5-pro"
            base_url = "http://localhost:9999"

            [server]
            bind_address = "0.0.0.0:3000"
            max_sessions = 5
            session_timeout_minutes = 10

            [rate_limit]
            limit = 3
            window_secs = 30
            sweep_interval_secs = 120
            "#,
        )
        .unwrap();

        assert_eq!(config.gemini.model, "gemini-1.5-pro");
        assert_eq!(config.gemini.base_url.as_deref(), Some("http://localhost:9999"));
        assert_eq!(config.server.max_sessions, 5);
        assert_eq!(config.rate_limit.limit, 3);
        assert_eq!(config.rate_limit.sweep_interval(), Duration::from_secs(120));
        assert!(config.emotion_rules_path.is_some());
    }
}
