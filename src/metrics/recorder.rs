// Prometheus metrics for the chat service

use anyhow::{Context, Result};
use prometheus::{Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

/// Counters and histograms exposed at `GET /metrics`.
///
/// Each server owns one recorder; nothing here is process-global, so tests
/// can create recorders freely without metric leakage between them.
pub struct MetricsRecorder {
    registry: Registry,
    chat_requests: IntCounter,
    rate_limited: IntCounter,
    crisis_detections: IntCounter,
    suggestions: IntCounterVec,
    response_time: Histogram,
}

impl MetricsRecorder {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let chat_requests = IntCounter::with_opts(Opts::new(
            "solace_chat_requests_total",
            "Total chat requests received",
        ))?;
        let rate_limited = IntCounter::with_opts(Opts::new(
            "solace_rate_limited_total",
            "Chat requests rejected by the rate limiter",
        ))?;
        let crisis_detections = IntCounter::with_opts(Opts::new(
            "solace_crisis_detections_total",
            "Messages that triggered crisis detection",
        ))?;
        let suggestions = IntCounterVec::new(
            Opts::new(
                "solace_suggestions_total",
                "Wellness tool suggestions surfaced, by tool",
            ),
            &["tool"],
        )?;
        let response_time = Histogram::with_opts(HistogramOpts::new(
            "solace_chat_response_seconds",
            "End-to-end chat request latency in seconds",
        ))?;

        registry.register(Box::new(chat_requests.clone()))?;
        registry.register(Box::new(rate_limited.clone()))?;
        registry.register(Box::new(crisis_detections.clone()))?;
        registry.register(Box::new(suggestions.clone()))?;
        registry.register(Box::new(response_time.clone()))?;

        Ok(Self {
            registry,
            chat_requests,
            rate_limited,
            crisis_detections,
            suggestions,
            response_time,
        })
    }

    pub fn record_chat_request(&self) {
        self.chat_requests.inc();
    }

    pub fn record_rate_limited(&self) {
        self.rate_limited.inc();
    }

    pub fn record_crisis_detection(&self) {
        self.crisis_detections.inc();
    }

    pub fn record_suggestion(&self, tool: &str) {
        self.suggestions.with_label_values(&[tool]).inc();
    }

    pub fn record_response_time(&self, seconds: f64) {
        self.response_time.observe(seconds);
    }

    /// Render the registry in Prometheus text exposition format.
    pub fn render(&self) -> Result<String> {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&metric_families, &mut buffer)
            .context("Failed to encode metrics")?;
        String::from_utf8(buffer).context("Metrics output was not valid UTF-8")
    }
}
