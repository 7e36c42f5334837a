// JSONL request logging
//
// One line per chat request, written to a daily-named file under the metrics
// directory. Message text never reaches disk; only a sha256 hash is stored so
// repeat queries can be correlated without keeping what the user wrote.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// One logged chat request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestMetric {
    pub timestamp: DateTime<Utc>,
    /// sha256 of the raw message text, hex-encoded.
    pub message_hash: String,
    /// Whether the message was rejected by the rate limiter. A rejected
    /// request never reaches detection, so the remaining fields are empty.
    pub rate_limited: bool,
    pub crisis: bool,
    /// Tool ids of the suggestions surfaced for this message.
    pub suggested_tools: Vec<String>,
    pub response_time_ms: u64,
}

impl RequestMetric {
    pub fn new(
        message_hash: String,
        rate_limited: bool,
        crisis: bool,
        suggested_tools: Vec<String>,
        response_time_ms: u64,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            message_hash,
            rate_limited,
            crisis,
            suggested_tools,
            response_time_ms,
        }
    }
}

/// Appends request metrics to JSONL files under a metrics directory.
pub struct MetricsLogger {
    metrics_dir: PathBuf,
    // Serializes appends so concurrent requests never interleave lines.
    write_lock: Mutex<()>,
}

impl MetricsLogger {
    /// Create a logger, creating the metrics directory if needed.
    pub fn new(metrics_dir: impl Into<PathBuf>) -> Result<Self> {
        let metrics_dir = metrics_dir.into();
        fs::create_dir_all(&metrics_dir).with_context(|| {
            format!("Failed to create metrics directory: {}", metrics_dir.display())
        })?;

        Ok(Self {
            metrics_dir,
            write_lock: Mutex::new(()),
        })
    }

    /// Append one metric as a JSON line to today's log file.
    pub fn log(&self, metric: &RequestMetric) -> Result<()> {
        let file_name = format!("requests-{}.jsonl", metric.timestamp.format("%Y-%m-%d"));
        let path = self.metrics_dir.join(file_name);

        let line = serde_json::to_string(metric).context("Failed to serialize request metric")?;

        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open metrics log: {}", path.display()))?;
        writeln!(file, "{}", line)
            .with_context(|| format!("Failed to write metrics log: {}", path.display()))?;

        Ok(())
    }

    /// Hash a message for logging.
    pub fn hash_message(message: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(message.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}
