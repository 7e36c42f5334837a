// Fixed-window rate limiter

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use dashmap::DashMap;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

/// How often the background sweep removes expired windows by default.
const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(600);

/// Outcome of a single rate-limit check.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct RateLimitDecision {
    /// Whether the request is allowed.
    pub success: bool,
    /// Requests left in the current window.
    pub remaining: u32,
    /// Epoch milliseconds at which the current window ends.
    pub reset: i64,
}

/// Counter state for one identifier's window.
#[derive(Debug, Clone, Copy)]
struct WindowRecord {
    count: u32,
    reset_at: i64,
}

impl WindowRecord {
    fn is_expired(&self, now: i64) -> bool {
        now > self.reset_at
    }
}

/// Per-identifier fixed-window request counter.
///
/// Each identifier gets an independent window: the first request opens a
/// window of `window` duration, subsequent requests increment the counter
/// until `limit` is reached, and the next request after the window ends
/// starts a fresh one. State lives in process memory only; a horizontally
/// scaled deployment counts per instance.
///
/// The limiter owns its map and its background sweeper. Call [`start`] once a
/// runtime is available and [`stop`] on shutdown; nothing is spawned before
/// `start` and the limiter is fully usable without the sweeper (expiry is
/// always checked on the request path, the sweep only reclaims memory from
/// abandoned identifiers).
///
/// [`start`]: RateLimiter::start
/// [`stop`]: RateLimiter::stop
pub struct RateLimiter {
    windows: Arc<DashMap<String, WindowRecord>>,
    sweep_interval: Duration,
    sweeper: Mutex<Option<CancellationToken>>,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_SWEEP_INTERVAL)
    }
}

impl RateLimiter {
    /// Create a limiter whose sweeper, once started, runs every
    /// `sweep_interval`.
    pub fn new(sweep_interval: Duration) -> Self {
        Self {
            windows: Arc::new(DashMap::new()),
            sweep_interval,
            sweeper: Mutex::new(None),
        }
    }

    /// Check and count one request for `identifier`.
    ///
    /// The read-modify-write runs through the map's entry API, so the whole
    /// expiry-check-then-increment sequence holds the shard lock and two
    /// concurrent callers can never both slip under the limit.
    ///
    /// A `limit` of zero is a caller contract violation: debug builds assert,
    /// release builds report `success = false` forever for that identifier.
    pub fn check(&self, identifier: &str, limit: u32, window: Duration) -> RateLimitDecision {
        debug_assert!(limit > 0, "rate limit must be positive");

        let now = Utc::now().timestamp_millis();

        if limit == 0 {
            return RateLimitDecision {
                success: false,
                remaining: 0,
                reset: now,
            };
        }

        let window_ms = window.as_millis() as i64;
        let mut entry = self
            .windows
            .entry(identifier.to_string())
            .or_insert(WindowRecord {
                count: 0,
                reset_at: now + window_ms,
            });
        let record = entry.value_mut();

        if record.is_expired(now) {
            *record = WindowRecord {
                count: 0,
                reset_at: now + window_ms,
            };
        }

        if record.count < limit {
            record.count += 1;
            RateLimitDecision {
                success: true,
                remaining: limit - record.count,
                reset: record.reset_at,
            }
        } else {
            RateLimitDecision {
                success: false,
                remaining: 0,
                reset: record.reset_at,
            }
        }
    }

    /// Number of identifiers currently tracked.
    pub fn tracked_count(&self) -> usize {
        self.windows.len()
    }

    /// Remove every record whose window has already ended.
    ///
    /// This is the deletion-only pass the background sweeper runs; it is safe
    /// to call at any time because `check` never trusts a stored record
    /// without re-checking expiry.
    pub fn purge_expired(&self) -> usize {
        sweep_expired(&self.windows)
    }

    /// Start the background sweeper. Calling `start` again while a sweeper is
    /// running is a no-op, so at most one sweep task exists per limiter.
    pub fn start(&self) {
        let mut sweeper = self.sweeper.lock().unwrap_or_else(|e| e.into_inner());
        if sweeper.is_some() {
            return;
        }

        let token = CancellationToken::new();
        let windows = Arc::clone(&self.windows);
        let interval = self.sweep_interval;
        let task_token = token.clone();

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick fires immediately; skip it so the sweep cadence
            // starts one interval after `start`.
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = task_token.cancelled() => break,
                    _ = ticker.tick() => {
                        sweep_expired(&windows);
                    }
                }
            }

            tracing::debug!("Rate limit sweeper stopped");
        });

        *sweeper = Some(token);
        tracing::debug!(interval_secs = interval.as_secs(), "Rate limit sweeper started");
    }

    /// Stop the background sweeper if one is running.
    pub fn stop(&self) {
        let mut sweeper = self.sweeper.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(token) = sweeper.take() {
            token.cancel();
        }
    }
}

impl Drop for RateLimiter {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Deletion-only sweep shared by the request path and the background task.
///
/// Expired keys are collected first, then removed with a re-check so a window
/// refreshed between the two steps survives. Deleting an already-deleted key
/// is a no-op, which keeps overlapping sweeps idempotent.
fn sweep_expired(windows: &DashMap<String, WindowRecord>) -> usize {
    let now = Utc::now().timestamp_millis();

    let expired: Vec<String> = windows
        .iter()
        .filter(|entry| entry.value().is_expired(now))
        .map(|entry| entry.key().clone())
        .collect();

    let mut removed = 0;
    for identifier in expired {
        if windows
            .remove_if(&identifier, |_, record| record.is_expired(now))
            .is_some()
        {
            removed += 1;
        }
    }

    if removed > 0 {
        tracing::debug!(removed, tracked = windows.len(), "Swept expired rate limit windows");
    }

    removed
}
