// Retry logic for transient provider failures

use std::future::Future;
use std::time::Duration;

use anyhow::Result;

const MAX_RETRIES: u32 = 3;
const INITIAL_DELAY: Duration = Duration::from_millis(500);
const MAX_DELAY: Duration = Duration::from_secs(10);

/// Retry an operation with capped exponential backoff.
///
/// Only transient failures are retried: rate limiting, server-side errors,
/// and connection problems. Anything else (bad request, auth) fails fast.
pub async fn with_retry<T, F, Fut>(mut operation: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0;
    let mut delay = INITIAL_DELAY;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                if attempt >= MAX_RETRIES || !is_retryable(&e) {
                    return Err(e);
                }

                attempt += 1;
                tracing::warn!(
                    attempt,
                    max = MAX_RETRIES,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Provider request failed, retrying"
                );

                tokio::time::sleep(delay).await;
                delay = (delay * 2).min(MAX_DELAY);
            }
        }
    }
}

/// Whether an error is worth retrying.
///
/// Provider errors carry the HTTP status in their message, so a string check
/// is enough to tell transient statuses from permanent ones.
fn is_retryable(error: &anyhow::Error) -> bool {
    let message = format!("{:#}", error);

    ["429", "500", "502", "503", "504"]
        .iter()
        .any(|status| message.contains(status))
        || message.contains("timed out")
        || message.contains("connection")
}
