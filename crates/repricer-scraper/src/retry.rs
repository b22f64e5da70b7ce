//! Retry with exponential back-off and jitter for marketplace page fetches.
//!
//! Transport hiccups, 429s and 5xx responses are retried. Everything else
//! (404 and other 4xx, bad identifiers) is permanent and returned at once.

use std::future::Future;
use std::time::Duration;

use crate::error::ScraperError;

/// Upper bound on any single back-off sleep.
const MAX_DELAY_MS: u64 = 60_000;

/// Returns `true` for errors that are worth retrying after a back-off delay.
///
/// **Retriable:**
/// - Network-level failures: timeout, connection refused/reset.
/// - [`ScraperError::RateLimited`]: HTTP 429.
/// - [`ScraperError::UnexpectedStatus`] with a 5xx status.
///
/// **Not retriable:**
/// - [`ScraperError::NotFound`] and any other 4xx status.
/// - [`ScraperError::InvalidIdentifier`] / [`ScraperError::InvalidBaseUrl`].
pub(crate) fn is_retriable(err: &ScraperError) -> bool {
    match err {
        ScraperError::Http(e) => {
            e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error())
        }
        ScraperError::RateLimited { .. } => true,
        ScraperError::UnexpectedStatus { status, .. } => *status >= 500,
        ScraperError::NotFound { .. }
        | ScraperError::InvalidIdentifier { .. }
        | ScraperError::InvalidBaseUrl { .. } => false,
    }
}

/// Computes the sleep before retry number `attempt` (1-based).
///
/// `backoff_base_ms * 2^(attempt-1)`, raised to the server's `Retry-After`
/// when rate limited, scaled by a random factor in `[0.75, 1.25)`, then
/// capped at [`MAX_DELAY_MS`].
fn backoff_delay_ms(attempt: u32, backoff_base_ms: u64, err: &ScraperError) -> u64 {
    let computed = backoff_base_ms.saturating_mul(1u64 << (attempt - 1).min(10));
    let floor = match err {
        ScraperError::RateLimited { retry_after_secs } => retry_after_secs.saturating_mul(1_000),
        _ => 0,
    };
    let base = computed.max(floor).min(MAX_DELAY_MS);
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    let jittered = (base as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64;
    jittered.min(MAX_DELAY_MS)
}

/// Runs `operation` with up to `max_retries` additional attempts on transient errors.
///
/// Back-off schedule with `backoff_base_ms = 500`:
///
/// | Attempt | Sleep before next attempt     |
/// |---------|-------------------------------|
/// | 1       | 500 ms × 2⁰ ± 25 % jitter     |
/// | 2       | 500 ms × 2¹ ± 25 % jitter     |
/// | 3       | 500 ms × 2² ± 25 % jitter     |
///
/// Non-retriable errors are returned immediately.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, ScraperError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ScraperError>>,
{
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) || attempt >= max_retries {
                    return Err(err);
                }
                attempt += 1;
                let delay_ms = backoff_delay_ms(attempt, backoff_base_ms, &err);
                tracing::warn!(
                    attempt,
                    max_retries,
                    delay_ms,
                    error = %err,
                    "transient marketplace error, retrying after back-off"
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
}
