//! Retry with exponential back-off and jitter for idempotent reads.
//!
//! Only `GET` requests go through [`retry_with_backoff`]. Creating customers,
//! orders, and transitions is never retried: a lost response could otherwise
//! place the same order twice.

use std::future::Future;
use std::time::Duration;

use rand::Rng;

use crate::error::OrdersError;

/// Returns `true` for errors that are worth retrying after a back-off delay.
///
/// **Retriable:**
/// - Network-level failures: timeout, connection refused or reset.
/// - HTTP 5xx responses.
///
/// **Not retriable:**
/// - 4xx rejections; the same request would be refused again.
/// - [`OrdersError::Deserialize`] and [`OrdersError::InvalidBaseUrl`].
pub(crate) fn is_retriable(err: &OrdersError) -> bool {
    match err {
        OrdersError::Http(e) => {
            e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error())
        }
        OrdersError::Rejected { status, .. } => *status >= 500,
        OrdersError::Deserialize { .. } | OrdersError::InvalidBaseUrl { .. } => false,
    }
}

const MAX_DELAY_MS: u64 = 30_000;

/// Delay before retry number `retry` (1-based): `base × 2^(retry-1)`, capped at
/// 30 s, then scaled by `jitter` (expected in `0.75..=1.25`).
fn backoff_delay(retry: u32, backoff_base_ms: u64, jitter: f64) -> Duration {
    let exp = retry.saturating_sub(1).min(16);
    let capped = backoff_base_ms.saturating_mul(1u64 << exp).min(MAX_DELAY_MS);
    Duration::from_millis(capped).mul_f64(jitter)
}

/// Runs `operation` once plus up to `max_retries` retries on transient errors.
///
/// With `backoff_base_ms = 500` the pauses are roughly 0.5 s, 1 s, 2 s and so
/// on, each with ±25 % jitter. Non-retriable errors return immediately.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, OrdersError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, OrdersError>>,
{
    for retry in 1..=max_retries {
        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(err) if !is_retriable(&err) => return Err(err),
            Err(err) => err,
        };
        let delay = backoff_delay(retry, backoff_base_ms, rand::rng().random_range(0.75..=1.25));
        tracing::warn!(
            retry,
            max_retries,
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            error = %err,
            "order service read failed, backing off"
        );
        tokio::time::sleep(delay).await;
    }
    operation().await
}
