//! Retry with exponential back-off and jitter for provider requests.
//!
//! Only transient failures are retried: connect errors, timeouts, 429 and
//! 5xx responses. Everything else is returned on the first attempt.

use std::future::Future;
use std::time::Duration;

use crate::error::ProviderError;

const MAX_DELAY_MS: u64 = 30_000;

pub(crate) fn is_retriable(err: &ProviderError) -> bool {
    match err {
        ProviderError::Http { source, .. } => {
            source.is_connect()
                || source.is_timeout()
                || source.status().is_some_and(|s| s.is_server_error())
        }
        ProviderError::Timeout { .. } | ProviderError::RateLimited { .. } => true,
        ProviderError::UnexpectedStatus { status, .. } => *status >= 500,
        ProviderError::Deserialize { .. }
        | ProviderError::EmptyResponse { .. }
        | ProviderError::InvalidInput { .. }
        | ProviderError::NotFound { .. } => false,
    }
}

/// Delay before retry number `attempt` (1-based), before jitter.
///
/// `backoff_base_ms * 2^(attempt - 1)`, capped at 30 s. A 429 with a
/// `Retry-After` hint waits at least that long, still under the cap.
pub(crate) fn backoff_delay_ms(attempt: u32, backoff_base_ms: u64, err: &ProviderError) -> u64 {
    let computed = backoff_base_ms.saturating_mul(1u64 << attempt.saturating_sub(1).min(16));
    let hinted = match err {
        ProviderError::RateLimited {
            retry_after_secs: Some(secs),
            ..
        } => computed.max(secs.saturating_mul(1_000)),
        _ => computed,
    };
    hinted.min(MAX_DELAY_MS)
}

/// Runs `operation` with up to `max_retries` additional attempts on transient errors.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, ProviderError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ProviderError>>,
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
                let capped = backoff_delay_ms(attempt, backoff_base_ms, &err);
                #[allow(
                    clippy::cast_possible_truncation,
                    clippy::cast_sign_loss,
                    clippy::cast_precision_loss
                )]
                let delay_ms = (capped as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64;
                tracing::warn!(
                    provider = err.provider(),
                    attempt,
                    max_retries,
                    delay_ms,
                    error = %err,
                    "transient provider error, retrying after back-off"
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
}
