//! Retry loop: run an attempt until success, policy says stop, or cancellation.

use std::future::Future;
use tokio_util::sync::CancellationToken;

use super::classify;
use super::error::FetchError;
use super::policy::{RetryDecision, RetryPolicy};

/// Runs `f(attempt)` until it succeeds or the retry policy says to stop.
/// `attempt` is 1-based. On retryable failure, waits the backoff then tries again;
/// cancellation stops the loop before the next attempt.
pub async fn run_with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    cancel: &CancellationToken,
    mut f: F,
) -> Result<T, FetchError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, FetchError>>,
{
    let mut attempt = 1u32;
    loop {
        if cancel.is_cancelled() {
            return Err(FetchError::Cancelled);
        }
        match f(attempt).await {
            Ok(v) => return Ok(v),
            Err(e) => {
                let kind = classify::classify(&e);
                match policy.decide(attempt, kind) {
                    RetryDecision::NoRetry => return Err(e),
                    RetryDecision::RetryAfter(d) => {
                        tracing::debug!(attempt, error = %e, "retrying in {:?}", d);
                        tokio::select! {
                            _ = cancel.cancelled() => return Err(FetchError::Cancelled),
                            _ = tokio::time::sleep(d) => {}
                        }
                        attempt += 1;
                    }
                }
            }
        }
    }
}
