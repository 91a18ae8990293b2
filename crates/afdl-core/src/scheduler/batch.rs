//! Run one batch: N concurrent fetch units, folded into one outcome.

use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::fetch::FetchOptions;
use crate::memory::MemoryProbe;
use crate::placement::Placement;

use super::plan::BatchPlan;
use super::unit::{fetch_and_place, FetchResult};

/// Everything a fetch unit needs besides the URL and the plan.
#[derive(Clone)]
pub struct BatchContext {
    pub fetch: FetchOptions,
    pub download_dir: PathBuf,
    pub probe: Arc<dyn MemoryProbe>,
}

/// Folded results of one batch. `succeeded + failed + cancelled == batch_size`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    pub batch_size: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Units abandoned on cancellation; not counted as failures.
    pub cancelled: usize,
    /// Payload bytes of successful files.
    pub bytes: u64,
    pub in_memory: usize,
    pub on_disk: usize,
}

impl BatchOutcome {
    pub fn new(batch_size: usize) -> Self {
        Self {
            batch_size,
            ..Self::default()
        }
    }

    /// Fold one unit's result.
    pub fn record(&mut self, result: &FetchResult) {
        match result {
            FetchResult::Success { bytes, placement } => {
                self.succeeded += 1;
                self.bytes += bytes;
                match placement {
                    Placement::Memory => self.in_memory += 1,
                    Placement::Disk => self.on_disk += 1,
                }
            }
            FetchResult::Failure { .. } => self.failed += 1,
            FetchResult::Cancelled => self.cancelled += 1,
        }
    }

    /// True when cancellation cut this batch short.
    pub fn interrupted(&self) -> bool {
        self.cancelled > 0
    }
}

/// Launches `plan.batch_size` fetch units against `url` concurrently and waits for
/// every one of them. A unit that panics counts as a failure, so no result is lost.
pub async fn run_batch(
    url: &str,
    plan: &BatchPlan,
    ctx: &BatchContext,
    cancel: &CancellationToken,
) -> BatchOutcome {
    run_batch_with_progress(url, plan, ctx, cancel, |_, _| {}).await
}

/// Like [`run_batch`], calling `on_unit(result, outcome_so_far)` as each unit resolves.
pub async fn run_batch_with_progress<F>(
    url: &str,
    plan: &BatchPlan,
    ctx: &BatchContext,
    cancel: &CancellationToken,
    mut on_unit: F,
) -> BatchOutcome
where
    F: FnMut(&FetchResult, &BatchOutcome),
{
    let mut join_set = tokio::task::JoinSet::new();
    for _ in 0..plan.batch_size {
        let url = url.to_string();
        let ctx = ctx.clone();
        let cancel = cancel.clone();
        let ceiling = plan.memory_ceiling_bytes;
        join_set.spawn(async move { fetch_and_place(&url, ceiling, &ctx, &cancel).await });
    }

    let mut outcome = BatchOutcome::new(plan.batch_size);
    while let Some(res) = join_set.join_next().await {
        let result = res.unwrap_or_else(|e| FetchResult::Failure {
            reason: format!("fetch task join: {}", e),
        });
        outcome.record(&result);
        on_unit(&result, &outcome);
    }

    tracing::info!(
        batch_size = outcome.batch_size,
        succeeded = outcome.succeeded,
        failed = outcome.failed,
        cancelled = outcome.cancelled,
        bytes = outcome.bytes,
        in_memory = outcome.in_memory,
        on_disk = outcome.on_disk,
        "batch finished"
    );
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::StaticMemoryProbe;
    use crate::retry::RetryPolicy;
    use std::time::Duration;

    #[test]
    fn record_counts_every_result_once() {
        let mut outcome = BatchOutcome::new(4);
        outcome.record(&FetchResult::Success {
            bytes: 10,
            placement: Placement::Memory,
        });
        outcome.record(&FetchResult::Success {
            bytes: 20,
            placement: Placement::Disk,
        });
        outcome.record(&FetchResult::Failure {
            reason: "HTTP 500".into(),
        });
        outcome.record(&FetchResult::Cancelled);
        assert_eq!(
            outcome.succeeded + outcome.failed + outcome.cancelled,
            outcome.batch_size
        );
        assert_eq!(outcome.failed, 1);
        assert!(outcome.interrupted());
        assert_eq!(outcome.bytes, 30);
        assert_eq!(outcome.in_memory, 1);
        assert_eq!(outcome.on_disk, 1);
    }

    #[tokio::test]
    async fn unreachable_target_fails_every_unit() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = BatchContext {
            fetch: FetchOptions {
                timeout: Duration::from_secs(2),
                retry: RetryPolicy {
                    max_attempts: 1,
                    backoff: Duration::ZERO,
                },
            },
            download_dir: dir.path().to_path_buf(),
            probe: Arc::new(StaticMemoryProbe::default()),
        };
        for batch_size in [1usize, 3, 7] {
            let plan = BatchPlan {
                batch_size,
                estimated_file_bytes: 1024,
                memory_ceiling_bytes: 0,
                available_memory_bytes: 0,
            };
            // Port 9 (discard) on localhost: connection refused.
            let outcome = run_batch(
                "http://127.0.0.1:9/",
                &plan,
                &ctx,
                &CancellationToken::new(),
            )
            .await;
            assert_eq!(outcome.succeeded, 0);
            assert_eq!(outcome.failed, batch_size);
            assert_eq!(outcome.bytes, 0);
        }
    }

    #[tokio::test]
    async fn progress_callback_sees_every_unit() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = BatchContext {
            fetch: FetchOptions::default(),
            download_dir: dir.path().to_path_buf(),
            probe: Arc::new(StaticMemoryProbe::default()),
        };
        let plan = BatchPlan {
            batch_size: 5,
            estimated_file_bytes: 1024,
            memory_ceiling_bytes: 0,
            available_memory_bytes: 0,
        };
        let cancel = CancellationToken::new();
        cancel.cancel();
        let mut seen = Vec::new();
        let outcome = run_batch_with_progress("http://127.0.0.1:9/", &plan, &ctx, &cancel, |r, so_far| {
            assert_eq!(*r, FetchResult::Cancelled);
            seen.push(so_far.cancelled);
        })
        .await;
        assert_eq!(seen, vec![1, 2, 3, 4, 5]);
        assert_eq!(outcome.cancelled, 5);
        assert_eq!(outcome.failed, 0);
    }
}
