//! Session loop: plan → batch → fold → sweep → report → pause, until cancelled.
//!
//! The session owns `DownloadStats` and is its only writer. Cancellation is
//! cooperative through a `CancellationToken`: it is observed during the size
//! probe, inside every fetch (in-flight transfers abort), and during the
//! pause between batches. On the way out the session sweeps the download
//! directory one last time and reports final statistics.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::config::AfdlConfig;
use crate::fetch::FetchOptions;
use crate::fetch_head::{self, SizeEstimate};
use crate::memory::{self, MemoryProbe, SystemMemoryProbe};
use crate::scheduler::{self, BatchContext, BatchPlan};
use crate::stats::{BatchReport, DownloadStats};
use crate::sweep;

/// Errors that stop a session before it starts looping.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Invalid URL {0:?}. Please provide a URL that starts with 'http://' or 'https://'.")]
    InvalidUrl(String),
    #[error("failed to create download directory {}: {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Progress notifications, delivered in order over the optional event channel.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// Per-file size estimate, once before the first batch.
    Estimated(SizeEstimate),
    /// A batch is about to start with this plan.
    Planned { batch: u64, plan: BatchPlan },
    /// One unit of the running batch resolved; `done` of `total` so far.
    /// Delivered best-effort: dropped when the channel is full.
    UnitFinished { batch: u64, done: usize, total: usize },
    /// A batch was folded, swept and timed.
    BatchCompleted(BatchReport),
    /// Final statistics after the closing sweep.
    Finished(DownloadStats),
}

/// Session parameters, usually derived from `AfdlConfig`.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub download_dir: PathBuf,
    /// Requested batch size before memory clamping.
    pub batch_size: usize,
    pub memory_ceiling_bytes: u64,
    pub fetch: FetchOptions,
    pub batch_pause: Duration,
    pub default_file_size_bytes: u64,
    /// Stop after this many batches (`None` = until cancelled).
    pub max_batches: Option<u64>,
}

impl SessionOptions {
    pub fn from_config(cfg: &AfdlConfig) -> Self {
        Self {
            download_dir: cfg.download_dir.clone(),
            batch_size: cfg.batch_size,
            memory_ceiling_bytes: cfg.memory_ceiling_bytes(),
            fetch: FetchOptions {
                timeout: cfg.request_timeout(),
                retry: cfg.retry_policy(),
            },
            batch_pause: cfg.batch_pause(),
            default_file_size_bytes: cfg.default_file_size_bytes,
            max_batches: None,
        }
    }
}

/// Accepts only absolute `http`/`https` URLs.
pub fn validate_url(input: &str) -> Result<Url, SessionError> {
    let trimmed = input.trim();
    let url = Url::parse(trimmed).map_err(|_| SessionError::InvalidUrl(trimmed.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        _ => Err(SessionError::InvalidUrl(trimmed.to_string())),
    }
}

pub struct Session {
    opts: SessionOptions,
    probe: Arc<dyn MemoryProbe>,
    events: Option<mpsc::Sender<SessionEvent>>,
}

impl Session {
    pub fn new(opts: SessionOptions) -> Self {
        Self {
            opts,
            probe: Arc::new(SystemMemoryProbe),
            events: None,
        }
    }

    /// Replace the memory probe (e.g. with fixed readings).
    pub fn with_probe(mut self, probe: Arc<dyn MemoryProbe>) -> Self {
        self.probe = probe;
        self
    }

    /// Deliver progress events to `tx`.
    pub fn with_events(mut self, tx: mpsc::Sender<SessionEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    pub fn options(&self) -> &SessionOptions {
        &self.opts
    }

    async fn emit(&self, event: SessionEvent) {
        if let Some(tx) = &self.events {
            let _ = tx.send(event).await;
        }
    }

    /// Runs batches against `url` until `cancel` fires (or `max_batches` is reached),
    /// then sweeps and returns the session totals. Fails only on an invalid URL or
    /// an uncreatable download directory, both before any network traffic.
    pub async fn run(
        &self,
        url: &str,
        cancel: CancellationToken,
    ) -> Result<DownloadStats, SessionError> {
        let url = validate_url(url)?;
        let dir = &self.opts.download_dir;
        std::fs::create_dir_all(dir).map_err(|source| SessionError::CreateDir {
            path: dir.clone(),
            source,
        })?;
        let leftovers = sweep::sweep(dir);
        if leftovers.removed > 0 {
            tracing::info!("removed {} leftover file(s) from {}", leftovers.removed, dir.display());
        }

        let mut stats = DownloadStats::new();
        let estimate = tokio::select! {
            _ = cancel.cancelled() => None,
            e = fetch_head::estimate_file_size(
                url.as_str(),
                self.opts.fetch.timeout,
                self.opts.default_file_size_bytes,
                &cancel,
            ) => Some(e),
        };

        if let Some(estimate) = estimate {
            tracing::info!(bytes = estimate.bytes, source = ?estimate.source, "estimated file size");
            self.emit(SessionEvent::Estimated(estimate)).await;
            self.run_batches(url.as_str(), estimate.bytes, &mut stats, &cancel)
                .await;
        }

        let closing = sweep::sweep(dir);
        tracing::info!(
            files = stats.total_files,
            failed = stats.failed_downloads,
            bytes = stats.total_bytes,
            swept = closing.removed,
            "session finished"
        );
        self.emit(SessionEvent::Finished(stats.clone())).await;
        Ok(stats)
    }

    async fn run_batches(
        &self,
        url: &str,
        estimated_file_bytes: u64,
        stats: &mut DownloadStats,
        cancel: &CancellationToken,
    ) {
        let ctx = BatchContext {
            fetch: self.opts.fetch,
            download_dir: self.opts.download_dir.clone(),
            probe: Arc::clone(&self.probe),
        };
        let mut last_batch_end: Option<Instant> = None;
        let mut batch = 0u64;

        loop {
            if cancel.is_cancelled() {
                break;
            }
            if self.opts.max_batches.is_some_and(|max| batch >= max) {
                break;
            }
            batch += 1;

            let available = memory::available_or_zero(self.probe.as_ref());
            let plan = scheduler::plan_batch(
                self.opts.batch_size,
                estimated_file_bytes,
                available,
                self.opts.memory_ceiling_bytes,
            );
            if plan.disk_only() {
                tracing::warn!(batch, "insufficient memory; batch runs disk-only");
            }
            tracing::debug!(batch, ?plan, "planned batch");
            self.emit(SessionEvent::Planned { batch, plan }).await;

            let batch_start = Instant::now();
            let events = self.events.as_ref();
            let outcome =
                scheduler::run_batch_with_progress(url, &plan, &ctx, cancel, |_, so_far| {
                    if let Some(tx) = events {
                        let _ = tx.try_send(SessionEvent::UnitFinished {
                            batch,
                            done: so_far.succeeded + so_far.failed + so_far.cancelled,
                            total: so_far.batch_size,
                        });
                    }
                })
                .await;
            stats.fold(&outcome);
            let batch_end = Instant::now();
            let elapsed = batch_end.duration_since(last_batch_end.unwrap_or(batch_start));
            last_batch_end = Some(batch_end);

            sweep::sweep(&self.opts.download_dir);

            if outcome.interrupted() {
                tracing::info!(
                    batch,
                    succeeded = outcome.succeeded,
                    cancelled = outcome.cancelled,
                    "batch cut short by cancellation"
                );
            } else {
                let report = BatchReport::new(batch, &outcome, elapsed);
                tracing::info!(batch, "{}", report);
                self.emit(SessionEvent::BatchCompleted(report)).await;
            }

            if self.opts.max_batches.is_some_and(|max| batch >= max) {
                break;
            }
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.opts.batch_pause) => {}
            }
        }
    }
}
