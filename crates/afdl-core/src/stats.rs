//! Session statistics and per-batch throughput.
//!
//! `DownloadStats` is owned by the session and only changes through `fold`,
//! once per finished batch, so concurrent fetch units never touch it.

use std::fmt;
use std::time::{Duration, Instant, SystemTime};

use crate::scheduler::BatchOutcome;

const GIB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Aggregate totals for one session.
#[derive(Debug, Clone)]
pub struct DownloadStats {
    /// Files fetched completely (memory or disk placement).
    pub total_files: u64,
    /// Files that failed after exhausting retries or could not be persisted.
    pub failed_downloads: u64,
    /// Files abandoned by cancellation. Not failures.
    pub cancelled_downloads: u64,
    /// Payload bytes of all successful files.
    pub total_bytes: u64,
    /// Wall-clock session start, for display.
    pub started_at: SystemTime,
    started: Instant,
}

impl Default for DownloadStats {
    fn default() -> Self {
        Self::new()
    }
}

impl DownloadStats {
    pub fn new() -> Self {
        Self {
            total_files: 0,
            failed_downloads: 0,
            cancelled_downloads: 0,
            total_bytes: 0,
            started_at: SystemTime::now(),
            started: Instant::now(),
        }
    }

    /// Merge one batch's results.
    pub fn fold(&mut self, outcome: &BatchOutcome) {
        self.total_files += outcome.succeeded as u64;
        self.failed_downloads += outcome.failed as u64;
        self.cancelled_downloads += outcome.cancelled as u64;
        self.total_bytes += outcome.bytes;
    }

    /// Time since the session started.
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn total_gib(&self) -> f64 {
        self.total_bytes as f64 / GIB
    }
}

impl fmt::Display for DownloadStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total files downloaded: {}", self.total_files)?;
        writeln!(f, "Failed downloads: {}", self.failed_downloads)?;
        writeln!(f, "Total data downloaded: {:.2} GB", self.total_gib())?;
        write!(f, "Total time: {:.2} seconds", self.elapsed().as_secs_f64())
    }
}

/// Throughput line for one finished batch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatchReport {
    /// 1-based batch number within the session.
    pub batch: u64,
    pub batch_size: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub bytes: u64,
    /// Time since the previous batch ended (since this batch started, for the first).
    pub elapsed: Duration,
    pub files_per_sec: f64,
}

impl BatchReport {
    pub fn new(batch: u64, outcome: &BatchOutcome, elapsed: Duration) -> Self {
        Self {
            batch,
            batch_size: outcome.batch_size,
            succeeded: outcome.succeeded,
            failed: outcome.failed,
            bytes: outcome.bytes,
            elapsed,
            files_per_sec: files_per_sec(outcome.batch_size, elapsed),
        }
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} files downloaded in {:.2} seconds, average speed: {:.2} files/second",
            self.batch_size,
            self.elapsed.as_secs_f64(),
            self.files_per_sec
        )
    }
}

/// `batch_size / elapsed`, or 0 when no time has passed.
pub fn files_per_sec(batch_size: usize, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs <= 0.0 {
        return 0.0;
    }
    batch_size as f64 / secs
}
