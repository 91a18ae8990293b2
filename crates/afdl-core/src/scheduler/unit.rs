//! One file of a batch: fetch, place, persist if needed.

use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

use crate::fetch;
use crate::placement::{self, Placement};
use crate::retry::FetchError;
use crate::storage;

use super::batch::BatchContext;

/// Outcome of one fetch unit, consumed by the batch fold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchResult {
    Success { bytes: u64, placement: Placement },
    Failure { reason: String },
    /// Abandoned because the session was cancelled; neither a success nor a failure.
    Cancelled,
}

impl FetchResult {
    pub fn is_success(&self) -> bool {
        matches!(self, FetchResult::Success { .. })
    }
}

/// Fetch the target once (with retries), decide placement under `ceiling_bytes`,
/// and write an artifact when the payload goes to disk. A failed write turns the
/// fetch into a failure.
pub async fn fetch_and_place(
    url: &str,
    ceiling_bytes: u64,
    ctx: &BatchContext,
    cancel: &CancellationToken,
) -> FetchResult {
    let body = match fetch::fetch(url, &ctx.fetch, cancel).await {
        Ok(body) => body,
        Err(FetchError::Cancelled) => return FetchResult::Cancelled,
        Err(e) if cancel.is_cancelled() => {
            tracing::debug!("fetch of {} abandoned on cancel: {}", url, e);
            return FetchResult::Cancelled;
        }
        Err(e) => {
            tracing::warn!("failed to download {}: {}", url, e);
            return FetchResult::Failure {
                reason: e.to_string(),
            };
        }
    };

    let bytes = body.len() as u64;
    match placement::decide(bytes, ceiling_bytes, ctx.probe.as_ref()) {
        Placement::Memory => {
            drop(body);
            FetchResult::Success {
                bytes,
                placement: Placement::Memory,
            }
        }
        Placement::Disk => persist(ctx.download_dir.clone(), body).await,
    }
}

async fn persist(dir: PathBuf, body: Vec<u8>) -> FetchResult {
    let bytes = body.len() as u64;
    let written = tokio::task::spawn_blocking(move || storage::write_artifact(&dir, &body)).await;
    match written {
        Ok(Ok(path)) => {
            tracing::trace!("wrote {} bytes to {}", bytes, path.display());
            FetchResult::Success {
                bytes,
                placement: Placement::Disk,
            }
        }
        Ok(Err(e)) => {
            tracing::warn!("failed to save artifact: {:#}", e);
            FetchResult::Failure {
                reason: format!("{:#}", e),
            }
        }
        Err(e) => FetchResult::Failure {
            reason: format!("artifact write task failed: {}", e),
        },
    }
}
