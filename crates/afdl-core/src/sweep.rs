//! Cleanup sweeper: removes every regular file directly under the download directory.
//!
//! Runs to completion between batches. Per-file failures are logged and
//! counted, never returned; a missing directory is an empty sweep.

use std::fs;
use std::io;
use std::path::Path;

/// Outcome of one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub removed: usize,
    pub failed: usize,
}

/// Deletes every regular file directly under `dir`. Subdirectories are left alone.
pub fn sweep(dir: &Path) -> SweepReport {
    sweep_with(dir, |path| fs::remove_file(path))
}

fn sweep_with<F>(dir: &Path, mut remove: F) -> SweepReport
where
    F: FnMut(&Path) -> io::Result<()>,
{
    let mut report = SweepReport::default();
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return report,
        Err(e) => {
            tracing::warn!("sweep: cannot read {}: {}", dir.display(), e);
            report.failed += 1;
            return report;
        }
    };

    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("sweep: bad entry in {}: {}", dir.display(), e);
                report.failed += 1;
                continue;
            }
        };
        let path = entry.path();
        match entry.file_type() {
            Ok(ft) if ft.is_file() => {}
            Ok(_) => continue,
            Err(e) => {
                tracing::warn!("sweep: cannot stat {}: {}", path.display(), e);
                report.failed += 1;
                continue;
            }
        }
        match remove(&path) {
            Ok(()) => report.removed += 1,
            // Already gone: the directory is in the state we want.
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!("sweep: failed to remove {}: {}", path.display(), e);
                report.failed += 1;
            }
        }
    }

    tracing::debug!(removed = report.removed, failed = report.failed, "swept {}", dir.display());
    report
}
