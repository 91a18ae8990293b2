//! Artifact writer.

use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use super::artifact_path;

/// Write `content` to a new artifact under `dir` and return its path.
/// Blocking; call from `spawn_blocking` in async code. A partially written
/// file is removed before the error is returned.
pub fn write_artifact(dir: &Path, content: &[u8]) -> Result<PathBuf> {
    let path = artifact_path(dir);
    let file = File::options()
        .write(true)
        .create_new(true)
        .open(&path)
        .with_context(|| format!("failed to create artifact: {}", path.display()))?;

    let mut writer = BufWriter::new(file);
    let written = writer
        .write_all(content)
        .and_then(|()| writer.flush())
        .with_context(|| format!("failed to write artifact: {}", path.display()));
    if let Err(e) = written {
        drop(writer);
        let _ = std::fs::remove_file(&path);
        return Err(e);
    }
    Ok(path)
}
