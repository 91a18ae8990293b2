//! Disk artifacts for payloads placed on disk.
//!
//! Each artifact is `<uuid-v4>.dat` directly under the download directory.
//! Names are random 128-bit identifiers, so concurrent units in a batch never
//! collide; files are created with `create_new` and never overwritten.

mod writer;

pub use writer::write_artifact;

use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Extension of every artifact written by a batch.
pub const ARTIFACT_EXTENSION: &str = "dat";

/// Fresh artifact path under `dir`.
pub fn artifact_path(dir: &Path) -> PathBuf {
    dir.join(format!("{}.{}", Uuid::new_v4(), ARTIFACT_EXTENSION))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn artifact_paths_are_unique_and_in_dir() {
        let dir = Path::new("/tmp/afdl-test");
        let paths: HashSet<PathBuf> = (0..1000).map(|_| artifact_path(dir)).collect();
        assert_eq!(paths.len(), 1000);
        for p in &paths {
            assert_eq!(p.parent(), Some(dir));
            assert_eq!(p.extension().and_then(|e| e.to_str()), Some("dat"));
        }
    }

    #[test]
    fn write_artifact_persists_payload() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_artifact(dir.path(), b"payload bytes").unwrap();
        assert_eq!(path.parent(), Some(dir.path()));
        assert_eq!(std::fs::read(&path).unwrap(), b"payload bytes");
    }

    #[test]
    fn write_artifact_missing_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(write_artifact(&missing, b"x").is_err());
    }
}
