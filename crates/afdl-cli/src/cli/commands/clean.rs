//! `afdl clean` – sweep the download directory.

use anyhow::Result;
use afdl_core::sweep;
use std::path::Path;

pub fn run_clean(dir: &Path) -> Result<()> {
    let report = sweep::sweep(dir);
    println!("Removed {} file(s) from {}", report.removed, dir.display());
    if report.failed > 0 {
        anyhow::bail!("{} file(s) in {} could not be removed", report.failed, dir.display());
    }
    Ok(())
}
