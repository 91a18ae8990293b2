//! `afdl probe <url>` – size estimate and batch plan, no downloads.

use anyhow::Result;
use afdl_core::config::AfdlConfig;
use afdl_core::fetch_head;
use afdl_core::memory::{self, SystemMemoryProbe};
use afdl_core::scheduler;
use afdl_core::session;
use tokio_util::sync::CancellationToken;

use crate::cli::report;

pub async fn run_probe(cfg: &AfdlConfig, url: &str) -> Result<()> {
    let url = session::validate_url(url)?;
    let estimate = fetch_head::estimate_file_size(
        url.as_str(),
        cfg.request_timeout(),
        cfg.default_file_size_bytes,
        &CancellationToken::new(),
    )
    .await;
    println!("{}", report::estimate_line(&estimate));

    let available = memory::available_or_zero(&SystemMemoryProbe);
    let plan = scheduler::plan_batch(
        cfg.batch_size,
        estimate.bytes,
        available,
        cfg.memory_ceiling_bytes(),
    );
    println!("{}", report::memory_analysis(&plan));
    if plan.disk_only() {
        println!("{}", report::DISK_ONLY_WARNING);
    }
    Ok(())
}
