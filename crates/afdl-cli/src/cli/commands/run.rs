//! `afdl run [url]` – the batch session, until Ctrl-C or `--batches` is reached.

use anyhow::{Context, Result};
use afdl_core::config::AfdlConfig;
use afdl_core::scheduler::BatchPlan;
use afdl_core::session::{Session, SessionEvent, SessionOptions};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, BufRead, Write};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::cli::report;

fn prompt_url() -> Result<String> {
    print!("Enter the URL to download: ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("failed to read URL from stdin")?;
    Ok(line.trim().to_string())
}

fn batch_bar(len: usize) -> ProgressBar {
    let pb = ProgressBar::new(len as u64);
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} files ({per_sec})")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    pb
}

async fn print_events(mut rx: mpsc::Receiver<SessionEvent>) {
    let mut last_plan: Option<BatchPlan> = None;
    let mut bar: Option<ProgressBar> = None;
    while let Some(event) = rx.recv().await {
        match event {
            SessionEvent::Estimated(estimate) => println!("{}", report::estimate_line(&estimate)),
            SessionEvent::Planned { plan, .. } => {
                let changed = last_plan.map_or(true, |prev| {
                    prev.batch_size != plan.batch_size || prev.disk_only() != plan.disk_only()
                });
                if changed {
                    println!("\nAdjusted batch size to {} based on available memory", plan.batch_size);
                    println!("{}", report::memory_analysis(&plan));
                    if plan.disk_only() {
                        println!("{}", report::DISK_ONLY_WARNING);
                    }
                }
                last_plan = Some(plan);
                bar = Some(batch_bar(plan.batch_size));
            }
            SessionEvent::UnitFinished { done, .. } => {
                if let Some(pb) = &bar {
                    pb.set_position(done as u64);
                }
            }
            SessionEvent::BatchCompleted(batch) => {
                if let Some(pb) = bar.take() {
                    pb.finish_and_clear();
                }
                println!("{}", batch);
                if batch.failed > 0 {
                    println!("  ({} of {} failed)", batch.failed, batch.batch_size);
                }
            }
            SessionEvent::Finished(stats) => {
                if let Some(pb) = bar.take() {
                    pb.abandon();
                }
                println!("\nComplete!");
                println!("{}", report::completion_banner(&stats));
            }
        }
    }
}

pub async fn run_session(cfg: &AfdlConfig, url: Option<String>, batches: Option<u64>) -> Result<()> {
    let url = match url {
        Some(url) => url,
        None => prompt_url()?,
    };

    let mut opts = SessionOptions::from_config(cfg);
    opts.max_batches = batches;

    let cancel = CancellationToken::new();
    let ctrl_c = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                println!("\nCtrl+C detected! Finishing up...");
                cancel.cancel();
            }
        }
    });

    let (tx, rx) = mpsc::channel::<SessionEvent>(64);
    let printer = tokio::spawn(print_events(rx));

    let result = Session::new(opts).with_events(tx).run(&url, cancel).await;
    ctrl_c.abort();
    let _ = printer.await;

    let stats = result?;
    tracing::info!(
        files = stats.total_files,
        failed = stats.failed_downloads,
        "run finished"
    );
    Ok(())
}
