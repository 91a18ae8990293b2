//! CLI for the AFDL batch downloader.

mod commands;
mod report;

use anyhow::Result;
use afdl_core::config::{self, AfdlConfig};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use commands::{run_clean, run_probe, run_session};

/// Top-level CLI for the AFDL batch downloader.
#[derive(Debug, Parser)]
#[command(name = "afdl")]
#[command(about = "AFDL: repeatedly fetch one URL in memory-aware concurrent batches", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

/// Per-run overrides of config.toml values.
#[derive(Debug, Clone, Default, PartialEq, Args)]
pub struct SessionArgs {
    /// Directory for payloads placed on disk (swept after every batch).
    #[arg(long, value_name = "DIR")]
    pub download_dir: Option<PathBuf>,
    /// Process memory ceiling in MiB for in-memory placement.
    #[arg(long, value_name = "MB")]
    pub max_memory_mb: Option<u64>,
    /// Requested files per batch (clamped by available memory).
    #[arg(long, value_name = "N")]
    pub batch_size: Option<usize>,
    /// Total timeout per HTTP attempt, in seconds.
    #[arg(long, value_name = "SECS")]
    pub timeout_secs: Option<u64>,
    /// Attempts per file, including the first.
    #[arg(long, value_name = "N")]
    pub retries: Option<u32>,
    /// Delay between attempts, in seconds.
    #[arg(long, value_name = "SECS")]
    pub retry_backoff_secs: Option<f64>,
}

impl SessionArgs {
    /// Apply the flags that were given on top of `cfg`.
    pub fn apply(&self, cfg: &mut AfdlConfig) {
        if let Some(dir) = &self.download_dir {
            cfg.download_dir = dir.clone();
        }
        if let Some(mb) = self.max_memory_mb {
            cfg.max_memory_mb = mb;
        }
        if let Some(n) = self.batch_size {
            cfg.batch_size = n;
        }
        if let Some(secs) = self.timeout_secs {
            cfg.request_timeout_secs = secs;
        }
        if self.retries.is_some() || self.retry_backoff_secs.is_some() {
            let mut retry = cfg.retry.clone().unwrap_or_default();
            if let Some(n) = self.retries {
                retry.max_attempts = n;
            }
            if let Some(secs) = self.retry_backoff_secs {
                retry.backoff_secs = secs;
            }
            cfg.retry = Some(retry);
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Fetch the URL in adaptive batches until interrupted with Ctrl-C.
    Run {
        /// Direct HTTP/HTTPS URL to fetch (prompted for when omitted).
        url: Option<String>,
        #[command(flatten)]
        session: SessionArgs,
        /// Stop after N batches instead of running until interrupted.
        #[arg(long, value_name = "N")]
        batches: Option<u64>,
    },

    /// Estimate the file size and print the batch plan without downloading.
    Probe {
        /// Direct HTTP/HTTPS URL to probe.
        url: String,
        #[command(flatten)]
        session: SessionArgs,
    },

    /// Delete leftover files from the download directory.
    Clean {
        /// Directory to sweep (defaults to the configured download directory).
        #[arg(long, value_name = "DIR")]
        download_dir: Option<PathBuf>,
    },
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let mut cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Run {
                url,
                session,
                batches,
            } => {
                session.apply(&mut cfg);
                cfg.validate()?;
                run_session(&cfg, url, batches).await?;
            }
            CliCommand::Probe { url, session } => {
                session.apply(&mut cfg);
                cfg.validate()?;
                run_probe(&cfg, &url).await?;
            }
            CliCommand::Clean { download_dir } => {
                let dir = download_dir.unwrap_or_else(|| cfg.download_dir.clone());
                run_clean(&dir)?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
