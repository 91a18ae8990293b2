use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::retry::RetryPolicy;

/// Upper bound for any seconds-valued setting (one day).
pub const MAX_SECS: f64 = 86_400.0;

/// Retry policy parameters (optional `[retry]` section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts per fetch (including the first).
    pub max_attempts: u32,
    /// Fixed delay between attempts, in seconds (e.g. 0.5 = 500ms).
    pub backoff_secs: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_secs: 1.0,
        }
    }
}

/// Global configuration loaded from `~/.config/afdl/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AfdlConfig {
    /// Directory where disk-placed payloads are written between sweeps.
    pub download_dir: PathBuf,
    /// Process memory ceiling in MiB below which payloads stay in memory.
    pub max_memory_mb: u64,
    /// Requested files per batch; clamped by available memory at plan time.
    pub batch_size: usize,
    /// Total timeout per HTTP attempt, in seconds.
    pub request_timeout_secs: u64,
    /// Pause between batches, in seconds.
    pub batch_pause_secs: f64,
    /// Size estimate used when neither HEAD nor GET reports a usable size.
    pub default_file_size_bytes: u64,
    /// Optional retry policy; if missing, built-in defaults are used.
    #[serde(default)]
    pub retry: Option<RetryConfig>,
}

impl Default for AfdlConfig {
    fn default() -> Self {
        Self {
            download_dir: PathBuf::from("downloads"),
            max_memory_mb: 300,
            batch_size: 20,
            request_timeout_secs: 30,
            batch_pause_secs: 1.0,
            default_file_size_bytes: 1024 * 1024,
            retry: None,
        }
    }
}

impl AfdlConfig {
    /// Memory ceiling in bytes.
    pub fn memory_ceiling_bytes(&self) -> u64 {
        self.max_memory_mb.saturating_mul(1024 * 1024)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn batch_pause(&self) -> Duration {
        secs_to_duration(self.batch_pause_secs)
    }

    /// Retry policy from the `[retry]` section, or defaults.
    pub fn retry_policy(&self) -> RetryPolicy {
        let retry = self.retry.clone().unwrap_or_default();
        RetryPolicy {
            max_attempts: retry.max_attempts.max(1),
            backoff: secs_to_duration(retry.backoff_secs),
        }
    }

    /// Rejects seconds values that are negative, NaN, infinite or above [`MAX_SECS`].
    pub fn validate(&self) -> Result<()> {
        check_secs("batch_pause_secs", self.batch_pause_secs)?;
        if let Some(retry) = &self.retry {
            check_secs("retry.backoff_secs", retry.backoff_secs)?;
        }
        Ok(())
    }
}

fn check_secs(name: &str, secs: f64) -> Result<()> {
    if !(0.0..=MAX_SECS).contains(&secs) {
        anyhow::bail!("{} must be between 0 and {} seconds, got {}", name, MAX_SECS, secs);
    }
    Ok(())
}

/// Seconds to `Duration`, clamped to `0..=MAX_SECS`. NaN becomes zero.
fn secs_to_duration(secs: f64) -> Duration {
    let secs = if secs.is_nan() { 0.0 } else { secs.clamp(0.0, MAX_SECS) };
    Duration::try_from_secs_f64(secs).unwrap_or(Duration::ZERO)
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("afdl")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from `path`.
pub fn load_from(path: &Path) -> Result<AfdlConfig> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("failed to read config: {}", path.display()))?;
    let cfg: AfdlConfig =
        toml::from_str(&data).with_context(|| format!("invalid config: {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("invalid config: {}", path.display()))?;
    Ok(cfg)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<AfdlConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = AfdlConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    load_from(&path)
}
