//! Fetch unit: one full-body HTTP GET of the target, with bounded retry.
//!
//! Each attempt runs a libcurl easy handle on tokio's blocking pool with a
//! total timeout and a freshly picked User-Agent. The body is returned only
//! when it is complete; a short body or mid-stream error is a failure. The
//! fetch unit never touches the disk.

pub mod user_agent;

use std::str;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::fetch_head;
use crate::retry::{self, FetchError, RetryPolicy};

/// Upper bound for establishing a connection within an attempt.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Per-fetch knobs: total timeout per attempt and the retry policy.
#[derive(Debug, Clone, Copy)]
pub struct FetchOptions {
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
        }
    }
}

/// Fetches `url` into memory, retrying per `opts.retry`.
pub async fn fetch(
    url: &str,
    opts: &FetchOptions,
    cancel: &CancellationToken,
) -> Result<Vec<u8>, FetchError> {
    let timeout = opts.timeout;
    retry::run_with_retry(&opts.retry, cancel, |attempt| {
        let url = url.to_string();
        let cancel = cancel.clone();
        async move {
            let agent = user_agent::pick();
            tracing::debug!(attempt, user_agent = agent, "GET {}", url);
            tokio::task::spawn_blocking(move || get_once(&url, timeout, agent, &cancel))
                .await
                .map_err(|e| FetchError::Task(e.to_string()))?
        }
    })
    .await
}

/// A single GET attempt. Blocking; call from `spawn_blocking` in async code.
/// Aborts the transfer as soon as `cancel` is triggered.
pub fn get_once(
    url: &str,
    timeout: Duration,
    user_agent: &str,
    cancel: &CancellationToken,
) -> Result<Vec<u8>, FetchError> {
    let mut body: Vec<u8> = Vec::new();
    let mut headers: Vec<String> = Vec::new();

    let mut easy = curl::easy::Easy::new();
    easy.url(url)?;
    easy.follow_location(true)?;
    easy.max_redirections(10)?;
    easy.useragent(user_agent)?;
    easy.connect_timeout(timeout.min(CONNECT_TIMEOUT))?;
    easy.timeout(timeout)?;
    easy.progress(true)?;

    {
        let mut transfer = easy.transfer();
        transfer.header_function(|data| {
            if let Ok(s) = str::from_utf8(data) {
                headers.push(s.trim_end().to_string());
            }
            true
        })?;
        transfer.write_function(|data| {
            body.extend_from_slice(data);
            Ok(data.len())
        })?;
        transfer.progress_function(|_, _, _, _| !cancel.is_cancelled())?;
        if let Err(e) = transfer.perform() {
            if e.is_aborted_by_callback() && cancel.is_cancelled() {
                return Err(FetchError::Cancelled);
            }
            return Err(FetchError::Curl(e));
        }
    }

    let code = easy.response_code()?;
    if !(200..300).contains(&code) {
        return Err(FetchError::Http(code));
    }

    let received = body.len() as u64;
    if let Some(expected) = fetch_head::parse_headers(&headers).content_length {
        if expected != received {
            return Err(FetchError::PartialTransfer { expected, received });
        }
    }

    Ok(body)
}
