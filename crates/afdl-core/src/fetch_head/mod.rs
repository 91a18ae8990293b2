//! Per-file size estimation.
//!
//! Uses the curl crate (libcurl) to HEAD the target and read `Content-Length`.
//! Servers that reject HEAD or omit the header get a full GET instead; when
//! neither yields a size the configured default is used. Never fails.

mod parse;

pub(crate) use parse::parse_headers;

use anyhow::{Context, Result};
use std::str;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::fetch::{self, user_agent};

/// Metadata of the final response of a request.
#[derive(Debug, Clone, Default)]
pub struct HeadResult {
    /// Status code of the final response, if a status line was seen.
    pub status: Option<u32>,
    /// Total size in bytes, if `Content-Length` is present.
    pub content_length: Option<u64>,
}

/// Where a size estimate came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeSource {
    Head,
    Get,
    Default,
}

/// Estimated size of one payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeEstimate {
    pub bytes: u64,
    pub source: SizeSource,
}

/// Performs a HEAD request and returns parsed metadata.
///
/// Follows redirects. Runs in the current thread; call from `spawn_blocking`
/// if used from async code. Aborts as soon as `cancel` is triggered.
pub fn probe(url: &str, timeout: Duration, cancel: &CancellationToken) -> Result<HeadResult> {
    let mut headers: Vec<String> = Vec::new();

    let mut easy = curl::easy::Easy::new();
    easy.url(url).context("invalid URL")?;
    easy.nobody(true)?; // HEAD request
    easy.follow_location(true)?;
    easy.useragent(user_agent::pick())?;
    easy.connect_timeout(timeout.min(fetch::CONNECT_TIMEOUT))?;
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
        transfer.progress_function(|_, _, _, _| !cancel.is_cancelled())?;
        if let Err(e) = transfer.perform() {
            if e.is_aborted_by_callback() && cancel.is_cancelled() {
                anyhow::bail!("HEAD request cancelled");
            }
            return Err(e).context("HEAD request failed");
        }
    }

    let code = easy.response_code().context("no response code")?;
    if !(200..300).contains(&code) {
        anyhow::bail!("HEAD {} returned HTTP {}", url, code);
    }

    Ok(parse::parse_headers(&headers))
}

/// Estimate the payload size: HEAD, then GET, then `default_bytes`.
pub async fn estimate_file_size(
    url: &str,
    timeout: Duration,
    default_bytes: u64,
    cancel: &CancellationToken,
) -> SizeEstimate {
    let head = tokio::task::spawn_blocking({
        let url = url.to_string();
        let cancel = cancel.clone();
        move || probe(&url, timeout, &cancel)
    })
    .await;

    match head {
        Ok(Ok(HeadResult {
            content_length: Some(len),
            ..
        })) => {
            tracing::debug!(bytes = len, "size from HEAD");
            return SizeEstimate {
                bytes: len,
                source: SizeSource::Head,
            };
        }
        Ok(Ok(_)) => tracing::debug!("HEAD carried no Content-Length; falling back to GET"),
        Ok(Err(e)) => tracing::debug!("HEAD probe failed ({:#}); falling back to GET", e),
        Err(e) => tracing::warn!("HEAD probe task failed: {}", e),
    }

    if cancel.is_cancelled() {
        return SizeEstimate {
            bytes: default_bytes,
            source: SizeSource::Default,
        };
    }

    let get = tokio::task::spawn_blocking({
        let url = url.to_string();
        let cancel = cancel.clone();
        move || fetch::get_once(&url, timeout, user_agent::pick(), &cancel)
    })
    .await;

    match get {
        Ok(Ok(body)) => {
            tracing::debug!(bytes = body.len(), "size from GET");
            SizeEstimate {
                bytes: body.len() as u64,
                source: SizeSource::Get,
            }
        }
        Ok(Err(e)) => {
            tracing::warn!("size probe GET failed ({}); assuming {} bytes", e, default_bytes);
            SizeEstimate {
                bytes: default_bytes,
                source: SizeSource::Default,
            }
        }
        Err(e) => {
            tracing::warn!("size probe GET task failed ({}); assuming {} bytes", e, default_bytes);
            SizeEstimate {
                bytes: default_bytes,
                source: SizeSource::Default,
            }
        }
    }
}
