//! Fetch error type for retry classification.

/// Error returned by a single fetch attempt (curl failure, HTTP error, short body).
/// Typed so the retry loop can classify it before it is folded into a batch result.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Curl reported an error (timeout, connection, aborted transfer, etc.).
    #[error("{0}")]
    Curl(#[from] curl::Error),
    /// HTTP response had a non-2xx status.
    #[error("HTTP {0}")]
    Http(u32),
    /// Transfer completed but the body is shorter (or longer) than `Content-Length`.
    #[error("partial transfer: expected {expected} bytes, got {received}")]
    PartialTransfer { expected: u64, received: u64 },
    /// The session was cancelled before or during the attempt.
    #[error("cancelled")]
    Cancelled,
    /// The blocking task running the transfer panicked or was aborted.
    #[error("fetch task failed: {0}")]
    Task(String),
}

impl FetchError {
    /// HTTP status code, if the failure was a non-2xx response.
    pub fn status(&self) -> Option<u32> {
        match self {
            FetchError::Http(code) => Some(*code),
            _ => None,
        }
    }
}
