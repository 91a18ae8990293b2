//! Classify HTTP status and curl errors into retry policy error kinds.

use super::error::FetchError;
use super::policy::ErrorKind;

/// Classify an HTTP status code for retry decisions.
pub fn classify_http_status(code: u32) -> ErrorKind {
    match code {
        429 | 503 => ErrorKind::Throttled,
        500..=599 => ErrorKind::Http5xx(code as u16),
        200..=299 => ErrorKind::Other,
        _ => ErrorKind::HttpStatus(code as u16),
    }
}

/// Classify a curl error for retry decisions.
///
/// Everything that happened on the wire (connect, DNS, TLS, reset, short body)
/// is `Connection`. Only local setup errors and callback aborts are `Other`.
pub fn classify_curl_error(e: &curl::Error) -> ErrorKind {
    if e.is_operation_timedout() {
        return ErrorKind::Timeout;
    }
    if e.is_aborted_by_callback()
        || e.is_url_malformed()
        || e.is_unsupported_protocol()
        || e.is_bad_function_argument()
        || e.is_unknown_option()
        || e.is_out_of_memory()
    {
        return ErrorKind::Other;
    }
    ErrorKind::Connection
}

/// Classify a fetch error into an ErrorKind.
pub fn classify(e: &FetchError) -> ErrorKind {
    match e {
        FetchError::Curl(ce) => classify_curl_error(ce),
        FetchError::Http(code) => classify_http_status(*code),
        FetchError::PartialTransfer { .. } => ErrorKind::Connection,
        FetchError::Cancelled | FetchError::Task(_) => ErrorKind::Other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_429_and_503_throttled() {
        assert_eq!(classify_http_status(429), ErrorKind::Throttled);
        assert_eq!(classify_http_status(503), ErrorKind::Throttled);
    }

    #[test]
    fn http_5xx_retryable() {
        assert!(matches!(classify_http_status(500), ErrorKind::Http5xx(500)));
        assert!(matches!(classify_http_status(502), ErrorKind::Http5xx(502)));
    }

    #[test]
    fn http_4xx_is_a_retryable_status() {
        assert_eq!(classify_http_status(404), ErrorKind::HttpStatus(404));
        assert_eq!(classify_http_status(403), ErrorKind::HttpStatus(403));
        assert_eq!(classify_http_status(301), ErrorKind::HttpStatus(301));
    }

    #[test]
    fn transport_curl_errors_are_connection_level() {
        // CURLE_SSL_CONNECT_ERROR, CURLE_PEER_FAILED_VERIFICATION, CURLE_COULDNT_CONNECT
        for code in [35, 60, 7] {
            let e = curl::Error::new(code);
            assert_eq!(classify_curl_error(&e), ErrorKind::Connection, "curl code {}", code);
        }
    }

    #[test]
    fn local_curl_errors_not_retried() {
        // CURLE_URL_MALFORMAT, CURLE_UNSUPPORTED_PROTOCOL, CURLE_ABORTED_BY_CALLBACK
        for code in [3, 1, 42] {
            let e = curl::Error::new(code);
            assert_eq!(classify_curl_error(&e), ErrorKind::Other, "curl code {}", code);
        }
    }

    #[test]
    fn short_body_is_connection_level() {
        let e = FetchError::PartialTransfer {
            expected: 1024,
            received: 10,
        };
        assert_eq!(classify(&e), ErrorKind::Connection);
    }

    #[test]
    fn cancellation_never_retried() {
        assert_eq!(classify(&FetchError::Cancelled), ErrorKind::Other);
    }
}
