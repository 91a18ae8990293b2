//! Parse HTTP response header lines into HeadResult.

use super::HeadResult;

/// Parse collected header lines into HeadResult.
///
/// Lines from every response in a redirect chain arrive in order; a status
/// line resets what was seen so only the final response counts.
pub(crate) fn parse_headers(lines: &[String]) -> HeadResult {
    let mut content_length = None;
    let mut status = None;

    for line in lines {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line.starts_with("HTTP/") {
            content_length = None;
            status = line
                .split_whitespace()
                .nth(1)
                .and_then(|code| code.parse::<u32>().ok());
            continue;
        }
        if let Some((name, value)) = line.split_once(':') {
            if name.trim().eq_ignore_ascii_case("content-length") {
                content_length = value.trim().parse::<u64>().ok();
            }
        }
    }

    HeadResult {
        status,
        content_length,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parse_headers_content_length() {
        let r = parse_headers(&lines(&["HTTP/1.1 200 OK", "Content-Length: 12345"]));
        assert_eq!(r.status, Some(200));
        assert_eq!(r.content_length, Some(12345));
    }

    #[test]
    fn parse_headers_case_insensitive() {
        let r = parse_headers(&lines(&["content-length:   99  "]));
        assert_eq!(r.content_length, Some(99));
    }

    #[test]
    fn parse_headers_missing_or_garbage_length() {
        let r = parse_headers(&lines(&["HTTP/1.1 200 OK", "Content-Type: text/plain"]));
        assert!(r.content_length.is_none());
        let r = parse_headers(&lines(&["Content-Length: lots"]));
        assert!(r.content_length.is_none());
    }

    #[test]
    fn parse_headers_redirect_chain_uses_last_response() {
        let r = parse_headers(&lines(&[
            "HTTP/1.1 301 Moved Permanently",
            "Content-Length: 162",
            "Location: /real",
            "",
            "HTTP/1.1 200 OK",
            "Content-Length: 4096",
        ]));
        assert_eq!(r.status, Some(200));
        assert_eq!(r.content_length, Some(4096));

        let r = parse_headers(&lines(&[
            "HTTP/1.1 302 Found",
            "Content-Length: 10",
            "HTTP/1.1 200 OK",
        ]));
        assert!(r.content_length.is_none());
    }
}
