//! Minimal HTTP/1.1 server serving one fixed response, for integration tests.
//!
//! Every GET gets the same status and body; HEAD gets the headers only.
//! Requests are counted per method so tests can assert retry bounds and that
//! no traffic happened at all.

use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

#[derive(Debug, Clone, Copy)]
pub struct FixedServerOptions {
    /// Status line sent for GET (and HEAD when allowed).
    pub status: u16,
    /// If false, HEAD returns 405 (simulates servers that block HEAD).
    pub head_allowed: bool,
    /// If false, HEAD responses omit Content-Length.
    pub head_content_length: bool,
    /// Advertise this Content-Length on GET instead of the real one (short-body simulation).
    pub advertised_len: Option<usize>,
}

impl Default for FixedServerOptions {
    fn default() -> Self {
        Self {
            status: 200,
            head_allowed: true,
            head_content_length: true,
            advertised_len: None,
        }
    }
}

#[derive(Debug, Default)]
pub struct RequestCounts {
    pub get: AtomicUsize,
    pub head: AtomicUsize,
}

pub struct FixedServer {
    pub url: String,
    pub counts: Arc<RequestCounts>,
}

impl FixedServer {
    pub fn gets(&self) -> usize {
        self.counts.get.load(Ordering::SeqCst)
    }

    pub fn heads(&self) -> usize {
        self.counts.head.load(Ordering::SeqCst)
    }
}

/// Starts a server in a background thread serving `body` with status 200.
/// The server runs until the process exits.
pub fn start(body: Vec<u8>) -> FixedServer {
    start_with_options(body, FixedServerOptions::default())
}

pub fn start_with_options(body: Vec<u8>, opts: FixedServerOptions) -> FixedServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let body = Arc::new(body);
    let counts = Arc::new(RequestCounts::default());
    let counts_srv = Arc::clone(&counts);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let body = Arc::clone(&body);
            let counts = Arc::clone(&counts_srv);
            thread::spawn(move || handle(stream, &body, opts, &counts));
        }
    });
    FixedServer {
        url: format!("http://127.0.0.1:{}/file.bin", port),
        counts,
    }
}

/// Starts a server that accepts connections and never answers.
/// Requests hang until the client gives up or aborts.
pub fn start_silent() -> FixedServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    thread::spawn(move || {
        let mut held = Vec::new();
        for stream in listener.incoming().flatten() {
            held.push(stream);
        }
    });
    FixedServer {
        url: format!("http://127.0.0.1:{}/file.bin", port),
        counts: Arc::new(RequestCounts::default()),
    }
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        404 => "Not Found",
        405 => "Method Not Allowed",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "Status",
    }
}

fn handle(mut stream: std::net::TcpStream, body: &[u8], opts: FixedServerOptions, counts: &RequestCounts) {
    let _ = stream.set_read_timeout(Some(std::time::Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(std::time::Duration::from_secs(2)));
    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) => return,
        Ok(n) => n,
        Err(_) => return,
    };
    let request = match std::str::from_utf8(&buf[..n]) {
        Ok(s) => s,
        Err(_) => return,
    };
    let method = request.split_whitespace().next().unwrap_or("");

    if method.eq_ignore_ascii_case("HEAD") {
        counts.head.fetch_add(1, Ordering::SeqCst);
        if !opts.head_allowed {
            let _ = stream.write_all(
                b"HTTP/1.1 405 Method Not Allowed\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
            );
            return;
        }
        let length = if opts.head_content_length {
            format!("Content-Length: {}\r\n", body.len())
        } else {
            String::new()
        };
        let response = format!(
            "HTTP/1.1 {} {}\r\n{}Connection: close\r\n\r\n",
            opts.status,
            reason(opts.status),
            length
        );
        let _ = stream.write_all(response.as_bytes());
        return;
    }

    if method.eq_ignore_ascii_case("GET") {
        counts.get.fetch_add(1, Ordering::SeqCst);
        let advertised = opts.advertised_len.unwrap_or(body.len());
        let response = format!(
            "HTTP/1.1 {} {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            opts.status,
            reason(opts.status),
            advertised
        );
        let _ = stream.write_all(response.as_bytes());
        let _ = stream.write_all(body);
        return;
    }

    let _ = stream.write_all(b"HTTP/1.1 405 Method Not Allowed\r\nContent-Length: 0\r\n\r\n");
}
