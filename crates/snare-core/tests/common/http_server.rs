//! Minimal HTTP/1.1 server answering HEAD requests for probe tests.
//!
//! `/files/<name>` answers 200 with the configured headers; `/go/<name>`
//! redirects there with a 302. Everything else is a 404.

use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::Arc;
use std::thread;

#[derive(Debug, Clone)]
pub struct FileHeaders {
    pub content_length: u64,
    pub content_type: &'static str,
    /// Full Content-Disposition value, if any.
    pub disposition: Option<&'static str>,
    pub accept_ranges: bool,
}

/// Starts a server in a background thread. Returns the base URL
/// (e.g. "http://127.0.0.1:12345"). The server runs until the process exits.
pub fn start(headers: FileHeaders) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let headers = Arc::new(headers);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let headers = Arc::clone(&headers);
            thread::spawn(move || handle(stream, &headers));
        }
    });
    format!("http://127.0.0.1:{}", port)
}

fn handle(mut stream: std::net::TcpStream, headers: &FileHeaders) {
    let _ = stream.set_read_timeout(Some(std::time::Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(std::time::Duration::from_secs(2)));
    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) | Err(_) => return,
        Ok(n) => n,
    };
    let Ok(request) = std::str::from_utf8(&buf[..n]) else {
        return;
    };
    let (method, path) = parse_request_line(request);
    if !method.eq_ignore_ascii_case("HEAD") {
        let _ = stream.write_all(b"HTTP/1.1 405 Method Not Allowed\r\nContent-Length: 0\r\nConnection: close\r\n\r\n");
        return;
    }

    let response = if let Some(name) = path.strip_prefix("/go/") {
        format!(
            "HTTP/1.1 302 Found\r\nLocation: /files/{}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
            name
        )
    } else if path.starts_with("/files/") {
        let mut response = format!(
            "HTTP/1.1 200 OK\r\nConnection: close\r\nContent-Length: {}\r\nContent-Type: {}\r\n",
            headers.content_length, headers.content_type
        );
        if let Some(cd) = headers.disposition {
            response.push_str(&format!("Content-Disposition: {}\r\n", cd));
        }
        if headers.accept_ranges {
            response.push_str("Accept-Ranges: bytes\r\n");
        }
        response.push_str("\r\n");
        response
    } else {
        "HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n".to_string()
    };
    let _ = stream.write_all(response.as_bytes());
}

/// Returns (method, path) from the request line.
fn parse_request_line(request: &str) -> (&str, &str) {
    let mut parts = request.lines().next().unwrap_or("").split_whitespace();
    let method = parts.next().unwrap_or("");
    let path = parts.next().unwrap_or("/");
    (method, path)
}
