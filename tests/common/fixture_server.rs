//! Minimal HTTP/1.1 server serving canned routes for integration tests.
//!
//! Each route maps a request path to a status, content type and body.
//! Unknown paths get 404. Requests are counted per path so tests can
//! assert what was (or was not) fetched.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

/// A canned response.
#[derive(Debug, Clone)]
pub struct Route {
    pub status: u16,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

impl Route {
    pub fn ok(content_type: &'static str, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: 200,
            content_type,
            body: body.into(),
        }
    }

    pub fn status(status: u16) -> Self {
        Self {
            status,
            content_type: "text/plain",
            body: Vec::new(),
        }
    }
}

struct Shared {
    routes: HashMap<String, Route>,
    hits: HashMap<String, AtomicUsize>,
}

/// Handle to a running fixture server.
pub struct FixtureServer {
    addr: String,
    shared: Arc<Shared>,
}

impl FixtureServer {
    /// Host:port the server listens on.
    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Absolute URL for a path on this server.
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// How many requests hit `path`.
    pub fn hits(&self, path: &str) -> usize {
        self.shared
            .hits
            .get(path)
            .map(|count| count.load(Ordering::SeqCst))
            .unwrap_or(0)
    }
}

/// Starts a server in a background thread serving `routes`. The server runs
/// until the process exits.
pub fn start(routes: Vec<(&str, Route)>) -> FixtureServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().unwrap().to_string();

    let mut route_map = HashMap::new();
    let mut hits = HashMap::new();
    for (path, route) in routes {
        route_map.insert(path.to_string(), route);
        hits.insert(path.to_string(), AtomicUsize::new(0));
    }
    let shared = Arc::new(Shared {
        routes: route_map,
        hits,
    });

    let server_shared = Arc::clone(&shared);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let shared = Arc::clone(&server_shared);
            thread::spawn(move || handle(stream, &shared));
        }
    });

    FixtureServer { addr, shared }
}

fn handle(mut stream: std::net::TcpStream, shared: &Shared) {
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
    let Some(path) = request_path(request) else {
        return;
    };

    if let Some(count) = shared.hits.get(path) {
        count.fetch_add(1, Ordering::SeqCst);
    }

    match shared.routes.get(path) {
        Some(route) => {
            let response = format!(
                "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                route.status,
                reason(route.status),
                route.content_type,
                route.body.len()
            );
            let _ = stream.write_all(response.as_bytes());
            let _ = stream.write_all(&route.body);
        }
        None => {
            let _ = stream.write_all(
                b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
            );
        }
    }
}

/// Path component of the request line ("GET /x HTTP/1.1" -> "/x").
fn request_path(request: &str) -> Option<&str> {
    request.lines().next()?.split_whitespace().nth(1)
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        404 => "Not Found",
        500 => "Internal Server Error",
        _ => "Status",
    }
}
