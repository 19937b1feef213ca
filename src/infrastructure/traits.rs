//! I/O boundary traits for testability
//!
//! These traits abstract external I/O operations, allowing services
//! to be tested with mock implementations.

use std::io::{self, Read};
use std::path::Path;

use serde_json::Value;

/// Filesystem abstraction for testability.
pub trait FileSystem: Send + Sync {
    /// Write bytes to a file, replacing it if present.
    fn write(&self, path: &Path, content: &[u8]) -> io::Result<()>;

    /// Check if path exists.
    fn exists(&self, path: &Path) -> bool;

    /// Create directory and all parent directories.
    fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Create parent directories if needed.
    fn ensure_parent(&self, path: &Path) -> io::Result<()>;
}

/// Status and body of an HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// True for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Blocking HTTP client abstraction.
///
/// Non-2xx answers are returned as responses; only failures to complete the
/// exchange are errors.
pub trait HttpTransport: Send + Sync {
    /// POST a JSON document.
    fn post_json(&self, url: &str, body: &Value) -> io::Result<HttpResponse>;

    /// POST `application/x-www-form-urlencoded` fields.
    fn post_form(&self, url: &str, fields: &[(&str, &str)]) -> io::Result<HttpResponse>;

    /// GET with query parameters.
    fn get(&self, url: &str, query: &[(&str, &str)]) -> io::Result<HttpResponse>;
}

// ============================================================
// REAL IMPLEMENTATIONS
// ============================================================

/// Real filesystem implementation.
#[derive(Debug, Default)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn write(&self, path: &Path, content: &[u8]) -> io::Result<()> {
        std::fs::write(path, content)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        std::fs::create_dir_all(path)
    }

    fn ensure_parent(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                self.create_dir_all(parent)?;
            }
        }
        Ok(())
    }
}

/// Real HTTP transport backed by a ureq agent.
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl UreqTransport {
    pub fn new() -> Self {
        Self {
            agent: ureq::AgentBuilder::new()
                .user_agent(concat!("avx/", env!("CARGO_PKG_VERSION")))
                .build(),
        }
    }

    /// Normalize a ureq result: status errors still carry a readable response.
    fn read(result: Result<ureq::Response, ureq::Error>) -> io::Result<HttpResponse> {
        let response = match result {
            Ok(response) => response,
            Err(ureq::Error::Status(_, response)) => response,
            Err(ureq::Error::Transport(transport)) => {
                return Err(io::Error::new(
                    io::ErrorKind::Other,
                    transport.to_string(),
                ));
            }
        };

        let status = response.status();
        let mut body = Vec::new();
        response.into_reader().read_to_end(&mut body)?;
        Ok(HttpResponse { status, body })
    }
}

impl HttpTransport for UreqTransport {
    fn post_json(&self, url: &str, body: &Value) -> io::Result<HttpResponse> {
        Self::read(self.agent.post(url).send_json(body))
    }

    fn post_form(&self, url: &str, fields: &[(&str, &str)]) -> io::Result<HttpResponse> {
        Self::read(self.agent.post(url).send_form(fields))
    }

    fn get(&self, url: &str, query: &[(&str, &str)]) -> io::Result<HttpResponse> {
        let request = query
            .iter()
            .fold(self.agent.get(url), |request, (key, value)| {
                request.query(key, value)
            });
        Self::read(request.call())
    }
}
