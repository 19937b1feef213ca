//! Shared fixtures: a scripted HTTP transport and zip archive builders

#![allow(dead_code)]

use std::collections::VecDeque;
use std::io::{self, Cursor, Write};
use std::sync::Mutex;

use serde_json::Value;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use avx::infrastructure::traits::{HttpResponse, HttpTransport};

pub const CONTROLLER: &str = "10.0.0.10";
pub const CID: &str = "abc123";

/// One request seen by the mock transport.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCall {
    Json { url: String, body: Value },
    Form { url: String, fields: Vec<(String, String)> },
    Get { url: String, query: Vec<(String, String)> },
}

impl RecordedCall {
    pub fn url(&self) -> &str {
        match self {
            RecordedCall::Json { url, .. }
            | RecordedCall::Form { url, .. }
            | RecordedCall::Get { url, .. } => url,
        }
    }

    /// Value of a form field or query parameter.
    pub fn field(&self, key: &str) -> Option<&str> {
        let pairs = match self {
            RecordedCall::Form { fields, .. } => fields,
            RecordedCall::Get { query, .. } => query,
            RecordedCall::Json { body, .. } => return body.get(key).and_then(Value::as_str),
        };
        pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Transport answering from a queue of scripted responses.
///
/// An exhausted queue behaves like a refused connection.
#[derive(Default)]
pub struct MockTransport {
    responses: Mutex<VecDeque<io::Result<HttpResponse>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, status: u16, body: impl Into<Vec<u8>>) -> Self {
        self.responses.lock().unwrap().push_back(Ok(HttpResponse {
            status,
            body: body.into(),
        }));
        self
    }

    pub fn respond_json(self, body: Value) -> Self {
        self.respond(200, body.to_string())
    }

    pub fn fail(self, message: &str) -> Self {
        let error = io::Error::new(io::ErrorKind::ConnectionRefused, message.to_string());
        self.responses.lock().unwrap().push_back(Err(error));
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    fn next(&self, call: RecordedCall) -> io::Result<HttpResponse> {
        self.calls.lock().unwrap().push(call);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Err(io::Error::new(
                    io::ErrorKind::ConnectionRefused,
                    "no scripted response",
                ))
            })
    }
}

fn owned(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

impl HttpTransport for MockTransport {
    fn post_json(&self, url: &str, body: &Value) -> io::Result<HttpResponse> {
        self.next(RecordedCall::Json {
            url: url.to_string(),
            body: body.clone(),
        })
    }

    fn post_form(&self, url: &str, fields: &[(&str, &str)]) -> io::Result<HttpResponse> {
        self.next(RecordedCall::Form {
            url: url.to_string(),
            fields: owned(fields),
        })
    }

    fn get(&self, url: &str, query: &[(&str, &str)]) -> io::Result<HttpResponse> {
        self.next(RecordedCall::Get {
            url: url.to_string(),
            query: owned(query),
        })
    }
}

/// Build an in-memory zip archive with the given entries, in order.
pub fn zip_bytes(entries: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();
    for (name, content) in entries {
        writer.start_file(*name, options).unwrap();
        writer.write_all(content.as_bytes()).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

/// Typical controller export: configuration first, import helper second.
pub fn export_zip() -> Vec<u8> {
    zip_bytes(&[
        ("main.tf", "resource \"aviatrix_vpc\" \"a\" {}\n"),
        ("import.sh", "terraform import aviatrix_vpc.a a\n"),
    ])
}

pub fn login_ok() -> Value {
    serde_json::json!({ "return": true, "CID": CID })
}
