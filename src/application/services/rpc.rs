//! RPC dispatch service
//!
//! Turns an action plus `key=value` parameters into a controller call and
//! decodes the controller's JSON answer.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::Value;
use tracing::{debug, instrument};

use crate::application::{ApplicationError, ApplicationResult, IoResultExt};
use crate::domain::{RequestEncoding, RpcRequest, Session};
use crate::infrastructure::traits::HttpTransport;

/// Longest body fragment quoted in error messages.
const EXCERPT_LEN: usize = 200;

/// Undecoded reply to a successful (2xx) POST.
#[derive(Debug, Clone)]
pub struct RawReply {
    pub status: u16,
    pub body: Vec<u8>,
    pub latency: Duration,
}

/// Decoded controller reply.
#[derive(Debug, Clone)]
pub struct RpcResponse {
    /// Value of the `return` flag (`true` when the controller omits it)
    pub success: bool,
    pub raw_body: Vec<u8>,
    /// String value of the `Results` key, if any
    pub result_field: Option<String>,
    /// Controller-supplied explanation, usually present on failure
    pub reason: Option<String>,
    /// Wall-clock duration of the HTTP exchange
    pub latency: Duration,
}

impl RpcResponse {
    /// Decode a JSON body. A body that is not JSON is an API error.
    pub fn parse(raw_body: Vec<u8>, latency: Duration) -> ApplicationResult<Self> {
        let value: Value = serde_json::from_slice(&raw_body).map_err(|e| {
            ApplicationError::api(format!(
                "unparseable response body ({e}): {}",
                body_excerpt(&raw_body)
            ))
        })?;

        let success = value.get("return").and_then(Value::as_bool).unwrap_or(true);
        let reason = value
            .get("reason")
            .and_then(Value::as_str)
            .map(str::to_string);
        let result_field = results_field(&value);

        Ok(Self {
            success,
            raw_body,
            result_field,
            reason,
            latency,
        })
    }

    /// Fail with an API error when the controller reported `return: false`.
    pub fn ensure_success(self) -> ApplicationResult<Self> {
        if self.success {
            Ok(self)
        } else {
            Err(ApplicationError::api(self.reason.unwrap_or_else(|| {
                format!("request rejected: {}", body_excerpt(&self.raw_body))
            })))
        }
    }

    /// Re-indent the raw JSON body with two-space indentation.
    pub fn pretty_body(&self) -> ApplicationResult<String> {
        let value: Value =
            serde_json::from_slice(&self.raw_body).map_err(|e| ApplicationError::Encoding {
                message: format!("indenting json data: {e}"),
            })?;
        serde_json::to_string_pretty(&value).map_err(|e| ApplicationError::Encoding {
            message: format!("indenting json data: {e}"),
        })
    }

    /// Raw body as text, replacing invalid UTF-8.
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.raw_body).into_owned()
    }
}

/// `Results` lookup; the key is matched case-insensitively.
fn results_field(value: &Value) -> Option<String> {
    let object = value.as_object()?;
    object
        .get("Results")
        .or_else(|| {
            object
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case("results"))
                .map(|(_, v)| v)
        })
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Shortened, lossy rendering of a body for error messages.
pub(crate) fn body_excerpt(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    let trimmed = text.trim();
    if trimmed.chars().count() > EXCERPT_LEN {
        let cut: String = trimmed.chars().take(EXCERPT_LEN).collect();
        format!("{cut}...")
    } else {
        trimmed.to_string()
    }
}

/// Pretty-printed JSON form of the outgoing payload.
pub fn request_body_pretty(request: &RpcRequest) -> ApplicationResult<String> {
    serde_json::to_string_pretty(&request.payload()).map_err(|e| ApplicationError::Encoding {
        message: format!("marshalling json data: {e}"),
    })
}

/// Service for issuing RPC calls on an established session.
pub struct RpcService {
    http: Arc<dyn HttpTransport>,
}

impl RpcService {
    /// Create a new RPC service.
    pub fn new(http: Arc<dyn HttpTransport>) -> Self {
        Self { http }
    }

    /// Call `action` with raw `key=value` tokens.
    ///
    /// Malformed tokens fail before any request is sent.
    #[instrument(skip(self, session, tokens))]
    pub fn invoke<S: AsRef<str>>(
        &self,
        session: &Session,
        action: &str,
        tokens: &[S],
        encoding: RequestEncoding,
    ) -> ApplicationResult<RpcResponse> {
        let request = RpcRequest::from_args(session, action, tokens)?;
        self.dispatch(session, &request, encoding)
    }

    /// Send a prepared request and decode the JSON answer.
    pub fn dispatch(
        &self,
        session: &Session,
        request: &RpcRequest,
        encoding: RequestEncoding,
    ) -> ApplicationResult<RpcResponse> {
        let reply = self.send(session, request, encoding)?;
        RpcResponse::parse(reply.body, reply.latency)
    }

    /// Send a prepared request without interpreting the body.
    ///
    /// Non-2xx statuses are API errors; connection failures are transport errors.
    pub fn send(
        &self,
        session: &Session,
        request: &RpcRequest,
        encoding: RequestEncoding,
    ) -> ApplicationResult<RawReply> {
        let url = session.api_url();
        let payload = request.payload();
        debug!(
            "send: action={}, encoding={:?}, params={}",
            request.action(),
            encoding,
            request.parameters().len()
        );

        let start = Instant::now();
        let response = match encoding {
            RequestEncoding::Json => {
                let body =
                    serde_json::to_value(&payload).map_err(|e| ApplicationError::Encoding {
                        message: format!("marshalling json data: {e}"),
                    })?;
                self.http.post_json(&url, &body)
            }
            RequestEncoding::Form => {
                let fields: Vec<(&str, &str)> = payload
                    .iter()
                    .map(|(k, v)| (k.as_str(), v.as_str()))
                    .collect();
                self.http.post_form(&url, &fields)
            }
        }
        .with_transport_context("POST", &url)?;
        let latency = start.elapsed();
        debug!(
            "send: status={}, latency={}ms, bytes={}",
            response.status,
            latency.as_millis(),
            response.body.len()
        );

        if !response.is_success() {
            return Err(ApplicationError::Api {
                status: Some(response.status),
                message: body_excerpt(&response.body),
            });
        }

        Ok(RawReply {
            status: response.status,
            body: response.body,
            latency,
        })
    }
}
