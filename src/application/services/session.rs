//! Session service
//!
//! Logs in to the controller and produces the session token (CID) used by
//! every later call in the same invocation.

use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, instrument};

use crate::application::services::rpc::body_excerpt;
use crate::application::{ApplicationError, ApplicationResult, IoResultExt};
use crate::domain::{api_url, Credentials, Session, ACTION_KEY, LOGIN_ACTION};
use crate::infrastructure::traits::HttpTransport;

/// Controller answer to a login call.
#[derive(Debug, Deserialize)]
struct LoginReply {
    #[serde(rename = "return", default)]
    success: Option<bool>,
    #[serde(default)]
    reason: Option<String>,
    #[serde(rename = "CID", default)]
    cid: Option<String>,
}

/// Service for authenticating against a controller.
pub struct SessionService {
    http: Arc<dyn HttpTransport>,
}

impl SessionService {
    /// Create a new session service.
    pub fn new(http: Arc<dyn HttpTransport>) -> Self {
        Self { http }
    }

    /// Log in with explicit credentials.
    ///
    /// All three inputs must be non-empty; otherwise this fails with a
    /// config error before anything is sent.
    #[instrument(skip(self, password))]
    pub fn authenticate(
        &self,
        address: &str,
        username: &str,
        password: &str,
    ) -> ApplicationResult<Session> {
        let missing: Vec<&str> = [
            ("controller address", address),
            ("username", username),
            ("password", password),
        ]
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| *name)
        .collect();
        if !missing.is_empty() {
            return Err(ApplicationError::Config {
                message: format!("missing {}", missing.join(", ")),
            });
        }

        let url = api_url(address);
        debug!("authenticate: url={}", url);
        let response = self
            .http
            .post_form(
                &url,
                &[
                    (ACTION_KEY, LOGIN_ACTION),
                    ("username", username),
                    ("password", password),
                ],
            )
            .with_transport_context("login request", &url)?;

        if !response.is_success() {
            return Err(ApplicationError::Auth {
                message: format!(
                    "HTTP {}: {}",
                    response.status,
                    body_excerpt(&response.body)
                ),
            });
        }

        let reply: LoginReply =
            serde_json::from_slice(&response.body).map_err(|e| ApplicationError::Auth {
                message: format!("unreadable login response: {e}"),
            })?;

        if reply.success == Some(false) {
            return Err(ApplicationError::Auth {
                message: reply
                    .reason
                    .unwrap_or_else(|| "controller rejected the login".to_string()),
            });
        }

        let token = reply.cid.unwrap_or_default();
        let session = Session::new(address, token).map_err(|_| ApplicationError::Auth {
            message: "controller returned no CID".to_string(),
        })?;
        debug!("authenticate: session established");
        Ok(session)
    }

    /// Log in with a validated credential set.
    pub fn login(&self, credentials: &Credentials) -> ApplicationResult<Session> {
        self.authenticate(
            &credentials.address,
            &credentials.username,
            &credentials.password,
        )
    }
}
