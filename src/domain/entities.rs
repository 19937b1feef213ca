//! Domain entities: core data structures

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// Request field carrying the action name.
pub const ACTION_KEY: &str = "action";

/// Request field carrying the session token.
pub const TOKEN_KEY: &str = "CID";

/// Action used to obtain a session token.
pub const LOGIN_ACTION: &str = "login";

/// Local file header signature that opens every zip archive.
const ZIP_SIGNATURE: &[u8] = b"PK\x03\x04";

/// Controller login credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Controller host or IP, optionally with an `http://`/`https://` scheme
    pub address: String,
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("address", &self.address)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Authenticated session against one controller.
///
/// Created once per invocation and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    controller_address: String,
    token: String,
}

impl Session {
    /// Create a session. The token must not be empty.
    pub fn new(
        controller_address: impl Into<String>,
        token: impl Into<String>,
    ) -> Result<Self, DomainError> {
        let token = token.into();
        if token.is_empty() {
            return Err(DomainError::EmptyToken);
        }
        Ok(Self {
            controller_address: controller_address.into(),
            token,
        })
    }

    pub fn controller_address(&self) -> &str {
        &self.controller_address
    }

    /// Session token (CID) attached to every call.
    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn api_url(&self) -> String {
        api_url(&self.controller_address)
    }

    pub fn download_url(&self) -> String {
        download_url(&self.controller_address)
    }
}

/// Base URL for a controller address.
///
/// Bare hosts get `https://`; an address that already names a scheme is kept.
pub fn base_url(address: &str) -> String {
    let trimmed = address.trim().trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    }
}

/// Endpoint accepting all RPC actions, including login.
pub fn api_url(address: &str) -> String {
    format!("{}/v1/api", base_url(address))
}

/// Endpoint serving files generated by the controller.
pub fn download_url(address: &str) -> String {
    format!("{}/v1/download", base_url(address))
}

/// Split a `key=value` token on the first `=`.
///
/// The value keeps everything after the first separator, so `a=b=c`
/// yields `("a", "b=c")`. A token without `=` or with an empty key is rejected.
pub fn parse_parameter(token: &str) -> Result<(String, String), DomainError> {
    match token.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(DomainError::MalformedParameter(token.to_string())),
    }
}

/// Parse a list of `key=value` tokens into a parameter map.
///
/// Later duplicates replace earlier ones.
pub fn parse_parameters<S: AsRef<str>>(
    tokens: &[S],
) -> Result<BTreeMap<String, String>, DomainError> {
    let mut parameters = BTreeMap::new();
    for token in tokens {
        let (key, value) = parse_parameter(token.as_ref())?;
        parameters.insert(key, value);
    }
    Ok(parameters)
}

/// Wire encoding of an outgoing request body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestEncoding {
    /// JSON object body
    #[default]
    Json,
    /// `application/x-www-form-urlencoded` body
    Form,
}

/// A single RPC call: one action, the session token, and caller parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpcRequest {
    action: String,
    token: String,
    parameters: BTreeMap<String, String>,
}

impl RpcRequest {
    /// Build a request for the given session.
    ///
    /// Caller parameters may not reuse the `action` or `CID` field names.
    pub fn new(
        session: &Session,
        action: impl Into<String>,
        parameters: BTreeMap<String, String>,
    ) -> Result<Self, DomainError> {
        let action = action.into();
        if action.is_empty() {
            return Err(DomainError::EmptyAction);
        }
        if let Some(key) = parameters
            .keys()
            .find(|k| k.as_str() == ACTION_KEY || k.as_str() == TOKEN_KEY)
        {
            return Err(DomainError::ReservedParameter(key.clone()));
        }
        Ok(Self {
            action,
            token: session.token().to_string(),
            parameters,
        })
    }

    /// Build a request from raw `key=value` command-line tokens.
    pub fn from_args<S: AsRef<str>>(
        session: &Session,
        action: impl Into<String>,
        tokens: &[S],
    ) -> Result<Self, DomainError> {
        let parameters = parse_parameters(tokens)?;
        Self::new(session, action, parameters)
    }

    pub fn action(&self) -> &str {
        &self.action
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn parameters(&self) -> &BTreeMap<String, String> {
        &self.parameters
    }

    /// Complete set of wire fields: action, token, then caller parameters.
    pub fn payload(&self) -> BTreeMap<String, String> {
        let mut payload = self.parameters.clone();
        payload.insert(ACTION_KEY.to_string(), self.action.clone());
        payload.insert(TOKEN_KEY.to_string(), self.token.clone());
        payload
    }
}

/// Wire format used by the controller for Terraform export.
///
/// Controllers changed the export handshake over time; both forms are kept
/// behind this one switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExportProtocol {
    /// JSON `run_export_terraform` call returning a file handle, then a download
    TwoStepDownload,
    /// Form-encoded `export_terraform_resource` call answering with the archive
    /// itself (or with a file handle on controllers that still stage it)
    #[default]
    DirectFormExport,
}

impl ExportProtocol {
    /// Action name for the export-generation call.
    pub fn action(&self) -> &'static str {
        match self {
            ExportProtocol::TwoStepDownload => "run_export_terraform",
            ExportProtocol::DirectFormExport => "export_terraform_resource",
        }
    }

    pub fn encoding(&self) -> RequestEncoding {
        match self {
            ExportProtocol::TwoStepDownload => RequestEncoding::Json,
            ExportProtocol::DirectFormExport => RequestEncoding::Form,
        }
    }

    /// Build the export-generation request for `resource`.
    pub fn request(
        &self,
        session: &Session,
        resource: &str,
        options: &ExportOptions,
    ) -> Result<RpcRequest, DomainError> {
        if resource.is_empty() {
            return Err(DomainError::EmptyResource);
        }
        let mut parameters = BTreeMap::new();
        parameters.insert("resource".to_string(), resource.to_string());
        parameters.insert(
            "manage_attachments_internally".to_string(),
            options.manage_attachments_internally.to_string(),
        );
        if *self == ExportProtocol::TwoStepDownload {
            parameters.insert("operation".to_string(), "export_tf".to_string());
        }
        RpcRequest::new(session, self.action(), parameters)
    }
}

impl fmt::Display for ExportProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportProtocol::TwoStepDownload => write!(f, "two-step-download"),
            ExportProtocol::DirectFormExport => write!(f, "direct-form-export"),
        }
    }
}

impl FromStr for ExportProtocol {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "two-step-download" => Ok(ExportProtocol::TwoStepDownload),
            "direct-form-export" => Ok(ExportProtocol::DirectFormExport),
            _ => Err(DomainError::UnknownProtocol(s.to_string())),
        }
    }
}

/// Caller choices for one export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExportOptions {
    /// Let the controller manage attachments inside the exported resource
    pub manage_attachments_internally: bool,
    /// Keep archive entries after the first (e.g. the import helper script)
    pub include_auxiliary_file: bool,
}

/// One file unpacked from an export archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Relative name as stored in the archive
    pub name: String,
    pub content: Vec<u8>,
}

/// Retained contents of an export archive, in archive order.
///
/// The first entry is the primary configuration file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    entries: Vec<ArchiveEntry>,
}

impl ExportArtifact {
    pub fn new(entries: Vec<ArchiveEntry>) -> Result<Self, DomainError> {
        if entries.is_empty() {
            return Err(DomainError::EmptyArtifact);
        }
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[ArchiveEntry] {
        &self.entries
    }

    pub fn primary(&self) -> &ArchiveEntry {
        &self.entries[0]
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Whether a response body is a zip archive rather than a JSON document.
pub fn looks_like_zip(body: &[u8]) -> bool {
    body.starts_with(ZIP_SIGNATURE)
}

/// Expand environment variables in a path string.
///
/// Supports:
/// - `$VAR` syntax
/// - `${VAR}` syntax
/// - `~` for home directory
///
/// Uses shellexpand crate for robust expansion.
pub fn expand_env_vars(path: &str) -> String {
    shellexpand::full(path)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| path.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        Session::new("10.0.0.1", "abc123").unwrap()
    }

    #[test]
    fn given_empty_token_when_creating_session_then_rejects() {
        assert_eq!(Session::new("10.0.0.1", ""), Err(DomainError::EmptyToken));
    }

    #[test]
    fn given_bare_host_when_building_urls_then_uses_https() {
        let session = session();
        assert_eq!(session.api_url(), "https://10.0.0.1/v1/api");
        assert_eq!(session.download_url(), "https://10.0.0.1/v1/download");
    }

    #[test]
    fn given_address_with_scheme_when_building_url_then_keeps_scheme() {
        assert_eq!(base_url("http://127.0.0.1:8080/"), "http://127.0.0.1:8080");
        assert_eq!(base_url("https://ctrl.example.com"), "https://ctrl.example.com");
    }

    #[test]
    fn given_value_with_equals_when_parsing_then_keeps_remainder() {
        let (key, value) = parse_parameter("filter=a=b").unwrap();
        assert_eq!(key, "filter");
        assert_eq!(value, "a=b");
    }

    #[test]
    fn given_empty_value_when_parsing_then_accepts() {
        assert_eq!(
            parse_parameter("note=").unwrap(),
            ("note".to_string(), String::new())
        );
    }

    #[test]
    fn given_reserved_key_when_building_request_then_rejects() {
        let err = RpcRequest::from_args(&session(), "list_vpcs", &["CID=other"]).unwrap_err();
        assert_eq!(err, DomainError::ReservedParameter("CID".to_string()));

        let err = RpcRequest::from_args(&session(), "list_vpcs", &["action=other"]).unwrap_err();
        assert_eq!(err, DomainError::ReservedParameter("action".to_string()));
    }

    #[test]
    fn given_empty_action_when_building_request_then_rejects() {
        let tokens: [&str; 0] = [];
        assert_eq!(
            RpcRequest::from_args(&session(), "", &tokens),
            Err(DomainError::EmptyAction)
        );
    }

    #[test]
    fn given_duplicate_keys_when_parsing_then_last_wins() {
        let params = parse_parameters(&["region=a", "region=b"]).unwrap();
        assert_eq!(params.len(), 1);
        assert_eq!(params["region"], "b");
    }

    #[test]
    fn given_protocol_names_when_parsing_then_accepts_both_spellings() {
        assert_eq!(
            "two_step_download".parse::<ExportProtocol>().unwrap(),
            ExportProtocol::TwoStepDownload
        );
        assert_eq!(
            "Direct-Form-Export".parse::<ExportProtocol>().unwrap(),
            ExportProtocol::DirectFormExport
        );
        assert!("ftp".parse::<ExportProtocol>().is_err());
    }

    #[test]
    fn given_two_step_protocol_when_building_request_then_adds_operation() {
        let request = ExportProtocol::TwoStepDownload
            .request(&session(), "my_vpc", &ExportOptions::default())
            .unwrap();
        let payload = request.payload();
        assert_eq!(payload["action"], "run_export_terraform");
        assert_eq!(payload["operation"], "export_tf");
        assert_eq!(payload["manage_attachments_internally"], "false");
        assert_eq!(payload["resource"], "my_vpc");
        assert_eq!(payload["CID"], "abc123");
    }

    #[test]
    fn given_direct_protocol_when_building_request_then_has_no_operation() {
        let options = ExportOptions {
            manage_attachments_internally: true,
            include_auxiliary_file: false,
        };
        let request = ExportProtocol::DirectFormExport
            .request(&session(), "aviatrix_vpc", &options)
            .unwrap();
        let payload = request.payload();
        assert_eq!(payload["action"], "export_terraform_resource");
        assert_eq!(payload["manage_attachments_internally"], "true");
        assert!(!payload.contains_key("operation"));
    }

    #[test]
    fn given_empty_entries_when_creating_artifact_then_rejects() {
        assert_eq!(ExportArtifact::new(vec![]), Err(DomainError::EmptyArtifact));
    }

    #[test]
    fn given_zip_header_when_sniffing_then_detects_archive() {
        assert!(looks_like_zip(b"PK\x03\x04rest"));
        assert!(!looks_like_zip(br#"{"return":true}"#));
    }

    #[test]
    fn given_credentials_when_debug_printing_then_password_is_redacted() {
        let creds = Credentials {
            address: "10.0.0.1".into(),
            username: "admin".into(),
            password: "hunter2".into(),
        };
        let rendered = format!("{creds:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("<redacted>"));
    }
}
