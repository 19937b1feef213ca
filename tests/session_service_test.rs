//! Tests for SessionService

mod common;

use std::sync::Arc;

use rstest::rstest;
use serde_json::json;

use avx::application::services::SessionService;
use avx::application::ApplicationError;
use avx::cli::CliError;
use avx::domain::Credentials;

use common::{login_ok, MockTransport, RecordedCall, CID, CONTROLLER};

fn service(transport: &Arc<MockTransport>) -> SessionService {
    SessionService::new(transport.clone())
}

#[test]
fn given_valid_credentials_when_authenticate_then_returns_session_token() {
    // Arrange
    let transport = Arc::new(MockTransport::new().respond_json(login_ok()));

    // Act
    let session = service(&transport)
        .authenticate(CONTROLLER, "admin", "secret")
        .unwrap();

    // Assert
    assert_eq!(session.token(), CID);
    assert_eq!(session.controller_address(), CONTROLLER);
}

#[test]
fn given_valid_credentials_when_authenticate_then_posts_login_form() {
    let transport = Arc::new(MockTransport::new().respond_json(login_ok()));

    service(&transport)
        .authenticate(CONTROLLER, "admin", "secret")
        .unwrap();

    let calls = transport.calls();
    assert_eq!(calls.len(), 1);
    assert!(matches!(calls[0], RecordedCall::Form { .. }));
    assert_eq!(calls[0].url(), "https://10.0.0.10/v1/api");
    assert_eq!(calls[0].field("action"), Some("login"));
    assert_eq!(calls[0].field("username"), Some("admin"));
    assert_eq!(calls[0].field("password"), Some("secret"));
}

#[test]
fn given_rejected_login_when_authenticate_then_auth_error_with_reason() {
    let reply = json!({ "return": false, "reason": "Invalid password" });
    let transport = Arc::new(MockTransport::new().respond_json(reply));

    let err = service(&transport)
        .authenticate(CONTROLLER, "admin", "wrong")
        .unwrap_err();

    match err {
        ApplicationError::Auth { message } => assert_eq!(message, "Invalid password"),
        other => panic!("expected auth error, got {other:?}"),
    }
}

#[rstest]
#[case("", "admin", "secret")]
#[case(CONTROLLER, "", "secret")]
#[case(CONTROLLER, "admin", "")]
#[case(CONTROLLER, "  ", "secret")]
fn given_missing_input_when_authenticate_then_config_error_without_request(
    #[case] address: &str,
    #[case] username: &str,
    #[case] password: &str,
) {
    let transport = Arc::new(MockTransport::new().respond_json(login_ok()));

    let err = service(&transport)
        .authenticate(address, username, password)
        .unwrap_err();

    assert!(matches!(err, ApplicationError::Config { .. }));
    assert!(transport.calls().is_empty());
}

#[rstest]
#[case(json!({ "return": true }))]
#[case(json!({ "return": true, "CID": "" }))]
fn given_reply_without_cid_when_authenticate_then_auth_error(#[case] reply: serde_json::Value) {
    let transport = Arc::new(MockTransport::new().respond_json(reply));

    let err = service(&transport)
        .authenticate(CONTROLLER, "admin", "secret")
        .unwrap_err();

    assert!(matches!(err, ApplicationError::Auth { .. }));
}

#[test]
fn given_server_error_when_authenticate_then_auth_error_names_status() {
    let transport = Arc::new(MockTransport::new().respond(503, "maintenance"));

    let err = service(&transport)
        .authenticate(CONTROLLER, "admin", "secret")
        .unwrap_err();

    let message = err.to_string();
    assert!(message.contains("503"), "{message}");
    assert!(message.contains("maintenance"), "{message}");
}

#[test]
fn given_html_reply_when_authenticate_then_auth_error() {
    let transport = Arc::new(MockTransport::new().respond(200, "<html>login</html>"));

    let err = service(&transport)
        .authenticate(CONTROLLER, "admin", "secret")
        .unwrap_err();

    assert!(matches!(err, ApplicationError::Auth { .. }));
}

#[test]
fn given_unreachable_controller_when_authenticate_then_transport_error() {
    let transport = Arc::new(MockTransport::new().fail("connection refused"));

    let err = service(&transport)
        .authenticate(CONTROLLER, "admin", "secret")
        .unwrap_err();

    assert!(matches!(err, ApplicationError::Transport { .. }));
}

#[test]
fn given_unreachable_controller_when_rendering_error_then_message_keeps_cause() {
    let transport = Arc::new(MockTransport::new().fail("connection refused"));

    let err = service(&transport)
        .authenticate(CONTROLLER, "admin", "secret")
        .unwrap_err();
    let rendered = CliError::from(err).to_string();

    assert_eq!(
        rendered,
        "transport error: login request: https://10.0.0.10/v1/api: connection refused"
    );
}

#[test]
fn given_http_scheme_when_authenticate_then_keeps_scheme() {
    let transport = Arc::new(MockTransport::new().respond_json(login_ok()));

    let credentials = Credentials {
        address: "http://localhost:8080/".to_string(),
        username: "admin".to_string(),
        password: "secret".to_string(),
    };
    let session = service(&transport).login(&credentials).unwrap();

    assert_eq!(transport.calls()[0].url(), "http://localhost:8080/v1/api");
    assert_eq!(session.api_url(), "http://localhost:8080/v1/api");
}
