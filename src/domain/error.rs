//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Domain errors represent malformed requests or violated entity invariants.
/// These are detected before anything touches the network.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("invalid format for API params, expected 'key=value', got {0:?}")]
    MalformedParameter(String),

    #[error("parameter {0:?} collides with a reserved request field")]
    ReservedParameter(String),

    #[error("action must not be empty")]
    EmptyAction,

    #[error("resource name must not be empty")]
    EmptyResource,

    #[error("session token must not be empty")]
    EmptyToken,

    #[error("export artifact contains no entries")]
    EmptyArtifact,

    #[error("unknown export protocol: {0} (expected two-step-download or direct-form-export)")]
    UnknownProtocol(String),
}
