//! Host shim error types.

use thiserror::Error;

/// Errors raised while talking to the host platform.
#[derive(Debug, Error)]
pub enum HostError {
    /// Malformed XML on stdin, or a value that cannot be rendered as XML.
    #[error("XML error: {0}")]
    Xml(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid host URL '{url}': {reason}")]
    Endpoint { url: String, reason: String },

    /// splunkd answered with a non-success status.
    #[error("host API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("failed to parse host response: {0}")]
    Parse(String),

    #[error("no credential stored for realm '{realm}'")]
    MissingCredential { realm: String },

    #[error("search returned preview results: {search}")]
    PreviewResults { search: String },

    #[error("parameter '{name}' {reason}")]
    InvalidParameter { name: String, reason: String },

    /// The input itself failed while validating or streaming.
    #[error("{0}")]
    Input(Box<dyn std::error::Error + Send + Sync>),
}
