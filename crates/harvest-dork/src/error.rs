//! Backend error types.
//!
//! These never cross the [`Dispatcher`](crate::Dispatcher) boundary: the
//! dispatcher logs them and hands the aggregator an empty batch instead.

use thiserror::Error;

/// Errors that can occur while querying a dork backend.
#[derive(Debug, Error)]
pub enum DorkError {
    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// A configured endpoint is not a valid URL.
    #[error("invalid endpoint URL '{url}': {reason}")]
    Endpoint { url: String, reason: String },

    /// Backend returned a non-success status code.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code returned by the backend.
        status: u16,
        /// Error message or response body.
        message: String,
    },
}
