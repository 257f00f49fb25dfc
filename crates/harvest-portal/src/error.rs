use thiserror::Error;

#[derive(Debug, Error)]
pub enum PortalError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("not logged in to the portal")]
    NotAuthenticated,

    /// The portal answered a query with something other than 200.
    #[error("unexpected status {status} from {endpoint}: {body}")]
    UnexpectedStatus {
        endpoint: &'static str,
        status: u16,
        body: String,
    },

    #[error("failed to parse {endpoint} response: {reason}")]
    Parse {
        endpoint: &'static str,
        reason: String,
    },
}
