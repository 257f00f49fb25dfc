//! Shared HTTP helpers for the dork backends.
//!
//! Centralizes URL construction, status checks and randomized retry delays so
//! the backend modules stay focused on request shape and response mapping.

use std::time::Duration;

use rand::Rng;
use reqwest::{StatusCode, Url};

use crate::error::DorkError;

/// Join `base` and `path` and append `params` as an encoded query string.
///
/// # Errors
///
/// Returns [`DorkError::Endpoint`] if the joined URL does not parse.
pub fn endpoint(base: &str, path: &str, params: &[(&str, &str)]) -> Result<Url, DorkError> {
    let raw = format!("{}{path}", base.trim_end_matches('/'));
    let raw = if raw.is_empty() { String::from("/") } else { raw };
    Url::parse_with_params(&raw, params).map_err(|e| DorkError::Endpoint {
        url: raw,
        reason: e.to_string(),
    })
}

/// Check an HTTP response for a non-success status.
///
/// Returns the response unchanged on success, otherwise
/// [`DorkError::Api`] carrying the status code and response body.
pub async fn check_response(resp: reqwest::Response) -> Result<reqwest::Response, DorkError> {
    if !resp.status().is_success() {
        return Err(DorkError::Api {
            status: resp.status().as_u16(),
            message: resp.text().await.unwrap_or_default(),
        });
    }
    Ok(resp)
}

/// Whether a scraping request should be retried after this status.
#[must_use]
pub fn is_retryable(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

/// A uniformly random whole-second delay in `min_secs..=max_secs`.
#[must_use]
pub fn random_delay(min_secs: u64, max_secs: u64) -> Duration {
    let secs = if min_secs >= max_secs {
        min_secs
    } else {
        rand::thread_rng().gen_range(min_secs..=max_secs)
    };
    Duration::from_secs(secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mock_response(status: u16, body: &'static str) -> reqwest::Response {
        reqwest::Response::from(
            ::http::Response::builder()
                .status(status)
                .body(body)
                .unwrap(),
        )
    }

    #[test]
    fn endpoint_encodes_params() {
        let url = endpoint(
            "https://crt.sh/",
            "",
            &[("q", "%.acme.com"), ("output", "json")],
        )
        .unwrap();
        assert_eq!(url.as_str(), "https://crt.sh/?q=%25.acme.com&output=json");
    }

    #[test]
    fn endpoint_joins_paths_without_double_slash() {
        let url = endpoint("http://127.0.0.1:8080/", "/customsearch/v1", &[]).unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:8080/customsearch/v1");
    }

    #[test]
    fn endpoint_rejects_garbage() {
        let err = endpoint("not a url", "/search", &[]).unwrap_err();
        assert!(matches!(err, DorkError::Endpoint { .. }));
    }

    #[test]
    fn retryable_statuses() {
        assert!(is_retryable(StatusCode::TOO_MANY_REQUESTS));
        assert!(is_retryable(StatusCode::SERVICE_UNAVAILABLE));
        assert!(!is_retryable(StatusCode::FORBIDDEN));
        assert!(!is_retryable(StatusCode::OK));
    }

    #[test]
    fn random_delay_stays_in_window() {
        for _ in 0..200 {
            let delay = random_delay(3, 8);
            assert!((3..=8).contains(&delay.as_secs()));
        }
        assert_eq!(random_delay(0, 0), Duration::ZERO);
        assert_eq!(random_delay(5, 2), Duration::from_secs(5));
    }

    #[tokio::test]
    async fn check_response_api_error_keeps_body() {
        let err = check_response(mock_response(403, "blocked")).await.unwrap_err();
        assert!(matches!(
            err,
            DorkError::Api { status: 403, ref message } if message == "blocked"
        ));
    }

    #[tokio::test]
    async fn check_response_success() {
        assert!(check_response(mock_response(200, "")).await.is_ok());
    }
}
