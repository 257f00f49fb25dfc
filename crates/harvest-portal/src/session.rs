//! Authenticated portal session.

use harvest_config::{HttpConfig, PortalConfig};
use reqwest::{Method, RequestBuilder};
use serde::{Deserialize, Serialize};

use crate::error::PortalError;

const LOGIN_PATH: &str = "/auth/user";
const TOKEN_HEADER: &str = "X-Access-Token";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
    /// The portal expects the literal string, not JSON null.
    captcha_key: &'static str,
}

#[derive(Deserialize)]
struct LoginResponse {
    csrf: Option<String>,
}

/// One portal session: HTTP client, base URLs and the CSRF token once logged in.
pub struct PortalSession {
    http: reqwest::Client,
    gateway: String,
    portal: String,
    token: Option<String>,
}

impl PortalSession {
    /// Create an unauthenticated session.
    ///
    /// # Errors
    ///
    /// Returns [`PortalError::Http`] if the `reqwest::Client` fails to build.
    pub fn new(config: &PortalConfig, http_config: &HttpConfig) -> Result<Self, PortalError> {
        let http = reqwest::Client::builder()
            .timeout(http_config.timeout())
            .danger_accept_invalid_certs(!config.verify_tls)
            .build()?;
        Ok(Self {
            http,
            gateway: config.gateway_base(),
            portal: config.portal_base(),
            token: None,
        })
    }

    #[must_use]
    pub fn gateway_base(&self) -> &str {
        &self.gateway
    }

    #[must_use]
    pub fn portal_base(&self) -> &str {
        &self.portal
    }

    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Post credentials and keep the CSRF token on success.
    ///
    /// Returns `false` for any non-200 answer, a transport failure or a
    /// response without a token. Nothing is retried.
    pub async fn login(&mut self, username: &str, password: &str) -> bool {
        let url = format!("{}{LOGIN_PATH}", self.gateway);
        let body = LoginRequest {
            email: username,
            password,
            captcha_key: "null",
        };

        let resp = match self.http.post(&url).json(&body).send().await {
            Ok(resp) => resp,
            Err(e) => {
                tracing::warn!(%url, %e, "login request failed");
                return false;
            }
        };
        tracing::info!(status = resp.status().as_u16(), "login answered");
        if resp.status() != reqwest::StatusCode::OK {
            return false;
        }

        match resp.json::<LoginResponse>().await {
            Ok(LoginResponse { csrf: Some(token) }) if !token.is_empty() => {
                self.token = Some(token);
                true
            }
            Ok(_) => {
                tracing::warn!("login response carried no csrf token");
                false
            }
            Err(e) => {
                tracing::warn!(%e, "failed to parse login response");
                false
            }
        }
    }

    /// Start an authenticated request to `url`.
    pub(crate) fn request(&self, method: Method, url: &str) -> Result<RequestBuilder, PortalError> {
        let token = self.token.as_deref().ok_or(PortalError::NotAuthenticated)?;
        Ok(self.http.request(method, url).header(TOKEN_HEADER, token))
    }
}
