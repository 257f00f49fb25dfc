//! splunkd REST client: credential store and oneshot searches.

use harvest_config::{HostConfig, HttpConfig};
use harvest_core::entities::Row;
use reqwest::Url;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::HostError;

const PASSWORDS_PATH: &str = "/servicesNS/nobody/-/storage/passwords";
const SEARCH_JOBS_PATH: &str = "/services/search/jobs";

// ── Response types ─────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct PasswordsResponse {
    #[serde(default)]
    entry: Vec<PasswordEntry>,
}

#[derive(Debug, Deserialize)]
struct PasswordEntry {
    content: PasswordContent,
}

#[derive(Debug, Deserialize)]
struct PasswordContent {
    #[serde(default)]
    realm: String,
    #[serde(default)]
    clear_password: String,
}

#[derive(Debug, Deserialize)]
struct OneshotResponse {
    #[serde(default)]
    preview: bool,
    #[serde(default)]
    messages: Vec<SearchMessage>,
    #[serde(default)]
    results: Vec<Map<String, Value>>,
}

#[derive(Debug, Deserialize)]
struct SearchMessage {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    text: String,
}

// ── Client ─────────────────────────────────────────────────────────

/// Session-key authenticated client for the host's management port.
pub struct HostService {
    http: reqwest::Client,
    base: String,
    session_key: String,
}

impl HostService {
    /// Create a client for `server_uri`, unless configuration overrides it.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::Http`] if the `reqwest::Client` fails to build.
    pub fn new(
        server_uri: &str,
        session_key: impl Into<String>,
        host_config: &HostConfig,
        http_config: &HttpConfig,
    ) -> Result<Self, HostError> {
        let http = reqwest::Client::builder()
            .timeout(http_config.timeout())
            .danger_accept_invalid_certs(!host_config.verify_tls)
            .build()?;
        Ok(Self {
            http,
            base: host_config
                .resolve_server_uri(server_uri)
                .trim_end_matches('/')
                .to_string(),
            session_key: session_key.into(),
        })
    }

    fn url(&self, path: &str, params: &[(&str, &str)]) -> Result<Url, HostError> {
        let raw = format!("{}{path}", self.base);
        Url::parse_with_params(&raw, params).map_err(|e| HostError::Endpoint {
            url: raw,
            reason: e.to_string(),
        })
    }

    fn authorization(&self) -> String {
        format!("Splunk {}", self.session_key)
    }

    /// The clear-text password of the first stored credential in `realm`.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::Api`] for a non-success status,
    /// [`HostError::Parse`] for an unexpected body and [`HostError::Http`] on
    /// transport failure.
    pub async fn find_password(&self, realm: &str) -> Result<Option<String>, HostError> {
        let url = self.url(PASSWORDS_PATH, &[("output_mode", "json"), ("count", "0")])?;
        let resp = self
            .http
            .get(url)
            .header("Authorization", self.authorization())
            .send()
            .await?;
        let body = check_status(resp).await?;
        let passwords: PasswordsResponse =
            serde_json::from_str(&body).map_err(|e| HostError::Parse(e.to_string()))?;

        let found = passwords
            .entry
            .into_iter()
            .find(|entry| entry.content.realm == realm)
            .map(|entry| entry.content.clear_password);
        tracing::debug!(realm, found = found.is_some(), "credential lookup");
        Ok(found)
    }

    /// Like [`find_password`](Self::find_password), but a missing credential
    /// is an error.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::MissingCredential`] when no entry matches, plus the
    /// errors of [`find_password`](Self::find_password).
    pub async fn require_password(&self, realm: &str) -> Result<String, HostError> {
        self.find_password(realm)
            .await?
            .ok_or_else(|| HostError::MissingCredential {
                realm: realm.to_string(),
            })
    }

    /// Run a blocking oneshot search and return its result rows.
    ///
    /// Diagnostic messages are logged. Multivalue fields are joined with
    /// newlines.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::PreviewResults`] if the host returned preview
    /// results, [`HostError::Api`] for a non-success status,
    /// [`HostError::Parse`] for an unexpected body and [`HostError::Http`] on
    /// transport failure.
    pub async fn oneshot(&self, search: &str) -> Result<Vec<Row>, HostError> {
        let url = self.url(SEARCH_JOBS_PATH, &[])?;
        let form = [
            ("search", search),
            ("exec_mode", "oneshot"),
            ("output_mode", "json"),
            ("count", "0"),
        ];
        tracing::debug!(search, "running oneshot search");

        let resp = self
            .http
            .post(url)
            .header("Authorization", self.authorization())
            .form(&form)
            .send()
            .await?;
        let body = check_status(resp).await?;
        let response: OneshotResponse =
            serde_json::from_str(&body).map_err(|e| HostError::Parse(e.to_string()))?;

        for message in &response.messages {
            tracing::info!(kind = %message.kind, "{}", message.text);
        }
        if response.preview {
            return Err(HostError::PreviewResults {
                search: search.to_string(),
            });
        }

        Ok(response.results.into_iter().map(flatten_row).collect())
    }

    /// All rows of a lookup table.
    ///
    /// # Errors
    ///
    /// See [`oneshot`](Self::oneshot).
    pub async fn lookup_rows(&self, lookup: &str) -> Result<Vec<Row>, HostError> {
        self.oneshot(&format!("| inputlookup {lookup}")).await
    }
}

async fn check_status(resp: reqwest::Response) -> Result<String, HostError> {
    let status = resp.status();
    let body = resp.text().await?;
    if !status.is_success() {
        return Err(HostError::Api {
            status: status.as_u16(),
            message: body,
        });
    }
    Ok(body)
}

fn flatten_row(result: Map<String, Value>) -> Row {
    result
        .into_iter()
        .map(|(field, value)| {
            let text = match value {
                Value::String(s) => s,
                Value::Array(items) => items
                    .iter()
                    .map(|v| v.as_str().map_or_else(|| v.to_string(), str::to_string))
                    .collect::<Vec<_>>()
                    .join("\n"),
                Value::Null => String::new(),
                other => other.to_string(),
            };
            (field, text)
        })
        .collect()
}
