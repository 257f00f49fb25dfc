//! Dork connector configuration: backend endpoints, retry bounds and pacing.

use serde::{Deserialize, Serialize};

use crate::ConfigError;

fn default_crtsh_url() -> String {
    String::from("https://crt.sh/")
}

fn default_cse_url() -> String {
    String::from("https://customsearch.googleapis.com")
}

fn default_google_url() -> String {
    String::from("https://www.google.com")
}

fn default_duckduckgo_url() -> String {
    String::from("https://html.duckduckgo.com")
}

fn default_user_agent() -> String {
    String::from(
        "Mozilla/5.0 (X11; Linux x86_64; rv:128.0) Gecko/20100101 Firefox/128.0",
    )
}

fn default_secret_realm() -> String {
    String::from("ta_for_dorks_realm")
}

const fn default_max_results() -> usize {
    20
}

const fn default_attempts() -> u32 {
    5
}

const fn default_retry_min_secs() -> u64 {
    3
}

const fn default_retry_max_secs() -> u64 {
    8
}

const fn default_pacing_floor_secs() -> u64 {
    3
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DorkConfig {
    /// crt.sh base URL.
    #[serde(default = "default_crtsh_url")]
    pub crtsh_url: String,

    /// Custom search engine API base URL (`/customsearch/v1` is appended).
    #[serde(default = "default_cse_url")]
    pub cse_url: String,

    /// Google web search base URL (`/search` is appended).
    #[serde(default = "default_google_url")]
    pub google_url: String,

    /// `DuckDuckGo` HTML endpoint base URL (`/html/` is appended).
    #[serde(default = "default_duckduckgo_url")]
    pub duckduckgo_url: String,

    /// User agent for scraped web search requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Result cap for scraped web search backends.
    #[serde(default = "default_max_results")]
    pub max_results: usize,

    /// crt.sh request attempts before giving up on a domain.
    #[serde(default = "default_attempts")]
    pub crtsh_attempts: u32,

    /// Lower bound of the random pause between retried requests, in seconds.
    #[serde(default = "default_retry_min_secs")]
    pub retry_min_secs: u64,

    /// Upper bound (inclusive) of the random pause between retried requests.
    #[serde(default = "default_retry_max_secs")]
    pub retry_max_secs: u64,

    /// Google scrape attempts while the engine answers 429 or 5xx.
    #[serde(default = "default_attempts")]
    pub google_attempts: u32,

    /// Floor of the pause after each web search query, in seconds. The input's
    /// `google_get_max_wait` is added on top as the random spread.
    #[serde(default = "default_pacing_floor_secs")]
    pub pacing_floor_secs: u64,

    /// Credential store realm holding the custom search engine API key.
    #[serde(default = "default_secret_realm")]
    pub secret_realm: String,

    /// Dotted path promoted to the event time. Empty disables promotion.
    #[serde(default)]
    pub event_time_field: String,
}

impl Default for DorkConfig {
    fn default() -> Self {
        Self {
            crtsh_url: default_crtsh_url(),
            cse_url: default_cse_url(),
            google_url: default_google_url(),
            duckduckgo_url: default_duckduckgo_url(),
            user_agent: default_user_agent(),
            max_results: default_max_results(),
            crtsh_attempts: default_attempts(),
            retry_min_secs: default_retry_min_secs(),
            retry_max_secs: default_retry_max_secs(),
            google_attempts: default_attempts(),
            pacing_floor_secs: default_pacing_floor_secs(),
            secret_realm: default_secret_realm(),
            event_time_field: String::new(),
        }
    }
}

impl DorkConfig {
    /// Reject settings the backends cannot run with.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for zero attempts, a zero result
    /// cap, or an inverted retry window.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.crtsh_attempts == 0 {
            return Err(invalid("dork.crtsh_attempts", "must be at least 1"));
        }
        if self.google_attempts == 0 {
            return Err(invalid("dork.google_attempts", "must be at least 1"));
        }
        if self.max_results == 0 {
            return Err(invalid("dork.max_results", "must be at least 1"));
        }
        if self.retry_min_secs > self.retry_max_secs {
            return Err(invalid(
                "dork.retry_min_secs",
                "must not exceed dork.retry_max_secs",
            ));
        }
        Ok(())
    }

    /// The configured event time path, if promotion is enabled.
    #[must_use]
    pub fn event_time_path(&self) -> Option<&str> {
        Some(self.event_time_field.as_str()).filter(|p| !p.is_empty())
    }
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}
