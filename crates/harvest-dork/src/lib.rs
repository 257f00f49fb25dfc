//! # harvest-dork
//!
//! Dork query backends and the aggregator that drives them.
//!
//! Backends:
//! - crt.sh certificate transparency search
//! - Google custom search engine (JSON API)
//! - Google web search (scraped result page)
//! - `DuckDuckGo` HTML search (scraped result page)
//!
//! The [`Aggregator`] turns entity and query lookups into a pull-based
//! [`Enumeration`] of result batches. It talks to the backends through the
//! [`Dispatcher`] trait, implemented for [`DorkClient`].

pub mod aggregate;
pub mod crtsh;
pub mod cse;
pub mod duckduckgo;
pub mod google;

mod error;
mod html;
mod http;

pub use aggregate::{Aggregator, Enumeration, Pacing};
pub use error::DorkError;

use std::future::Future;
use std::time::Duration;

use harvest_config::{DorkConfig, HttpConfig};
use harvest_core::{ResultRecord, Service};

// ── Types ──────────────────────────────────────────────────────────

/// Per-run settings that come from the input stanza and credential store
/// rather than from configuration files.
#[derive(Debug, Clone, Default)]
pub struct DorkSettings {
    /// Custom search engine ID (`cx`).
    pub cse_id: String,
    /// Custom search engine API key.
    pub cse_api_key: String,
    /// Recency window in days. 0 means unbounded.
    pub query_date_range: u32,
    /// Random spread added to the pause after each web search query, in seconds.
    pub google_get_max_wait: u64,
}

/// One (query x entity) pair, ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedQuery {
    pub service: Service,
    /// Domain for crt.sh, rendered query text for every other backend.
    pub text: String,
    pub label: String,
    pub entity: String,
}

/// The seam between the aggregator and the backends.
///
/// Implementations never fail: a backend problem is logged and surfaces as an
/// empty batch so the remaining pairs still run.
pub trait Dispatcher {
    /// Run one prepared query against its backend.
    fn dispatch(&self, query: &PreparedQuery) -> impl Future<Output = Vec<ResultRecord>> + Send;

    /// Wait between paced queries.
    fn pause(&self, delay: Duration) -> impl Future<Output = ()> + Send;
}

// ── Client ─────────────────────────────────────────────────────────

/// HTTP client for every dork backend.
pub struct DorkClient {
    http: reqwest::Client,
    config: DorkConfig,
    settings: DorkSettings,
}

impl DorkClient {
    /// Create a client for one run.
    ///
    /// # Errors
    ///
    /// Returns [`DorkError::Http`] if the underlying `reqwest::Client` fails to
    /// build.
    pub fn new(
        config: DorkConfig,
        http_config: &HttpConfig,
        settings: DorkSettings,
    ) -> Result<Self, DorkError> {
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(http_config.timeout())
            .build()?;
        Ok(Self {
            http,
            config,
            settings,
        })
    }

    /// Build an [`Aggregator`] whose web search pacing matches this client's
    /// configuration.
    #[must_use]
    pub fn aggregator(&self) -> Aggregator<'_, Self> {
        Aggregator::new(
            self,
            Pacing::new(self.config.pacing_floor_secs, self.settings.google_get_max_wait),
        )
    }
}

impl Dispatcher for DorkClient {
    async fn dispatch(&self, query: &PreparedQuery) -> Vec<ResultRecord> {
        let result = match query.service {
            Service::CrtSh => Ok(self
                .query_crt_sh(
                    &query.text,
                    &query.entity,
                    &query.label,
                    self.settings.query_date_range,
                )
                .await),
            Service::GoogleCse => {
                self.query_cse(&query.text, &query.label, &query.entity)
                    .await
            }
            Service::GoogleGet => {
                self.query_google(&query.text, &query.label, &query.entity)
                    .await
            }
            Service::DuckDuckGo => {
                self.query_duckduckgo(&query.text, &query.label, &query.entity)
                    .await
            }
        };

        result.unwrap_or_else(|e| {
            tracing::warn!(
                service = %query.service,
                label = %query.label,
                entity = %query.entity,
                %e,
                "backend query failed"
            );
            Vec::new()
        })
    }

    async fn pause(&self, delay: Duration) {
        tracing::debug!(secs = delay.as_secs(), "pacing web search");
        tokio::time::sleep(delay).await;
    }
}
