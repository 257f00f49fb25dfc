//! Google custom search engine backend (JSON API).
//!
//! API: `GET /customsearch/v1?cx=..&key=..&q=..`. No retry; an error status is
//! logged and the body is still inspected for `items`.

use harvest_core::{CustomSearchItem, CustomSearchRecord, RecordMetadata, ResultRecord, Retrieved};
use serde::Deserialize;

use crate::DorkClient;
use crate::error::DorkError;
use crate::http::endpoint;

const CSE_PATH: &str = "/customsearch/v1";

// ── Response types ─────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct CseResponse {
    items: Option<Vec<CustomSearchItem>>,
    #[serde(default)]
    queries: CseQueries,
}

#[derive(Debug, Default, Deserialize)]
struct CseQueries {
    #[serde(default)]
    request: Vec<CseRequestInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CseRequestInfo {
    total_results: Option<String>,
}

// ── Client ─────────────────────────────────────────────────────────

impl DorkClient {
    /// Run one rendered query against the custom search engine.
    ///
    /// # Errors
    ///
    /// Returns [`DorkError::Endpoint`] if the configured base URL is invalid,
    /// [`DorkError::Http`] on transport failure.
    pub async fn query_cse(
        &self,
        formatted_query: &str,
        label: &str,
        entity: &str,
    ) -> Result<Vec<ResultRecord>, DorkError> {
        let date_restrict = format!("d{}", self.settings.query_date_range);
        let mut params = vec![
            ("cx", self.settings.cse_id.as_str()),
            ("key", self.settings.cse_api_key.as_str()),
            ("q", formatted_query),
            ("safe", "off"),
            ("sort", "date"),
        ];
        if self.settings.query_date_range > 0 {
            params.push(("dateRestrict", date_restrict.as_str()));
        }
        let url = endpoint(&self.config.cse_url, CSE_PATH, &params)?;
        tracing::debug!(url = %redact_key(url.as_str()), "querying custom search engine");

        let resp = self.http.get(url).send().await?;
        let status = resp.status();
        let body = resp.text().await?;
        if status.as_u16() >= 400 {
            tracing::error!(
                status = status.as_u16(),
                label,
                entity,
                body = %body,
                "custom search engine returned an error status"
            );
        }

        let records = parse_cse_response(&body, label, entity);
        tracing::info!(label, entity, count = records.len(), "returning custom search results");
        Ok(records)
    }
}

/// Map a custom search engine response body to result records.
///
/// A body without `items`, or one that is not valid JSON, yields no records.
#[must_use]
pub fn parse_cse_response(body: &str, label: &str, entity: &str) -> Vec<ResultRecord> {
    let response: CseResponse = match serde_json::from_str(body) {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!(%e, "failed to parse custom search response");
            return Vec::new();
        }
    };
    let Some(items) = response.items else {
        return Vec::new();
    };

    let retrieved = items.len();
    let total = response
        .queries
        .request
        .into_iter()
        .next()
        .and_then(|r| r.total_results);

    items
        .into_iter()
        .map(|item| {
            let mut metadata =
                RecordMetadata::new(label, entity).with_retrieved(Retrieved::Count(retrieved));
            if let Some(total) = &total {
                metadata = metadata.with_total_results(total.clone());
            }
            ResultRecord::CustomSearch(CustomSearchRecord { item, metadata })
        })
        .collect()
}

/// Replace the value of the `key` query parameter for logging.
fn redact_key(url: &str) -> String {
    let Some((base, query)) = url.split_once('?') else {
        return url.to_string();
    };
    let query = query
        .split('&')
        .map(|pair| {
            if pair.starts_with("key=") {
                "key=REDACTED"
            } else {
                pair
            }
        })
        .collect::<Vec<_>>()
        .join("&");
    format!("{base}?{query}")
}
