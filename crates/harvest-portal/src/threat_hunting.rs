//! Threat-hunting queries.

use chrono::Utc;
use reqwest::Method;
use serde::Deserialize;
use serde_json::Value;

use crate::error::PortalError;
use crate::payloads::{self, DateRange};
use crate::session::PortalSession;

const THREAT_HUNT_PATH: &str = "/app/threathunting/prod-gcp-apollo/";
const THREAT_DASH_PATH: &str = "/dashboard/endpoint/threathunting#/search";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    data: SearchData,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchData {
    search_records: SearchRecords,
}

#[derive(Debug, Deserialize)]
struct SearchRecords {
    metadata: SearchMetadata,
    #[serde(default)]
    records: Vec<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchMetadata {
    total_rows: u64,
}

impl PortalSession {
    /// Fetch active-attack records from the last `hours_ago` hours.
    ///
    /// Visits the threat-hunting page and runs the stats query first; both
    /// answers are only logged.
    ///
    /// # Errors
    ///
    /// - [`PortalError::NotAuthenticated`] before a successful login.
    /// - [`PortalError::UnexpectedStatus`] if the active-attack query does not
    ///   answer 200.
    /// - [`PortalError::Parse`] if that answer lacks `data.searchRecords`.
    /// - [`PortalError::Http`] on transport failure.
    pub async fn query_active_attacks(&self, hours_ago: u32) -> Result<Vec<Value>, PortalError> {
        tracing::debug!(hours_ago, "querying active attacks");

        let dash_url = format!("{}{THREAT_DASH_PATH}", self.portal_base());
        let resp = self.request(Method::GET, &dash_url)?.send().await?;
        tracing::info!(status = resp.status().as_u16(), "threat hunting page answered");

        let url = format!("{}{THREAT_HUNT_PATH}", self.gateway_base());
        let range = DateRange::last_hours(Utc::now(), hours_ago);
        tracing::debug!(from = %range.from, to = %range.to, "query window");

        let resp = self
            .request(Method::POST, &url)?
            .json(&payloads::stats(&range))
            .send()
            .await?;
        tracing::info!(status = resp.status().as_u16(), "stats query answered");

        let resp = self
            .request(Method::POST, &url)?
            .json(&payloads::active_attacks(&range))
            .send()
            .await?;
        let status = resp.status();
        tracing::info!(status = status.as_u16(), "active attack query answered");
        let body = resp.text().await?;
        if status != reqwest::StatusCode::OK {
            tracing::debug!(%body, "active attack query failed");
            return Err(PortalError::UnexpectedStatus {
                endpoint: "active attacks",
                status: status.as_u16(),
                body,
            });
        }

        parse_records(&body)
    }
}

/// Pull the records out of a search answer. Zero `totalRows` means no records.
fn parse_records(body: &str) -> Result<Vec<Value>, PortalError> {
    let response: SearchResponse = serde_json::from_str(body).map_err(|e| PortalError::Parse {
        endpoint: "active attacks",
        reason: e.to_string(),
    })?;
    let search = response.data.search_records;
    tracing::debug!(total_rows = search.metadata.total_rows, "search metadata");

    if search.metadata.total_rows > 0 {
        Ok(search.records)
    } else {
        Ok(Vec::new())
    }
}
