//! crt.sh certificate transparency backend.
//!
//! API: `https://crt.sh/?q=<domain>&output=json` returns a JSON array of log
//! entries. crt.sh is slow and flaky under load, so this is the one backend
//! that retries on its own.

use chrono::{NaiveDateTime, Utc};
use harvest_core::{CertificateRecord, CtLogEntry, RecordMetadata, ResultRecord};

use crate::DorkClient;
use crate::http::{endpoint, random_delay};

/// Only the first 18 characters of `entry_timestamp` are parsed.
const TIMESTAMP_PREFIX_LEN: usize = 18;
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

impl DorkClient {
    /// Search crt.sh for certificates issued to `domain`.
    ///
    /// Retries while the status is not 200, pausing a random
    /// `retry_min_secs..=retry_max_secs` between attempts. When every attempt
    /// fails, or the body is not a JSON array of entries, the result is empty.
    ///
    /// With `max_days_old > 0`, entries logged more than that many whole days
    /// ago are dropped.
    pub async fn query_crt_sh(
        &self,
        domain: &str,
        entity: &str,
        label: &str,
        max_days_old: u32,
    ) -> Vec<ResultRecord> {
        let url = match endpoint(
            &self.config.crtsh_url,
            "",
            &[("q", domain), ("output", "json")],
        ) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!(%e, "crt.sh endpoint is not usable");
                return Vec::new();
            }
        };
        tracing::debug!(%url, max_days_old, "querying crt.sh");

        let attempts = self.config.crtsh_attempts.max(1);
        let mut response = None;
        for attempt in 1..=attempts {
            match self.http.get(url.clone()).send().await {
                Ok(resp) if resp.status() == reqwest::StatusCode::OK => {
                    response = Some(resp);
                    break;
                }
                Ok(resp) => {
                    tracing::debug!(attempt, status = resp.status().as_u16(), "crt.sh not ready");
                }
                Err(e) => tracing::debug!(attempt, %e, "crt.sh request failed"),
            }
            if attempt < attempts {
                tokio::time::sleep(random_delay(
                    self.config.retry_min_secs,
                    self.config.retry_max_secs,
                ))
                .await;
            }
        }

        let Some(response) = response else {
            tracing::warn!(domain, attempts, "crt.sh gave no usable response");
            return Vec::new();
        };

        let entries: Vec<CtLogEntry> = match response.json().await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(domain, %e, "failed to parse crt.sh response");
                return Vec::new();
            }
        };

        let now = Utc::now().naive_utc();
        let results: Vec<ResultRecord> = retain_recent(entries, now, max_days_old)
            .into_iter()
            .map(|entry| {
                ResultRecord::Certificate(CertificateRecord {
                    entry,
                    metadata: RecordMetadata::new(label, entity).with_query(domain),
                })
            })
            .collect();

        tracing::info!(domain, count = results.len(), "returning crt.sh results");
        results
    }
}

/// Parse the first 18 characters of a crt.sh `entry_timestamp`.
///
/// The cut drops the last digit of the seconds field; a single-digit seconds
/// value is accepted.
#[must_use]
pub fn parse_entry_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let prefix: String = raw.chars().take(TIMESTAMP_PREFIX_LEN).collect();
    NaiveDateTime::parse_from_str(&prefix, TIMESTAMP_FORMAT).ok()
}

/// Whole days elapsed between `logged` and `now`.
#[must_use]
pub fn age_in_days(logged: NaiveDateTime, now: NaiveDateTime) -> i64 {
    (now - logged).num_days()
}

/// Keep entries whose timestamp parses and, when `max_days_old > 0`, whose age
/// does not exceed it.
#[must_use]
pub fn retain_recent(
    entries: Vec<CtLogEntry>,
    now: NaiveDateTime,
    max_days_old: u32,
) -> Vec<CtLogEntry> {
    entries
        .into_iter()
        .filter(|entry| {
            let Some(logged) = parse_entry_timestamp(&entry.entry_timestamp) else {
                tracing::debug!(
                    entry_timestamp = %entry.entry_timestamp,
                    "skipping crt.sh entry with unparsable timestamp"
                );
                return false;
            };
            max_days_old == 0 || age_in_days(logged, now) <= i64::from(max_days_old)
        })
        .collect()
}
