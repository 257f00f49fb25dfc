//! Threat-hunting GraphQL payloads.
//!
//! Both queries share one `queryParam` block; only the selection differs.

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{Value, json};

/// Records requested per active-attack query.
pub const PAGE_SIZE: u32 = 1000;

const STATS_QUERY: &str = "query Stats($queryParam: QueryParamInput) { \
    searchRecords(queryParam: $queryParam) { metadata { totalRows } \
    stats { field values { value count } } } }";

const SEARCH_RECORDS_QUERY: &str = "query SearchRecords($queryParam: QueryParamInput, \
    $paging: PagingInput) { searchRecords(queryParam: $queryParam, paging: $paging) { \
    metadata { totalRows from to } records } }";

/// Query window as ISO-8601 UTC timestamps with millisecond precision and a
/// `Z` suffix, e.g. `2024-06-01T11:00:00.000Z`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub from: String,
    pub to: String,
}

impl DateRange {
    /// The `hours` hours ending at `now`.
    #[must_use]
    pub fn last_hours(now: DateTime<Utc>, hours: u32) -> Self {
        Self {
            from: iso_millis(now - Duration::hours(i64::from(hours))),
            to: iso_millis(now),
        }
    }
}

fn iso_millis(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn query_param(range: &DateRange) -> Value {
    json!({
        "dateRange": range,
        "filters": {
            "menuFilter": [],
            "freeTextFilter": null,
            "idpFilter": null
        },
        "recordType": "Detection",
        "activeAttacksOnly": true
    })
}

/// Aggregate counts for the window. The answer is only logged.
#[must_use]
pub fn stats(range: &DateRange) -> Value {
    json!({
        "operationName": "Stats",
        "variables": { "queryParam": query_param(range) },
        "query": STATS_QUERY
    })
}

/// Active-attack records for the window.
#[must_use]
pub fn active_attacks(range: &DateRange) -> Value {
    json!({
        "operationName": "SearchRecords",
        "variables": {
            "queryParam": query_param(range),
            "paging": { "pageSize": PAGE_SIZE, "offset": 0, "cursor": null }
        },
        "query": SEARCH_RECORDS_QUERY
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn range_is_millisecond_zulu() {
        let range = DateRange::last_hours(noon(), 168);
        assert_eq!(range.from, "2024-05-25T12:00:00.000Z");
        assert_eq!(range.to, "2024-06-01T12:00:00.000Z");
    }

    #[test]
    fn payloads_carry_the_range() {
        let range = DateRange::last_hours(noon(), 1);
        for payload in [stats(&range), active_attacks(&range)] {
            assert_eq!(
                payload["variables"]["queryParam"]["dateRange"],
                json!({"from": "2024-06-01T11:00:00.000Z", "to": "2024-06-01T12:00:00.000Z"})
            );
        }
    }

    #[test]
    fn active_attacks_sends_real_nulls() {
        let payload = active_attacks(&DateRange::last_hours(noon(), 1));
        assert_eq!(payload["variables"]["paging"]["cursor"], Value::Null);
        assert!(!payload.to_string().contains("\"null\""));
        assert_eq!(payload["operationName"], json!("SearchRecords"));
    }
}
