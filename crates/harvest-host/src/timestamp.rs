//! Event time promotion from a field of the record.

use chrono::DateTime;
use serde_json::Value;

/// Epoch values at or above this are taken as milliseconds.
const MILLIS_THRESHOLD: f64 = 100_000_000_000.0;

/// Follow a dotted path such as `Base.OpTimeUTC` into nested objects.
#[must_use]
pub fn lookup_path<'a>(record: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(record, |node, key| node.as_object()?.get(key))
}

/// The event time in epoch seconds held at `path`, if any.
///
/// Numbers and numeric strings are epoch seconds, or epoch milliseconds when
/// large enough. Other strings are read as RFC 3339.
#[must_use]
pub fn event_time(record: &Value, path: &str) -> Option<f64> {
    let seconds = match lookup_path(record, path)? {
        Value::Number(n) => n.as_f64().map(normalize_epoch),
        Value::String(s) => s.trim().parse::<f64>().map_or_else(
            |_| {
                DateTime::parse_from_rfc3339(s.trim())
                    .ok()
                    .map(|dt| dt.timestamp_millis() as f64 / 1000.0)
            },
            |n| Some(normalize_epoch(n)),
        ),
        _ => None,
    };
    seconds.filter(|t| t.is_finite() && *t >= 0.0)
}

fn normalize_epoch(value: f64) -> f64 {
    if value >= MILLIS_THRESHOLD {
        value / 1000.0
    } else {
        value
    }
}
