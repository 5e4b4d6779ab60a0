//! Event time parsing and formatting
//!
//! All timestamps are milliseconds since the Unix epoch (UTC).

use crate::error::TimestampError;
use crate::model::TimestampMs;
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};

/// ISO-8601 layouts RFC 3339 rejects: basic-format offsets (`+0000`) and
/// minute precision. `%#z` also takes `Z` and `+hh:mm`.
const OFFSET_LAYOUTS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%#z",
    "%Y-%m-%d %H:%M:%S%.f%#z",
    "%Y-%m-%dT%H:%M%#z",
];

/// Offset-less layouts accepted after RFC 3339 fails; interpreted as UTC
const NAIVE_LAYOUTS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
];

/// Parse an ISO-8601 style event time into epoch milliseconds
///
/// Accepts full RFC 3339 (`2024-01-03T14:30:00.123Z`, `+02:00` offsets),
/// basic-format and minute-precision offset times, offset-less date-times
/// (assumed UTC) and bare dates (midnight UTC).
pub fn parse_event_time(raw: &str) -> Result<TimestampMs, TimestampError> {
    let trimmed = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.timestamp_millis());
    }

    for layout in OFFSET_LAYOUTS {
        if let Ok(dt) = DateTime::parse_from_str(trimmed, layout) {
            return Ok(dt.timestamp_millis());
        }
    }

    for layout in NAIVE_LAYOUTS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, layout) {
            return Ok(Utc.from_utc_datetime(&naive).timestamp_millis());
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        let midnight = date
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| TimestampError::OutOfRange(raw.to_string()))?;
        return Ok(Utc.from_utc_datetime(&midnight).timestamp_millis());
    }

    Err(TimestampError::Unrecognised(raw.to_string()))
}

/// Current wall-clock time in epoch milliseconds
pub fn now_ms() -> TimestampMs {
    Utc::now().timestamp_millis()
}

/// Render epoch milliseconds as RFC 3339 (falls back to the raw number)
pub fn format_ms(ts: TimestampMs) -> String {
    match Utc.timestamp_millis_opt(ts).single() {
        Some(dt) => dt.to_rfc3339_opts(SecondsFormat::Millis, true),
        None => ts.to_string(),
    }
}
