//! Lenient timestamp ingestion.
//!
//! Records written by different producers carry timestamps in several
//! layouts. Anything that cannot be placed in time is treated as absent.

use jiff::tz::TimeZone;
use jiff::{Timestamp, civil};
use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer};
use tracing::debug;

/// Parse a timestamp in any layout the tracker accepts.
///
/// - RFC 3339 with `Z` or a numeric offset, with or without fractional seconds
/// - civil date-time without offset (`2024-06-03T10:00:00`, `2024-06-03T10:00`), read as UTC
/// - bare date (`2024-06-03`), read as UTC midnight
pub fn parse_timestamp(raw: &str) -> Option<Timestamp> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(ts) = raw.parse::<Timestamp>() {
        return Some(ts);
    }
    if let Ok(dt) = raw.parse::<civil::DateTime>() {
        return dt.to_zoned(TimeZone::UTC).ok().map(|z| z.timestamp());
    }
    if let Ok(date) = raw.parse::<civil::Date>() {
        return date.to_zoned(TimeZone::UTC).ok().map(|z| z.timestamp());
    }
    None
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTimestamp {
    Text(String),
    Seconds(i64),
    Other(IgnoredAny),
}

/// Serde adapter for optional timestamps. Unparseable values become `None`.
pub fn lenient<'de, D>(deserializer: D) -> Result<Option<Timestamp>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawTimestamp>::deserialize(deserializer)?;
    let parsed = match raw {
        None => None,
        Some(RawTimestamp::Text(text)) => {
            let ts = parse_timestamp(&text);
            if ts.is_none() && !text.trim().is_empty() {
                debug!(value = %text, "ignoring unparseable timestamp");
            }
            ts
        }
        Some(RawTimestamp::Seconds(secs)) => {
            let ts = Timestamp::from_second(secs).ok();
            if ts.is_none() {
                debug!(value = secs, "ignoring out-of-range timestamp");
            }
            ts
        }
        Some(RawTimestamp::Other(_)) => {
            debug!("ignoring timestamp that is neither text nor whole seconds");
            None
        }
    };
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> Timestamp {
        s.parse().unwrap()
    }

    #[test]
    fn rfc3339_forms() {
        assert_eq!(
            parse_timestamp("2024-06-03T10:00:00Z"),
            Some(ts("2024-06-03T10:00:00Z"))
        );
        assert_eq!(
            parse_timestamp("2024-06-03T10:00:00.250Z"),
            Some(ts("2024-06-03T10:00:00.25Z"))
        );
        assert_eq!(
            parse_timestamp("2024-06-03T12:00:00+02:00"),
            Some(ts("2024-06-03T10:00:00Z"))
        );
    }

    #[test]
    fn offsetless_forms_are_utc() {
        assert_eq!(
            parse_timestamp("2024-06-03T10:00:00"),
            Some(ts("2024-06-03T10:00:00Z"))
        );
        assert_eq!(
            parse_timestamp("2024-06-03T10:00"),
            Some(ts("2024-06-03T10:00:00Z"))
        );
        assert_eq!(
            parse_timestamp("2024-06-03"),
            Some(ts("2024-06-03T00:00:00Z"))
        );
    }

    #[test]
    fn garbage_is_absent() {
        assert_eq!(parse_timestamp(""), None);
        assert_eq!(parse_timestamp("   "), None);
        assert_eq!(parse_timestamp("yesterday"), None);
        assert_eq!(parse_timestamp("2024-13-45"), None);
    }

    #[derive(Deserialize)]
    struct Holder {
        #[serde(default, deserialize_with = "lenient")]
        at: Option<Timestamp>,
    }

    fn at(json: &str) -> Option<Timestamp> {
        serde_json::from_str::<Holder>(json).unwrap().at
    }

    #[test]
    fn adapter_never_fails_on_bad_text() {
        assert_eq!(at(r#"{"at":"not a date"}"#), None);
        assert_eq!(at(r#"{"at":null}"#), None);
        assert_eq!(at(r"{}"), None);
    }

    #[test]
    fn adapter_never_fails_on_other_json_types() {
        assert_eq!(at(r#"{"at":1717408800.5}"#), None);
        assert_eq!(at(r#"{"at":true}"#), None);
        assert_eq!(at(r#"{"at":{"seconds":1}}"#), None);
        assert_eq!(at(r#"{"at":[1, 2]}"#), None);
    }

    #[test]
    fn adapter_reads_epoch_seconds() {
        assert_eq!(at(r#"{"at":1717408800}"#), Some(ts("2024-06-03T10:00:00Z")));
    }
}
