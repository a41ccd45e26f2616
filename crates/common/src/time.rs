//! RFC3339 timestamps with nanosecond precision.
//!
//! Every timestamp on the wire (event headers, history JSON, event payloads,
//! snapshot cutoffs) is a UTC RFC3339 string carrying as many fractional
//! digits as needed to keep nanosecond precision.

use chrono::{DateTime, SecondsFormat, Utc};

/// Formats a timestamp as RFC3339 in UTC, keeping sub-second precision.
pub fn format_nanos(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Parses an RFC3339 timestamp with any offset and normalizes it to UTC.
pub fn parse_nanos(value: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(value).map(|dt| dt.with_timezone(&Utc))
}

/// Serde adapter for `DateTime<Utc>` fields using [`format_nanos`].
///
/// Use with `#[serde(with = "common::time::rfc3339_nanos")]`.
pub mod rfc3339_nanos {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_nanos(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_nanos(&raw).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Stamped {
        #[serde(with = "rfc3339_nanos")]
        at: DateTime<Utc>,
    }

    #[test]
    fn test_keeps_nanosecond_precision() {
        let ts = Utc.timestamp_opt(1_700_000_000, 123_456_789).unwrap();
        let text = format_nanos(&ts);
        assert_eq!(text, "2023-11-14T22:13:20.123456789Z");
        assert_eq!(parse_nanos(&text).unwrap(), ts);
    }

    #[test]
    fn test_whole_seconds_have_no_fraction() {
        let ts = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        assert_eq!(format_nanos(&ts), "2023-11-14T22:13:20Z");
    }

    #[test]
    fn test_offsets_are_normalized_to_utc() {
        let parsed = parse_nanos("2023-11-14T23:13:20+01:00").unwrap();
        assert_eq!(parsed, Utc.timestamp_opt(1_700_000_000, 0).unwrap());
    }

    #[test]
    fn test_serde_adapter_uses_rfc3339() {
        let value = Stamped {
            at: Utc.timestamp_opt(1_700_000_000, 5).unwrap(),
        };
        let json = serde_json::to_string(&value).unwrap();
        assert_eq!(json, r#"{"at":"2023-11-14T22:13:20.000000005Z"}"#);
        let back: Stamped = serde_json::from_str(&json).unwrap();
        assert_eq!(back, value);
    }
}
