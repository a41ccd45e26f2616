//! HTTP handlers, grouped by the service that mounts them.

pub mod commands;
pub mod health;
pub mod ingress;
pub mod metrics;
pub mod queries;
pub mod store;

use axum::http::Uri;
use chrono::{DateTime, Utc};

use crate::error::ApiError;

/// Fallback for unmatched routes.
pub async fn not_found(uri: Uri) -> ApiError {
    tracing::debug!(%uri, "no route");
    ApiError::NotFound(format!("invalid URI {}", uri.path()))
}

/// Parses an RFC 3339 query parameter.
///
/// An unencoded `+` in a query string decodes to a space, so
/// `...T00:00:00 01:00` is read as the offset `+01:00`.
pub(crate) fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    common::time::parse_nanos(raw).or_else(|err| match raw.rsplit_once(' ') {
        Some((datetime, offset)) => common::time::parse_nanos(&format!("{datetime}+{offset}")),
        None => Err(err),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_timestamp_reads_decoded_plus_as_offset() {
        let plus = parse_timestamp("2024-01-01T01:00:00+01:00").unwrap();
        let decoded = parse_timestamp("2024-01-01T01:00:00 01:00").unwrap();
        assert_eq!(plus, decoded);
        assert_eq!(decoded, parse_timestamp("2024-01-01T00:00:00Z").unwrap());
    }

    #[test]
    fn test_parse_timestamp_rejects_garbage() {
        assert!(parse_timestamp("yesterday").is_err());
        assert!(parse_timestamp("2024-01-01T00:00:00 xx").is_err());
    }
}
