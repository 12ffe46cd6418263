//! CAS authentication timestamps.
//!
//! The protocol carries `authenticationDate` as RFC3339. Newer CAS servers
//! append a bracketed zone id, e.g. `2025-07-22T02:04:29.974Z[UTC]`. Parsing
//! accepts both forms; formatting always produces plain RFC3339 in UTC.

use chrono::{DateTime, Datelike, SecondsFormat, Utc};

use crate::error::FormatError;

/// Parse a CAS timestamp.
///
/// Everything from the last `[` onwards is discarded before the remainder is
/// parsed as RFC3339. The instant is normalized to UTC.
pub fn parse(raw: &str) -> Result<DateTime<Utc>, FormatError> {
    let value = match raw.rfind('[') {
        Some(idx) => &raw[..idx],
        None => raw,
    };

    DateTime::parse_from_rfc3339(value)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|source| FormatError {
            input: raw.to_owned(),
            source,
        })
}

/// Whether [`format`] yields valid RFC3339 for this instant.
///
/// RFC3339 years are exactly four digits; chrono writes years outside
/// `0000..=9999` with a sign and extra digits, which [`parse`] rejects.
pub fn is_rfc3339_year(value: &DateTime<Utc>) -> bool {
    (0..=9999).contains(&value.year())
}

/// Format a timestamp as RFC3339 in UTC, without any zone-id annotation.
///
/// Sub-second precision is kept only when present. Callers writing a
/// document check [`is_rfc3339_year`] first.
pub fn format(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}
