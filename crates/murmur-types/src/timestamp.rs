//! Timestamps are stored and rendered as `yyyy-MM-dd HH:mm:ss` in UTC.
//!
//! The module doubles as a `#[serde(with = "...")]` adapter for embedded
//! records that round-trip through the store as JSON.

use chrono::{DateTime, NaiveDateTime, ParseResult, Utc};
use serde::{Deserialize, Deserializer, Serializer};

pub const FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn format(ts: &DateTime<Utc>) -> String {
    ts.format(FORMAT).to_string()
}

pub fn parse(value: &str) -> ParseResult<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(value, FORMAT).map(|ndt| ndt.and_utc())
}

/// Current time truncated to the rendered precision, so a freshly created
/// record reads back identical to what the store returns later.
pub fn now() -> DateTime<Utc> {
    let now = Utc::now();
    parse(&format(&now)).unwrap_or(now)
}

pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format(ts))
}

pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
    let raw = String::deserialize(deserializer)?;
    parse(&raw).map_err(serde::de::Error::custom)
}
