//! Timestamp module - service-issued record times

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Point in time a record was produced, kept as the service sent it
///
/// The service emits either RFC 3339 (`2024-01-01T00:00:00Z`) or an
/// offset-less ISO 8601 string (`2024-01-01T00:00:00.123456`). Offset-less
/// values are read as UTC. The raw text is kept so an unparseable value can
/// still be shown.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(String);

impl Timestamp {
    /// Wrap a raw timestamp string
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Raw text as received
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parse into a UTC instant, if the text is a recognised format
    pub fn to_utc(&self) -> Option<DateTime<Utc>> {
        let raw = self.0.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }
        raw.parse::<NaiveDateTime>()
            .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
            .ok()
            .map(|naive| naive.and_utc())
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
