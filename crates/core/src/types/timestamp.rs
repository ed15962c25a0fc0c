//! Wire-stable timestamps.
//!
//! All timestamps are written as RFC 3339 UTC with exactly three fractional
//! digits (`2025-01-10T00:00:00.000Z`). Fixed width means the lexical order of
//! the serialised form equals chronological order, which the document store
//! relies on when filtering and ordering by date fields.
//!
//! Parsing is lenient: any RFC 3339 timestamp is accepted, as is a bare
//! calendar date (`2025-01-10`), read as midnight UTC.

use core::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, SecondsFormat, SubsecRound, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Errors that can occur when parsing a [`Timestamp`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TimestampError {
    /// The input is neither RFC 3339 nor `YYYY-MM-DD`.
    #[error("invalid timestamp '{0}': expected RFC 3339 or YYYY-MM-DD")]
    Invalid(String),
}

/// A UTC instant with millisecond precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// The current server time, truncated to milliseconds.
    #[must_use]
    pub fn now() -> Self {
        Self::from_datetime(Utc::now())
    }

    /// Wrap a `DateTime`, truncating to milliseconds.
    #[must_use]
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt.trunc_subsecs(3))
    }

    /// Parse from RFC 3339 or a bare `YYYY-MM-DD` date.
    ///
    /// # Errors
    ///
    /// Returns `TimestampError::Invalid` if neither format matches.
    pub fn parse(s: &str) -> Result<Self, TimestampError> {
        let s = s.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Ok(Self::from_datetime(dt.with_timezone(&Utc)));
        }
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|naive| Self(naive.and_utc()))
            .ok_or_else(|| TimestampError::Invalid(s.to_owned()))
    }

    /// The underlying `DateTime`.
    #[must_use]
    pub const fn as_datetime(&self) -> DateTime<Utc> {
        self.0
    }

    /// The canonical wire form.
    #[must_use]
    pub fn to_wire(&self) -> String {
        self.0.to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self::from_datetime(dt)
    }
}

impl FromStr for Timestamp {
    type Err = TimestampError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_wire())
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_wire())
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bare_date_is_midnight_utc() {
        let ts = Timestamp::parse("2025-01-10").unwrap();
        assert_eq!(ts.to_wire(), "2025-01-10T00:00:00.000Z");
    }

    #[test]
    fn test_parse_rfc3339_with_offset() {
        let ts = Timestamp::parse("2025-01-10T02:30:00+02:00").unwrap();
        assert_eq!(ts.to_wire(), "2025-01-10T00:30:00.000Z");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            Timestamp::parse("next tuesday"),
            Err(TimestampError::Invalid(_))
        ));
    }

    #[test]
    fn test_wire_form_is_fixed_width_and_sorts_chronologically() {
        let a = Timestamp::parse("2025-01-10T00:00:00Z").unwrap();
        let b = Timestamp::parse("2025-01-10T00:00:00.123456Z").unwrap();
        assert_eq!(a.to_wire().len(), b.to_wire().len());
        assert!(a < b);
        assert!(a.to_wire() < b.to_wire());
    }

    #[test]
    fn test_now_survives_serialization() {
        let now = Timestamp::now();
        let json = serde_json::to_string(&now).unwrap();
        let back: Timestamp = serde_json::from_str(&json).unwrap();
        assert_eq!(now, back);
    }
}
