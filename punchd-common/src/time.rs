//! Timestamp normalization and the local-day policy
//!
//! Biometric devices report punch times in a handful of encodings, all on
//! the device's local clock: RFC 3339 strings, naive `YYYY-MM-DD HH:MM:SS`
//! strings, or Unix epoch numbers. Everything is normalized to a canonical
//! UTC instant here; the calendar day used for aggregate keying is derived
//! from that instant in the deployment's configured local zone, because a
//! device's "day" boundary follows local shift boundaries, not UTC.

use crate::error::{Error, Result};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Deployment-local time zone policy
///
/// A single fixed UTC offset (e.g. `+05:00`). Injected wherever a local
/// calendar day or a local display time is derived; never hard-coded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalDayPolicy {
    offset: FixedOffset,
}

impl LocalDayPolicy {
    /// Policy for UTC itself (offset zero)
    pub fn utc() -> Self {
        Self {
            offset: FixedOffset::east_opt(0).expect("zero offset is valid"),
        }
    }

    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    /// Parse an offset string such as `+05:00`, `-03:30` or `Z`
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("z") || s.eq_ignore_ascii_case("utc") {
            return Ok(Self::utc());
        }
        let (sign, rest) = if let Some(rest) = s.strip_prefix('+') {
            (1i32, rest)
        } else if let Some(rest) = s.strip_prefix('-') {
            (-1i32, rest)
        } else {
            return Err(Error::Config(format!(
                "Invalid timezone offset '{}': expected +HH:MM or -HH:MM",
                s
            )));
        };
        let (hours, minutes) = match rest.split_once(':') {
            Some((h, m)) => (h, m),
            // Also accept the compact +HHMM form devices sometimes send
            None if rest.len() == 4 && rest.chars().all(|c| c.is_ascii_digit()) => {
                rest.split_at(2)
            }
            None => (rest, "0"),
        };
        let hours: i32 = hours
            .parse()
            .map_err(|_| Error::Config(format!("Invalid timezone offset '{}'", s)))?;
        let minutes: i32 = minutes
            .parse()
            .map_err(|_| Error::Config(format!("Invalid timezone offset '{}'", s)))?;
        if hours > 23 || minutes > 59 {
            return Err(Error::Config(format!("Timezone offset '{}' out of range", s)));
        }
        let seconds = sign * (hours * 3600 + minutes * 60);
        FixedOffset::east_opt(seconds)
            .map(Self::new)
            .ok_or_else(|| Error::Config(format!("Timezone offset '{}' out of range", s)))
    }

    /// Local calendar day of an instant under this policy
    pub fn local_day(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.offset).date_naive()
    }

    /// Format an instant as a local wall-clock string for display
    pub fn format_local(&self, instant: DateTime<Utc>) -> String {
        instant
            .with_timezone(&self.offset)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string()
    }

    /// Interpret a naive wall-clock time as local time under this policy
    fn resolve_naive(&self, naive: NaiveDateTime) -> DateTime<Utc> {
        // FixedOffset has no gaps or folds, so this is always unambiguous
        self.offset
            .from_local_datetime(&naive)
            .single()
            .expect("fixed offset local time is unambiguous")
            .with_timezone(&Utc)
    }
}

/// Normalize a device-supplied timestamp string into a UTC instant
///
/// Accepted encodings, tried in order:
/// 1. RFC 3339 / ISO-8601 with an explicit offset or `Z`
/// 2. Naive `YYYY-MM-DD HH:MM:SS` (space or `T` separator, optional
///    seconds), interpreted in the policy's local zone
/// 3. Unix epoch seconds or milliseconds as a digit string
pub fn normalize_str(raw: &str, policy: &LocalDayPolicy) -> Result<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(Error::InvalidTimestamp("empty timestamp".to_string()));
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }

    for fmt in [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y/%m/%d %H:%M:%S",
    ] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Ok(policy.resolve_naive(naive));
        }
    }

    if raw.chars().all(|c| c.is_ascii_digit()) {
        if let Ok(epoch) = raw.parse::<i64>() {
            return normalize_epoch(epoch);
        }
    }

    Err(Error::InvalidTimestamp(format!(
        "unparsable timestamp '{}'",
        raw
    )))
}

/// Normalize a JSON timestamp value (string or epoch number)
pub fn normalize_value(raw: &serde_json::Value, policy: &LocalDayPolicy) -> Result<DateTime<Utc>> {
    match raw {
        serde_json::Value::String(s) => normalize_str(s, policy),
        serde_json::Value::Number(n) => {
            let epoch = n
                .as_i64()
                .ok_or_else(|| Error::InvalidTimestamp(format!("non-integer epoch {}", n)))?;
            normalize_epoch(epoch)
        }
        other => Err(Error::InvalidTimestamp(format!(
            "unsupported timestamp value {}",
            other
        ))),
    }
}

/// Interpret an epoch number as seconds or milliseconds
///
/// Millisecond timestamps for any date this engine cares about are 13+
/// digits; second timestamps are 10. The cutoff below (year ~33658 in
/// seconds) cleanly separates the two.
fn normalize_epoch(epoch: i64) -> Result<DateTime<Utc>> {
    if epoch < 0 {
        return Err(Error::InvalidTimestamp(format!(
            "negative epoch {}",
            epoch
        )));
    }
    let instant = if epoch >= 1_000_000_000_000 {
        Utc.timestamp_millis_opt(epoch).single()
    } else {
        Utc.timestamp_opt(epoch, 0).single()
    };
    instant.ok_or_else(|| Error::InvalidTimestamp(format!("epoch {} out of range", epoch)))
}
