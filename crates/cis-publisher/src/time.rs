//! Time utilities for the CIS publisher.
//!
//! Profile timestamps travel as `YYYY-MM-DDTHH:MM:SS.000Z` strings. A
//! `created` stamp in 1970 means the attribute has never been set.

use chrono::{DateTime, Datelike, NaiveDateTime, Utc};

/// Wire format for attribute timestamps. Milliseconds are always zero.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S.000Z";

/// Source of the current time, injected so signing is deterministic in tests.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock frozen at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Render a timestamp in the wire format.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// Parse a wire timestamp. Returns `None` for anything unparseable.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.3fZ")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Whether a `created` stamp is the "never set" sentinel.
///
/// Only the year is inspected; anything unparseable that still starts
/// with `1970` is treated as the sentinel too.
pub fn is_sentinel(s: &str) -> bool {
    match parse_timestamp(s) {
        Some(at) => at.year() == 1970,
        None => s.starts_with("1970"),
    }
}
