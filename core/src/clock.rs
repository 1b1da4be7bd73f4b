//! Engine clock — the single source of "now" for window arithmetic.
//!
//! Every time-dependent engine function takes an `EngineClock` instead of
//! reading the wall clock itself, so tests pin time with `EngineClock::fixed`
//! and the 48-hour / 30-day windows become exact.

use chrono::{DateTime, Duration, Utc};

/// Timestamp format used everywhere in the store: UTC, second precision,
/// lexicographically ordered, and accepted by SQLite's `DATE()`.
pub const TS_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, Copy)]
pub enum EngineClock {
    /// Wall clock; used by the runner.
    System,
    /// Pinned instant; used by tests.
    Fixed(DateTime<Utc>),
}

impl EngineClock {
    pub fn fixed(at: DateTime<Utc>) -> Self {
        EngineClock::Fixed(at)
    }

    pub fn now(&self) -> DateTime<Utc> {
        match self {
            EngineClock::System => Utc::now(),
            EngineClock::Fixed(at) => *at,
        }
    }

    /// "now" as a store timestamp.
    pub fn timestamp(&self) -> String {
        format_ts(self.now())
    }

    /// Store timestamp `hours` before now, for `created_at <= ?` cutoffs.
    pub fn cutoff_hours_ago(&self, hours: i64) -> String {
        format_ts(self.now() - Duration::hours(hours))
    }

    /// Store timestamp `days` before now.
    pub fn cutoff_days_ago(&self, days: i64) -> String {
        format_ts(self.now() - Duration::days(days))
    }

    /// Today's date as `YYYY-MM-DD`, for seasonal-window comparisons.
    pub fn today(&self) -> String {
        self.now().format("%Y-%m-%d").to_string()
    }
}

pub fn format_ts(at: DateTime<Utc>) -> String {
    at.format(TS_FORMAT).to_string()
}
