//! Timestamps and day-index buckets.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Length of one day in seconds.
pub const ONE_DAY_SECS: u64 = 86_400;

/// A point in time as whole seconds since the Unix epoch.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Timestamp(u64);

impl Timestamp {
    /// The epoch; also the value reported for records that do not exist.
    pub const ZERO: Timestamp = Timestamp(0);

    /// Creates a timestamp from seconds since the epoch.
    pub const fn from_secs(secs: u64) -> Self {
        Self(secs)
    }

    /// Converts a chrono datetime. Instants before the epoch clamp to zero.
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(u64::try_from(dt.timestamp()).unwrap_or(0))
    }

    /// Seconds since the epoch.
    pub const fn as_secs(&self) -> u64 {
        self.0
    }

    /// Converts to a chrono datetime, if representable.
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        i64::try_from(self.0)
            .ok()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
    }

    /// The day bucket this timestamp falls into.
    ///
    /// ```
    /// use rollcall_core::{DayIndex, Timestamp};
    ///
    /// assert_eq!(Timestamp::from_secs(86_399).day_index(), DayIndex::new(0));
    /// assert_eq!(Timestamp::from_secs(86_400).day_index(), DayIndex::new(1));
    /// ```
    pub const fn day_index(&self) -> DayIndex {
        DayIndex::from_timestamp(*self)
    }

    /// Returns a timestamp `secs` later, saturating at the maximum.
    pub const fn plus_secs(&self, secs: u64) -> Self {
        Self(self.0.saturating_add(secs))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_datetime() {
            Some(dt) => write!(f, "{}", dt.to_rfc3339()),
            None => write!(f, "{}s", self.0),
        }
    }
}

impl From<u64> for Timestamp {
    fn from(secs: u64) -> Self {
        Self(secs)
    }
}

/// Integer day bucket: `floor(timestamp / ONE_DAY_SECS)`.
///
/// Days are counted from the Unix epoch in UTC; no timezone adjustment is
/// applied.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct DayIndex(u64);

impl DayIndex {
    /// Creates a day index from its raw value.
    pub const fn new(day: u64) -> Self {
        Self(day)
    }

    /// Computes the bucket for a timestamp.
    pub const fn from_timestamp(ts: Timestamp) -> Self {
        Self(ts.as_secs() / ONE_DAY_SECS)
    }

    /// Raw day number since the epoch.
    pub const fn value(&self) -> u64 {
        self.0
    }

    /// The first second of this day.
    pub const fn start(&self) -> Timestamp {
        Timestamp::from_secs(self.0.saturating_mul(ONE_DAY_SECS))
    }
}

impl fmt::Display for DayIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for DayIndex {
    fn from(day: u64) -> Self {
        Self(day)
    }
}
