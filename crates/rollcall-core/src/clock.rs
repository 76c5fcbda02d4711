//! Sources of "now".
//!
//! The ledger never reads the wall clock itself; whoever calls it supplies
//! the time. [`Clock`] is the seam where that time comes from.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;

use crate::types::Timestamp;

/// A source of the current time.
pub trait Clock: Send + Sync {
    /// Returns the current time.
    fn now(&self) -> Timestamp;
}

/// Wall-clock time in UTC.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::from_datetime(Utc::now())
    }
}

/// A manually driven clock for tests and replays.
///
/// ```
/// use rollcall_core::{Clock, FixedClock, Timestamp};
///
/// let clock = FixedClock::new(Timestamp::from_secs(100));
/// clock.advance(50);
/// assert_eq!(clock.now(), Timestamp::from_secs(150));
/// ```
#[derive(Debug, Default)]
pub struct FixedClock {
    secs: AtomicU64,
}

impl FixedClock {
    /// Creates a clock stopped at `at`.
    pub fn new(at: Timestamp) -> Self {
        Self {
            secs: AtomicU64::new(at.as_secs()),
        }
    }

    /// Moves the clock to `at`.
    pub fn set(&self, at: Timestamp) {
        self.secs.store(at.as_secs(), Ordering::SeqCst);
    }

    /// Moves the clock forward by `secs`.
    pub fn advance(&self, secs: u64) {
        let _ = self
            .secs
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |cur| {
                Some(cur.saturating_add(secs))
            });
    }
}

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        Timestamp::from_secs(self.secs.load(Ordering::SeqCst))
    }
}
