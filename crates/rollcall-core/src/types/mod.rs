//! Value types for ledger keys and time.

mod identity;
mod proptests;
mod time;

pub use identity::{Identity, MatricNumber};
pub use time::{DayIndex, ONE_DAY_SECS, Timestamp};
