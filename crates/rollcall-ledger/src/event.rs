//! Ledger events and the observers that receive them.
//!
//! Every successful mutation produces exactly one [`LedgerEvent`]. The
//! ledger appends it to its journal and hands it to each registered
//! [`EventSink`] in registration order. While a checkpoint is open, the
//! hand-off waits until the checkpoint is committed.

use rollcall_core::{DayIndex, Identity, MatricNumber, Timestamp};
use serde::{Deserialize, Serialize};

/// Audit record of a successful mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LedgerEvent {
    /// The owner registered a student.
    UserRegistered {
        /// Student identity
        identity: Identity,
        /// Student matric number
        matric_number: MatricNumber,
        /// Student name
        name: String,
    },

    /// A student marked attendance.
    AttendanceMarked {
        /// Student identity
        identity: Identity,
        /// Student matric number
        matric_number: MatricNumber,
        /// Day that was marked
        day_index: DayIndex,
        /// When it was marked
        timestamp: Timestamp,
    },

    /// The owner flipped the active flag.
    SystemStateChanged {
        /// The new value of the flag
        active: bool,
    },
}

impl LedgerEvent {
    /// Short event name, e.g. `"attendance_marked"`.
    pub fn name(&self) -> &'static str {
        match self {
            LedgerEvent::UserRegistered { .. } => "user_registered",
            LedgerEvent::AttendanceMarked { .. } => "attendance_marked",
            LedgerEvent::SystemStateChanged { .. } => "system_state_changed",
        }
    }
}

/// Receives ledger events as they are emitted.
///
/// Sinks run inline with the mutation (or the commit), so they must not
/// block.
pub trait EventSink: Send + Sync {
    /// Handles one event.
    fn publish(&self, event: &LedgerEvent);
}

impl<F> EventSink for F
where
    F: Fn(&LedgerEvent) + Send + Sync,
{
    fn publish(&self, event: &LedgerEvent) {
        self(event)
    }
}

/// Logs every event through `tracing` at info level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn publish(&self, event: &LedgerEvent) {
        match event {
            LedgerEvent::UserRegistered {
                identity,
                matric_number,
                name,
            } => {
                tracing::info!(
                    kind = event.name(),
                    %identity,
                    %matric_number,
                    student_name = name.as_str(),
                    "student registered"
                );
            }
            LedgerEvent::AttendanceMarked {
                identity,
                matric_number,
                day_index,
                timestamp,
            } => {
                tracing::info!(
                    kind = event.name(),
                    %identity,
                    %matric_number,
                    day = day_index.value(),
                    timestamp = timestamp.as_secs(),
                    "attendance marked"
                );
            }
            LedgerEvent::SystemStateChanged { active } => {
                tracing::info!(kind = event.name(), active, "system state changed");
            }
        }
    }
}
