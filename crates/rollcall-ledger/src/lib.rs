//! # rollcall-ledger
//!
//! The attendance ledger: the single source of truth for student
//! registrations and daily attendance marks.
//!
//! - Owner-only registration and active/inactive toggling
//! - Once-per-day attendance keyed by `(identity, day-index)`
//! - An append-only event journal fanned out to [`EventSink`] observers
//! - Checkpoint/rollback and validated JSON snapshots for persistence
//!
//! Every operation is synchronous and all-or-nothing: a rejected call
//! leaves the ledger untouched. Callers that share a ledger across tasks
//! are expected to serialize access (one call at a time).
//!
//! ```
//! use rollcall_core::{Identity, MatricNumber, Timestamp};
//! use rollcall_ledger::{AttendanceLedger, LedgerError};
//!
//! let owner = Identity::new("0xowner");
//! let alice = Identity::new("0xalice");
//! let mut ledger = AttendanceLedger::new(owner.clone()).unwrap();
//!
//! let now = Timestamp::from_secs(1_700_000_000);
//! ledger
//!     .register_student(&owner, alice.clone(), MatricNumber::new("CSC001"), "Alice", now)
//!     .unwrap();
//! ledger.mark_attendance(&alice, now).unwrap();
//!
//! let again = ledger.mark_attendance(&alice, now.plus_secs(3600));
//! assert!(matches!(again, Err(LedgerError::AlreadyMarked { .. })));
//! assert_eq!(ledger.attendance_count(&alice), 1);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![forbid(unsafe_code)]

pub mod error;
pub mod event;
pub mod ledger;
pub mod records;
pub mod snapshot;
pub mod store;

mod proptests;

pub use error::{Error, ErrorKind, LedgerError, LedgerResult, Result};
pub use event::{EventSink, LedgerEvent, TracingSink};
pub use ledger::{AttendanceLedger, Checkpoint};
pub use records::{AttendanceRecord, AttendanceStatus, RosterEntry, StudentLookup, StudentRecord};
pub use snapshot::{SNAPSHOT_VERSION, Snapshot};
pub use store::SnapshotStore;
