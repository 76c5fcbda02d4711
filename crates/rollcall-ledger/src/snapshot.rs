//! Flat, serializable ledger snapshots.
//!
//! A [`Snapshot`] lists records in registration order so the file is
//! stable across saves. Restoring one re-checks every ledger invariant;
//! a file that was edited by hand or truncated mid-write is rejected
//! rather than loaded into an inconsistent ledger.

use std::collections::{BTreeMap, HashMap, HashSet};

use rollcall_core::{DayIndex, Identity, MatricNumber};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::event::LedgerEvent;
use crate::ledger::{AttendanceLedger, LedgerState};
use crate::records::{AttendanceRecord, StudentRecord};

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Serializable copy of the full ledger state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Format version, see [`SNAPSHOT_VERSION`]
    pub version: u32,
    /// Ledger owner
    pub owner: Identity,
    /// Active flag
    pub active: bool,
    /// Registration counter
    pub registration_count: u64,
    /// Registered identities, in registration order
    pub registered: Vec<Identity>,
    /// Student records
    pub students: Vec<StudentEntry>,
    /// Attendance records
    pub attendance: Vec<AttendanceEntry>,
    /// Per-identity attendance counters (zero counters omitted)
    pub attendance_counts: Vec<CountEntry>,
    /// Event journal, oldest first
    #[serde(default)]
    pub events: Vec<LedgerEvent>,
}

/// A student record keyed by identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentEntry {
    /// Student identity
    pub identity: Identity,
    /// The record
    #[serde(flatten)]
    pub record: StudentRecord,
}

/// An attendance record keyed by identity and day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceEntry {
    /// Student identity
    pub identity: Identity,
    /// Day bucket
    pub day_index: DayIndex,
    /// The record
    #[serde(flatten)]
    pub record: AttendanceRecord,
}

/// An attendance counter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountEntry {
    /// Student identity
    pub identity: Identity,
    /// Number of days marked
    pub count: u64,
}

impl AttendanceLedger {
    /// Captures the current state as a [`Snapshot`].
    pub fn snapshot(&self) -> Snapshot {
        let state = &self.state;
        let mut students = Vec::with_capacity(state.registered.len());
        let mut attendance = Vec::new();
        let mut attendance_counts = Vec::new();

        for identity in &state.registered {
            if let Some(record) = state.students.get(identity) {
                students.push(StudentEntry {
                    identity: identity.clone(),
                    record: record.clone(),
                });
            }
            if let Some(days) = state.attendance.get(identity) {
                attendance.extend(days.iter().map(|(day, record)| AttendanceEntry {
                    identity: identity.clone(),
                    day_index: *day,
                    record: record.clone(),
                }));
            }
            if let Some(&count) = state.attendance_counts.get(identity) {
                if count > 0 {
                    attendance_counts.push(CountEntry {
                        identity: identity.clone(),
                        count,
                    });
                }
            }
        }

        Snapshot {
            version: SNAPSHOT_VERSION,
            owner: state.owner.clone(),
            active: state.active,
            registration_count: state.registration_count,
            registered: state.registered.clone(),
            students,
            attendance,
            attendance_counts,
            events: state.journal.clone(),
        }
    }

    /// Rebuilds a ledger from a snapshot, validating every invariant.
    ///
    /// The restored ledger has no event sinks.
    pub fn from_snapshot(snapshot: Snapshot) -> Result<Self> {
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(Error::corrupt(format!(
                "unsupported snapshot version {} (expected {SNAPSHOT_VERSION})",
                snapshot.version
            )));
        }
        if snapshot.owner.is_null() {
            return Err(Error::corrupt("owner is the null identity"));
        }

        let mut students: HashMap<Identity, StudentRecord> = HashMap::new();
        let mut matric_index: HashMap<MatricNumber, Identity> = HashMap::new();
        for entry in snapshot.students {
            if entry.identity.is_null() {
                return Err(Error::corrupt("student record keyed by the null identity"));
            }
            if entry.record.matric_number.is_empty() || entry.record.name.trim().is_empty() {
                return Err(Error::corrupt(format!(
                    "student {} has an empty matric number or name",
                    entry.identity
                )));
            }
            if !entry.record.registered {
                return Err(Error::corrupt(format!(
                    "student {} is stored but not marked registered",
                    entry.identity
                )));
            }
            if let Some(other) =
                matric_index.insert(entry.record.matric_number.clone(), entry.identity.clone())
            {
                return Err(Error::corrupt(format!(
                    "matric number {} bound to both {other} and {}",
                    entry.record.matric_number, entry.identity
                )));
            }
            if students
                .insert(entry.identity.clone(), entry.record)
                .is_some()
            {
                return Err(Error::corrupt(format!(
                    "duplicate student record for {}",
                    entry.identity
                )));
            }
        }

        let mut seen = HashSet::new();
        for identity in &snapshot.registered {
            if !seen.insert(identity) {
                return Err(Error::corrupt(format!(
                    "{identity} appears twice in the registered list"
                )));
            }
            if !students.contains_key(identity) {
                return Err(Error::corrupt(format!(
                    "{identity} is listed as registered but has no student record"
                )));
            }
        }
        if snapshot.registered.len() != students.len() {
            return Err(Error::corrupt(format!(
                "{} student records but {} registered identities",
                students.len(),
                snapshot.registered.len()
            )));
        }
        if snapshot.registration_count != snapshot.registered.len() as u64 {
            return Err(Error::corrupt(format!(
                "registration count {} does not match {} registered identities",
                snapshot.registration_count,
                snapshot.registered.len()
            )));
        }

        let mut attendance: HashMap<Identity, BTreeMap<DayIndex, AttendanceRecord>> =
            HashMap::new();
        for entry in snapshot.attendance {
            let Some(student) = students.get(&entry.identity) else {
                return Err(Error::corrupt(format!(
                    "attendance for unregistered identity {}",
                    entry.identity
                )));
            };
            if !entry.record.present {
                return Err(Error::corrupt(format!(
                    "attendance for {} on day {} is stored but not present",
                    entry.identity, entry.day_index
                )));
            }
            if entry.record.day_index() != entry.day_index {
                return Err(Error::corrupt(format!(
                    "attendance for {} filed under day {} but timestamped on day {}",
                    entry.identity,
                    entry.day_index,
                    entry.record.day_index()
                )));
            }
            if entry.record.matric_number != student.matric_number {
                return Err(Error::corrupt(format!(
                    "attendance for {} carries matric number {} instead of {}",
                    entry.identity, entry.record.matric_number, student.matric_number
                )));
            }
            let days = attendance.entry(entry.identity.clone()).or_default();
            if days.insert(entry.day_index, entry.record).is_some() {
                return Err(Error::corrupt(format!(
                    "duplicate attendance for {} on day {}",
                    entry.identity, entry.day_index
                )));
            }
        }

        let mut attendance_counts: HashMap<Identity, u64> = HashMap::new();
        for entry in snapshot.attendance_counts {
            if entry.count == 0 {
                continue;
            }
            if attendance_counts
                .insert(entry.identity.clone(), entry.count)
                .is_some()
            {
                return Err(Error::corrupt(format!(
                    "duplicate attendance counter for {}",
                    entry.identity
                )));
            }
        }
        for identity in attendance_counts.keys() {
            if !attendance.contains_key(identity) {
                return Err(Error::corrupt(format!(
                    "attendance counter for {identity} without attendance records"
                )));
            }
        }
        for (identity, days) in &attendance {
            let counted = attendance_counts.get(identity).copied().unwrap_or(0);
            if counted != days.len() as u64 {
                return Err(Error::corrupt(format!(
                    "attendance counter for {identity} is {counted} but {} records exist",
                    days.len()
                )));
            }
        }

        tracing::debug!(
            owner = %snapshot.owner,
            students = students.len(),
            events = snapshot.events.len(),
            "restored ledger from snapshot"
        );

        Ok(AttendanceLedger::from_state(LedgerState {
            owner: snapshot.owner,
            active: snapshot.active,
            students,
            matric_index,
            attendance,
            attendance_counts,
            registered: snapshot.registered,
            registration_count: snapshot.registration_count,
            journal: snapshot.events,
        }))
    }
}
