//! The attendance ledger.
//!
//! Owns the owner identity, the active flag, student records, the matric
//! index, attendance records and counters, the registered-identity list,
//! and the event journal. Every mutating operation validates first and
//! writes second, so a rejection never leaves partial state behind.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use rollcall_core::{DayIndex, Identity, MatricNumber, Timestamp};

use crate::error::{LedgerError, LedgerResult};
use crate::event::{EventSink, LedgerEvent};
use crate::records::{
    AttendanceRecord, AttendanceStatus, RosterEntry, StudentLookup, StudentRecord,
};

// ============================================================================
// State
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct LedgerState {
    pub(crate) owner: Identity,
    pub(crate) active: bool,
    pub(crate) students: HashMap<Identity, StudentRecord>,
    pub(crate) matric_index: HashMap<MatricNumber, Identity>,
    pub(crate) attendance: HashMap<Identity, BTreeMap<DayIndex, AttendanceRecord>>,
    pub(crate) attendance_counts: HashMap<Identity, u64>,
    pub(crate) registered: Vec<Identity>,
    pub(crate) registration_count: u64,
    pub(crate) journal: Vec<LedgerEvent>,
}

impl LedgerState {
    fn new(owner: Identity) -> Self {
        Self {
            owner,
            active: true,
            students: HashMap::new(),
            matric_index: HashMap::new(),
            attendance: HashMap::new(),
            attendance_counts: HashMap::new(),
            registered: Vec::new(),
            registration_count: 0,
            journal: Vec::new(),
        }
    }
}

/// A saved copy of the ledger state, produced by
/// [`AttendanceLedger::checkpoint`].
///
/// Pass it back to [`AttendanceLedger::commit`] or
/// [`AttendanceLedger::rollback`]; until then, events are held back from
/// sinks.
#[derive(Debug)]
#[must_use = "an open checkpoint holds events back from sinks until committed or rolled back"]
pub struct Checkpoint(LedgerState);

// ============================================================================
// AttendanceLedger
// ============================================================================

/// The attendance ledger.
///
/// Create one per deployment with [`AttendanceLedger::new`]; the creator
/// becomes the owner for the ledger's lifetime.
pub struct AttendanceLedger {
    pub(crate) state: LedgerState,
    sinks: Vec<Arc<dyn EventSink>>,
    holding: bool,
    pending: Vec<LedgerEvent>,
}

impl fmt::Debug for AttendanceLedger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttendanceLedger")
            .field("owner", &self.state.owner)
            .field("active", &self.state.active)
            .field("registration_count", &self.state.registration_count)
            .field("sinks", &self.sinks.len())
            .field("pending", &self.pending.len())
            .finish()
    }
}

impl AttendanceLedger {
    /// Creates an empty, active ledger owned by `owner`.
    ///
    /// Rejects the null identity with [`LedgerError::InvalidArgument`].
    pub fn new(owner: Identity) -> LedgerResult<Self> {
        if owner.is_null() {
            return Err(LedgerError::invalid("owner", "must not be the null identity"));
        }
        tracing::debug!(%owner, "created attendance ledger");
        Ok(Self::from_state(LedgerState::new(owner)))
    }

    pub(crate) fn from_state(state: LedgerState) -> Self {
        Self {
            state,
            sinks: Vec::new(),
            holding: false,
            pending: Vec::new(),
        }
    }

    /// Registers an observer that receives every future event.
    pub fn subscribe(&mut self, sink: Arc<dyn EventSink>) {
        self.sinks.push(sink);
    }

    // ------------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------------

    /// Registers `identity` as a student. Owner only.
    ///
    /// Checks, in order: caller is the owner; `identity` is not null and
    /// `matric_number` and `name` are not blank; neither `identity` nor
    /// `matric_number` is already bound.
    pub fn register_student(
        &mut self,
        caller: &Identity,
        identity: Identity,
        matric_number: MatricNumber,
        name: impl Into<String>,
        now: Timestamp,
    ) -> LedgerResult<LedgerEvent> {
        let name = name.into();
        self.require_owner(caller, "register students")?;

        if identity.is_null() {
            return Err(LedgerError::invalid("identity", "must not be the null identity"));
        }
        if matric_number.is_empty() {
            return Err(LedgerError::invalid("matric_number", "must not be empty"));
        }
        if name.trim().is_empty() {
            return Err(LedgerError::invalid("name", "must not be empty"));
        }
        if self.state.students.contains_key(&identity) {
            return Err(LedgerError::AlreadyExists {
                binding: "student record for identity",
                key: identity.to_string(),
            });
        }
        if self.state.matric_index.contains_key(&matric_number) {
            return Err(LedgerError::AlreadyExists {
                binding: "matric number",
                key: matric_number.to_string(),
            });
        }

        let record = StudentRecord {
            matric_number: matric_number.clone(),
            name: name.clone(),
            registered: true,
            registration_timestamp: now,
        };
        self.state.students.insert(identity.clone(), record);
        self.state
            .matric_index
            .insert(matric_number.clone(), identity.clone());
        self.state.registered.push(identity.clone());
        self.state.registration_count += 1;

        Ok(self.emit(LedgerEvent::UserRegistered {
            identity,
            matric_number,
            name,
        }))
    }

    /// Marks `identity` present for the day containing `now`.
    ///
    /// Checks, in order: the system is active; `identity` is registered;
    /// the day is not already marked.
    pub fn mark_attendance(
        &mut self,
        identity: &Identity,
        now: Timestamp,
    ) -> LedgerResult<LedgerEvent> {
        if !self.state.active {
            return Err(LedgerError::SystemInactive);
        }
        let matric_number = match self.state.students.get(identity) {
            Some(student) => student.matric_number.clone(),
            None => {
                return Err(LedgerError::NotRegistered {
                    identity: identity.clone(),
                });
            }
        };
        let day = DayIndex::from_timestamp(now);
        if self.is_attendance_present(identity, day) {
            return Err(LedgerError::AlreadyMarked {
                identity: identity.clone(),
                day,
            });
        }

        self.state.attendance.entry(identity.clone()).or_default().insert(
            day,
            AttendanceRecord {
                timestamp: now,
                present: true,
                matric_number: matric_number.clone(),
            },
        );
        *self
            .state
            .attendance_counts
            .entry(identity.clone())
            .or_insert(0) += 1;

        Ok(self.emit(LedgerEvent::AttendanceMarked {
            identity: identity.clone(),
            matric_number,
            day_index: day,
            timestamp: now,
        }))
    }

    /// Flips the active flag. Owner only.
    pub fn toggle_system_active(&mut self, caller: &Identity) -> LedgerResult<LedgerEvent> {
        self.require_owner(caller, "toggle the system state")?;
        self.state.active = !self.state.active;
        let active = self.state.active;
        Ok(self.emit(LedgerEvent::SystemStateChanged { active }))
    }

    // ------------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------------

    /// Whether `identity` marked attendance on `day`.
    pub fn is_attendance_present(&self, identity: &Identity, day: DayIndex) -> bool {
        self.attendance_record(identity, day)
            .is_some_and(|record| record.present)
    }

    /// Number of days `identity` has marked; 0 when unknown.
    pub fn attendance_count(&self, identity: &Identity) -> u64 {
        self.state
            .attendance_counts
            .get(identity)
            .copied()
            .unwrap_or(0)
    }

    /// `(timestamp, present)` for `identity` on `day`; `(0, false)` if absent.
    pub fn attendance_status(&self, identity: &Identity, day: DayIndex) -> AttendanceStatus {
        self.attendance_record(identity, day)
            .map(AttendanceStatus::from)
            .unwrap_or_default()
    }

    /// The full attendance record for `identity` on `day`, if any.
    pub fn attendance_record(&self, identity: &Identity, day: DayIndex) -> Option<&AttendanceRecord> {
        self.state
            .attendance
            .get(identity)
            .and_then(|days| days.get(&day))
    }

    /// Days `identity` has marked, ascending.
    pub fn attendance_history(&self, identity: &Identity) -> Vec<DayIndex> {
        self.state
            .attendance
            .get(identity)
            .map(|days| days.keys().copied().collect())
            .unwrap_or_default()
    }

    /// The student record for `identity`, or the empty unregistered view.
    pub fn student_by_identity(&self, identity: &Identity) -> StudentRecord {
        self.state
            .students
            .get(identity)
            .cloned()
            .unwrap_or_default()
    }

    /// The student bound to `matric_number`.
    pub fn student_by_matric(&self, matric_number: &MatricNumber) -> LedgerResult<StudentLookup> {
        let identity = self.resolve_identity_by_matric(matric_number)?;
        let student = self.student_by_identity(&identity);
        Ok(StudentLookup { identity, student })
    }

    /// The identity bound to `matric_number`.
    pub fn resolve_identity_by_matric(&self, matric_number: &MatricNumber) -> LedgerResult<Identity> {
        self.state
            .matric_index
            .get(matric_number)
            .cloned()
            .ok_or_else(|| LedgerError::NotFound {
                matric: matric_number.clone(),
            })
    }

    /// Every registered identity, in registration order.
    pub fn registered_identities(&self) -> &[Identity] {
        &self.state.registered
    }

    /// Every registered student with their presence on `day`, in
    /// registration order.
    pub fn roster(&self, day: DayIndex) -> Vec<RosterEntry> {
        self.state
            .registered
            .iter()
            .filter_map(|identity| {
                self.state.students.get(identity).map(|student| RosterEntry {
                    identity: identity.clone(),
                    matric_number: student.matric_number.clone(),
                    name: student.name.clone(),
                    present: self.is_attendance_present(identity, day),
                })
            })
            .collect()
    }

    /// The owner identity.
    pub fn owner(&self) -> &Identity {
        &self.state.owner
    }

    /// Whether attendance marking is enabled.
    pub fn is_active(&self) -> bool {
        self.state.active
    }

    /// Number of successful registrations.
    pub fn registration_count(&self) -> u64 {
        self.state.registration_count
    }

    /// Every event emitted so far, oldest first.
    pub fn events(&self) -> &[LedgerEvent] {
        &self.state.journal
    }

    // ------------------------------------------------------------------------
    // Checkpoints
    // ------------------------------------------------------------------------

    /// Saves the current state and starts holding events back from sinks.
    ///
    /// Events emitted after this still reach the journal at once. Sinks
    /// receive them on [`commit`](Self::commit) and never on
    /// [`rollback`](Self::rollback). Only one checkpoint may be open at a
    /// time.
    pub fn checkpoint(&mut self) -> Checkpoint {
        self.holding = true;
        Checkpoint(self.state.clone())
    }

    /// Keeps everything applied since `checkpoint` and delivers the held
    /// events to sinks.
    pub fn commit(&mut self, checkpoint: Checkpoint) {
        drop(checkpoint);
        self.holding = false;
        for event in std::mem::take(&mut self.pending) {
            self.deliver(&event);
        }
    }

    /// Restores the state saved by `checkpoint`. Observers are kept.
    ///
    /// Events emitted since the checkpoint are dropped from the journal and
    /// are never delivered to sinks.
    pub fn rollback(&mut self, checkpoint: Checkpoint) {
        let discarded = self
            .state
            .journal
            .len()
            .saturating_sub(checkpoint.0.journal.len());
        if discarded > 0 {
            tracing::warn!(discarded_events = discarded, "rolling ledger back to checkpoint");
        }
        self.state = checkpoint.0;
        self.holding = false;
        self.pending.clear();
    }

    // ------------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------------

    fn require_owner(&self, caller: &Identity, operation: &'static str) -> LedgerResult<()> {
        if *caller != self.state.owner {
            tracing::debug!(%caller, operation, "rejected non-owner call");
            return Err(LedgerError::unauthorized(caller, operation));
        }
        Ok(())
    }

    fn emit(&mut self, event: LedgerEvent) -> LedgerEvent {
        self.state.journal.push(event.clone());
        if self.holding {
            self.pending.push(event.clone());
        } else {
            self.deliver(&event);
        }
        event
    }

    fn deliver(&self, event: &LedgerEvent) {
        for sink in &self.sinks {
            sink.publish(event);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
