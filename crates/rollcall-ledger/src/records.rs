//! Student and attendance records, and the read views built from them.

use rollcall_core::{DayIndex, Identity, MatricNumber, Timestamp};
use serde::{Deserialize, Serialize};

/// A registered student.
///
/// The default value is the "unregistered" view: empty strings, `false`,
/// and a zero timestamp.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentRecord {
    /// External enrollment number, unique across students
    pub matric_number: MatricNumber,
    /// Display name
    pub name: String,
    /// Always `true` for a stored record
    pub registered: bool,
    /// When the owner registered the student
    pub registration_timestamp: Timestamp,
}

/// One day's attendance mark for one student.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    /// When the student marked attendance
    pub timestamp: Timestamp,
    /// Always `true` for a stored record
    pub present: bool,
    /// Student's matric number at marking time
    pub matric_number: MatricNumber,
}

impl AttendanceRecord {
    /// Day bucket of this mark.
    pub fn day_index(&self) -> DayIndex {
        self.timestamp.day_index()
    }
}

/// `(timestamp, present)` for one identity and day; `(0, false)` if absent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceStatus {
    /// When attendance was marked
    pub timestamp: Timestamp,
    /// Whether attendance was marked
    pub present: bool,
}

impl From<&AttendanceRecord> for AttendanceStatus {
    fn from(record: &AttendanceRecord) -> Self {
        Self {
            timestamp: record.timestamp,
            present: record.present,
        }
    }
}

/// A student found by matric number, with the identity it resolved to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentLookup {
    /// Identity bound to the matric number
    pub identity: Identity,
    /// The student's record
    #[serde(flatten)]
    pub student: StudentRecord,
}

/// One line of a day's roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    /// Student identity
    pub identity: Identity,
    /// Student matric number
    pub matric_number: MatricNumber,
    /// Student name
    pub name: String,
    /// Whether the student marked attendance that day
    pub present: bool,
}
