//! `serve` and `inspect`.

use std::path::{Path, PathBuf};

use rollcall_api::Server;
use rollcall_core::{DayIndex, Identity, MatricNumber, RollcallConfig};
use rollcall_ledger::{AttendanceLedger, SnapshotStore};
use serde::Serialize;
use tracing::info;

use crate::error::{Error, Result};

/// Runs the gateway until Ctrl-C.
pub async fn serve(config: &RollcallConfig) -> Result<()> {
    let server = Server::from_config(config)?;
    info!(
        addr = %server.addr(),
        state_file = ?config.ledger.state_file,
        "configuration loaded"
    );
    server.serve(shutdown_signal()).await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for Ctrl-C; shutting down");
        return;
    }
    info!("received Ctrl-C, shutting down");
}

/// Summary of a persisted ledger.
#[derive(Debug, Clone, Serialize)]
pub struct InspectReport {
    /// File that was read
    pub path: PathBuf,
    /// Ledger owner
    pub owner: Identity,
    /// Whether marking is enabled
    pub active: bool,
    /// Registered students
    pub registration_count: u64,
    /// Attendance marks across all students
    pub attendance_marks: u64,
    /// Journal length
    pub events: usize,
    /// Most recent day any student marked
    pub last_day: Option<DayIndex>,
    /// Per-student detail, in registration order
    pub students: Vec<StudentSummary>,
}

/// One student's line in an [`InspectReport`].
#[derive(Debug, Clone, Serialize)]
pub struct StudentSummary {
    /// Student identity
    pub identity: Identity,
    /// Matric number
    pub matric_number: MatricNumber,
    /// Name
    pub name: String,
    /// Days marked
    pub days_present: u64,
}

/// Picks the state file: an explicit `--file`, else the configured one.
pub fn resolve_state_file(file: Option<PathBuf>, config: &RollcallConfig) -> Result<PathBuf> {
    file.or_else(|| config.ledger.state_file.clone())
        .ok_or(Error::NoStateFile)
}

/// Loads and validates a state file and summarizes it.
pub fn inspect(path: &Path) -> Result<InspectReport> {
    let snapshot = SnapshotStore::new(path)
        .load()?
        .ok_or_else(|| Error::StateFileMissing(path.to_path_buf()))?;
    let ledger = AttendanceLedger::from_snapshot(snapshot)?;
    Ok(report(path, &ledger))
}

fn report(path: &Path, ledger: &AttendanceLedger) -> InspectReport {
    let students: Vec<StudentSummary> = ledger
        .registered_identities()
        .iter()
        .map(|identity| {
            let record = ledger.student_by_identity(identity);
            StudentSummary {
                identity: identity.clone(),
                matric_number: record.matric_number,
                name: record.name,
                days_present: ledger.attendance_count(identity),
            }
        })
        .collect();
    let last_day = ledger
        .registered_identities()
        .iter()
        .filter_map(|identity| ledger.attendance_history(identity).last().copied())
        .max();

    InspectReport {
        path: path.to_path_buf(),
        owner: ledger.owner().clone(),
        active: ledger.is_active(),
        registration_count: ledger.registration_count(),
        attendance_marks: students.iter().map(|s| s.days_present).sum(),
        events: ledger.events().len(),
        last_day,
        students,
    }
}

/// Renders a report for the terminal.
pub fn render_report(report: &InspectReport) -> String {
    let mut out = format!(
        "ledger:   {}\nowner:    {}\nactive:   {}\nstudents: {}\nmarks:    {}\nevents:   {}\n",
        report.path.display(),
        report.owner,
        report.active,
        report.registration_count,
        report.attendance_marks,
        report.events,
    );
    if let Some(day) = report.last_day {
        out.push_str(&format!("last day: {} ({})\n", day, day.start()));
    }
    for s in &report.students {
        out.push_str(&format!(
            "  {}  {:<12} {:<24} {} day(s)\n",
            s.identity, s.matric_number.as_str(), s.name, s.days_present
        ));
    }
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use rollcall_core::{ONE_DAY_SECS, Timestamp};

    const T0: u64 = 1_718_000_000;

    fn seeded_store(path: &Path) {
        let owner = Identity::new("0xowner");
        let mut ledger = AttendanceLedger::new(owner.clone()).unwrap();
        for (i, (id, matric, name)) in [("0xa", "CSC001", "Ada"), ("0xb", "CSC002", "Bo")]
            .into_iter()
            .enumerate()
        {
            ledger
                .register_student(
                    &owner,
                    Identity::new(id),
                    MatricNumber::new(matric),
                    name,
                    Timestamp::from_secs(T0 + i as u64),
                )
                .unwrap();
        }
        let a = Identity::new("0xa");
        ledger.mark_attendance(&a, Timestamp::from_secs(T0)).unwrap();
        ledger
            .mark_attendance(&a, Timestamp::from_secs(T0 + ONE_DAY_SECS))
            .unwrap();
        SnapshotStore::new(path).save(&ledger.snapshot()).unwrap();
    }

    #[test]
    fn test_inspect_summarizes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.json");
        seeded_store(&path);

        let report = inspect(&path).unwrap();
        assert_eq!(report.owner.as_str(), "0xowner");
        assert_eq!(report.registration_count, 2);
        assert_eq!(report.attendance_marks, 2);
        assert_eq!(report.events, 4);
        assert_eq!(report.last_day, Some(DayIndex::new(T0 / ONE_DAY_SECS + 1)));
        assert_eq!(report.students[0].name, "Ada");
        assert_eq!(report.students[1].days_present, 0);

        let text = render_report(&report);
        assert!(text.contains("students: 2"));
        assert!(text.contains("CSC002"));
    }

    #[test]
    fn test_inspect_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = inspect(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, Error::StateFileMissing(_)));
    }

    #[test]
    fn test_inspect_rejects_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(inspect(&path).unwrap_err(), Error::Ledger(_)));
    }

    #[test]
    fn test_resolve_state_file() {
        let mut config = RollcallConfig::default();
        assert!(matches!(
            resolve_state_file(None, &config),
            Err(Error::NoStateFile)
        ));

        config.ledger.state_file = Some(PathBuf::from("/var/lib/rollcall.json"));
        assert_eq!(
            resolve_state_file(None, &config).unwrap(),
            PathBuf::from("/var/lib/rollcall.json")
        );
        assert_eq!(
            resolve_state_file(Some(PathBuf::from("x.json")), &config).unwrap(),
            PathBuf::from("x.json")
        );
    }
}
