//! JSON snapshot persistence.

use std::io::Write;
use std::path::{Path, PathBuf};

use rollcall_core::Identity;

use crate::error::{Error, Result};
use crate::ledger::AttendanceLedger;
use crate::snapshot::Snapshot;

/// Reads and writes ledger snapshots at a fixed path.
///
/// Saves go to a hidden sibling file that is flushed to disk and then
/// renamed into place, so readers see either the previous snapshot or the
/// new one. The parent directory is not synced, so a crash right after a
/// save may still surface the previous snapshot.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    /// Creates a store backed by `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The snapshot file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "ledger.json".to_string());
        self.path.with_file_name(format!(".{name}.tmp"))
    }

    /// Loads the snapshot, or `None` when the file does not exist yet.
    pub fn load(&self) -> Result<Option<Snapshot>> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(Error::io_with_path(e, &self.path)),
        };
        let snapshot = serde_json::from_str(&content)?;
        Ok(Some(snapshot))
    }

    /// Writes the snapshot, creating parent directories as needed.
    pub fn save(&self, snapshot: &Snapshot) -> Result<()> {
        self.write_encoded(&Self::encode(snapshot)?)
    }

    /// Serializes a snapshot to the bytes [`save`](Self::save) writes.
    pub fn encode(snapshot: &Snapshot) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(snapshot)?)
    }

    /// Writes bytes produced by [`encode`](Self::encode).
    ///
    /// On failure the temp file is removed and the previous snapshot, if
    /// any, is left in place.
    pub fn write_encoded(&self, bytes: &[u8]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| Error::io_with_path(e, parent))?;
            }
        }
        let tmp = self.temp_path();
        let written = write_synced(&tmp, bytes)
            .map_err(|e| Error::io_with_path(e, &tmp))
            .and_then(|()| {
                std::fs::rename(&tmp, &self.path).map_err(|e| Error::io_with_path(e, &self.path))
            });
        if let Err(e) = written {
            if let Err(cleanup) = std::fs::remove_file(&tmp) {
                if cleanup.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!(path = %tmp.display(), error = %cleanup, "failed to remove temp snapshot");
                }
            }
            return Err(e);
        }
        tracing::trace!(path = %self.path.display(), "saved ledger snapshot");
        Ok(())
    }

    /// Opens the persisted ledger, or creates a new one owned by `owner`.
    ///
    /// An existing snapshot keeps its own owner; a differing `owner` is
    /// logged and ignored.
    pub fn open_or_create(&self, owner: Identity) -> Result<AttendanceLedger> {
        match self.load()? {
            Some(snapshot) => {
                if snapshot.owner != owner {
                    tracing::warn!(
                        configured = %owner,
                        persisted = %snapshot.owner,
                        "configured owner differs from persisted ledger owner; keeping persisted owner"
                    );
                }
                tracing::info!(path = %self.path.display(), "loaded ledger snapshot");
                AttendanceLedger::from_snapshot(snapshot)
            }
            None => {
                tracing::info!(path = %self.path.display(), %owner, "creating new ledger");
                let ledger = AttendanceLedger::new(owner)?;
                self.save(&ledger.snapshot())?;
                Ok(ledger)
            }
        }
    }
}

fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = std::fs::File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use rollcall_core::{MatricNumber, Timestamp};

    #[test]
    fn test_load_missing_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path().join("ledger.json"));
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path().join("nested/dir/ledger.json"));

        let owner = Identity::new("0xowner");
        let mut ledger = AttendanceLedger::new(owner.clone()).unwrap();
        ledger
            .register_student(
                &owner,
                Identity::new("0xalice"),
                MatricNumber::new("CSC001"),
                "Alice",
                Timestamp::from_secs(10),
            )
            .unwrap();
        store.save(&ledger.snapshot()).unwrap();

        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded, ledger.snapshot());
        assert!(!store.temp_path().exists());
    }

    #[test]
    fn test_open_or_create_new_then_existing() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path().join("ledger.json"));
        let owner = Identity::new("0xowner");

        let mut ledger = store.open_or_create(owner.clone()).unwrap();
        assert!(store.path().exists());
        ledger.toggle_system_active(&owner).unwrap();
        store.save(&ledger.snapshot()).unwrap();

        let reopened = store.open_or_create(Identity::new("0xsomeone-else")).unwrap();
        assert_eq!(reopened.owner(), &owner);
        assert!(!reopened.is_active());
    }

    #[test]
    fn test_open_or_create_rejects_null_owner() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path().join("ledger.json"));
        let err = store.open_or_create(Identity::null()).unwrap_err();
        assert!(matches!(err, Error::Ledger(_)));
        assert!(!store.path().exists());
    }

    #[test]
    fn test_failed_rename_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.json");
        std::fs::create_dir(&path).unwrap();
        let store = SnapshotStore::new(&path);

        let ledger = AttendanceLedger::new(Identity::new("0xowner")).unwrap();
        let err = store.save(&ledger.snapshot()).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
        assert!(!store.temp_path().exists());
        assert!(path.is_dir());
    }

    #[test]
    fn test_encode_then_write_matches_save() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path().join("ledger.json"));
        let ledger = AttendanceLedger::new(Identity::new("0xowner")).unwrap();

        let bytes = SnapshotStore::encode(&ledger.snapshot()).unwrap();
        store.write_encoded(&bytes).unwrap();
        assert_eq!(std::fs::read(store.path()).unwrap(), bytes);
        assert_eq!(store.load().unwrap().unwrap(), ledger.snapshot());
    }

    #[test]
    fn test_load_garbage_is_serialization_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = SnapshotStore::new(&path).load().unwrap_err();
        assert!(matches!(err, Error::Serialization(_)));
    }
}
