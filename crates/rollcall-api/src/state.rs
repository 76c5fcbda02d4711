//! Shared state behind every handler.

use std::sync::Arc;

use rollcall_core::Clock;
use rollcall_ledger::{AttendanceLedger, LedgerEvent, LedgerResult, Snapshot, SnapshotStore};
use tokio::sync::Mutex;

use crate::error::ApiError;

/// The ledger, its clock, and where it is persisted.
///
/// The mutex is the sequencer: calls are applied one at a time in the
/// order they acquire it.
pub struct AppState {
    ledger: Mutex<AttendanceLedger>,
    clock: Arc<dyn Clock>,
    store: Option<SnapshotStore>,
    identity_header: String,
}

impl AppState {
    /// Wraps a ledger for serving.
    pub fn new(
        ledger: AttendanceLedger,
        clock: Arc<dyn Clock>,
        store: Option<SnapshotStore>,
        identity_header: impl Into<String>,
    ) -> Self {
        Self {
            ledger: Mutex::new(ledger),
            clock,
            store,
            identity_header: identity_header.into(),
        }
    }

    /// Header the caller identity is read from.
    pub fn identity_header(&self) -> &str {
        &self.identity_header
    }

    /// Current time according to the configured clock.
    pub fn now(&self) -> rollcall_core::Timestamp {
        self.clock.now()
    }

    /// Runs a read against the ledger.
    pub async fn read<T, F>(&self, f: F) -> T
    where
        F: FnOnce(&AttendanceLedger) -> T,
    {
        let ledger = self.ledger.lock().await;
        f(&ledger)
    }

    /// Runs a mutation and persists the result.
    ///
    /// If the snapshot cannot be written the mutation is rolled back and
    /// the request fails, so the in-memory ledger never runs ahead of
    /// what is on disk. Event sinks only hear about mutations that were
    /// written.
    pub async fn mutate<F>(&self, op: F) -> Result<LedgerEvent, ApiError>
    where
        F: FnOnce(&mut AttendanceLedger) -> LedgerResult<LedgerEvent>,
    {
        let mut ledger = self.ledger.lock().await;
        let Some(store) = &self.store else {
            return Ok(op(&mut ledger)?);
        };

        let checkpoint = ledger.checkpoint();
        let event = match op(&mut ledger) {
            Ok(event) => event,
            Err(e) => {
                ledger.rollback(checkpoint);
                return Err(e.into());
            }
        };

        // The lock stays held across the write so disk order matches apply order
        let snapshot = ledger.snapshot();
        if let Err(e) = persist(store, &snapshot).await {
            tracing::error!(
                error = %e,
                path = %store.path().display(),
                operation = event.name(),
                "failed to persist ledger"
            );
            ledger.rollback(checkpoint);
            return Err(ApiError::Storage(e));
        }
        ledger.commit(checkpoint);
        Ok(event)
    }
}

async fn persist(store: &SnapshotStore, snapshot: &Snapshot) -> rollcall_ledger::Result<()> {
    let bytes = SnapshotStore::encode(snapshot)?;
    let store = store.clone();
    let path = store.path().to_path_buf();
    tokio::task::spawn_blocking(move || store.write_encoded(&bytes))
        .await
        .map_err(|e| rollcall_ledger::Error::io_with_path(std::io::Error::other(e), path))?
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("store", &self.store)
            .field("identity_header", &self.identity_header)
            .finish_non_exhaustive()
    }
}
