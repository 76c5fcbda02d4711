//! Server construction and the serve loop.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use rollcall_core::{RollcallConfig, SystemClock};
use rollcall_ledger::{AttendanceLedger, SnapshotStore, TracingSink};
use tokio::net::TcpListener;
use tracing::info;

use crate::error::{Error, Result};
use crate::routes;
use crate::state::AppState;

/// A configured gateway, ready to serve.
#[derive(Debug)]
pub struct Server {
    state: Arc<AppState>,
    addr: SocketAddr,
}

impl Server {
    /// Wraps existing state.
    pub fn new(state: Arc<AppState>, addr: SocketAddr) -> Self {
        Self { state, addr }
    }

    /// Builds a server from configuration.
    ///
    /// With a state file configured the ledger is loaded from it (or created
    /// and written there); otherwise it lives in memory only.
    pub fn from_config(config: &RollcallConfig) -> Result<Self> {
        let owner = config.owner_identity()?;
        let addr = config.listen_addr()?;

        let store = config.ledger.state_file.as_ref().map(SnapshotStore::new);
        let mut ledger = match &store {
            Some(store) => store.open_or_create(owner)?,
            None => {
                info!(%owner, "state file not configured; ledger is in-memory only");
                AttendanceLedger::new(owner).map_err(rollcall_ledger::Error::from)?
            }
        };
        ledger.subscribe(Arc::new(TracingSink));

        let state = AppState::new(
            ledger,
            Arc::new(SystemClock),
            store,
            config.server.identity_header.clone(),
        );
        Ok(Self::new(Arc::new(state), addr))
    }

    /// Address the server will bind.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Shared state, for inspection.
    pub fn state(&self) -> &Arc<AppState> {
        &self.state
    }

    /// The router over this server's state.
    pub fn router(&self) -> Router {
        routes::router(self.state.clone())
    }

    /// Binds the configured address and serves until `shutdown` resolves.
    pub async fn serve<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(self.addr)
            .await
            .map_err(|source| Error::Bind {
                addr: self.addr,
                source,
            })?;
        self.serve_on(listener, shutdown).await
    }

    /// Serves on an already-bound listener until `shutdown` resolves.
    pub async fn serve_on<F>(self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let local = listener.local_addr().map_err(Error::Serve)?;
        info!(addr = %local, "starting rollcall gateway");

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(Error::Serve)?;

        info!("rollcall gateway stopped");
        Ok(())
    }
}
