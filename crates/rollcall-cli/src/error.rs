//! Error types for rollcall-cli

use thiserror::Error;

/// Result type alias for rollcall-cli operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in rollcall-cli
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Error from rollcall-core
    #[error("Core error: {0}")]
    Core(#[from] rollcall_core::Error),

    /// Error from rollcall-ledger
    #[error("Ledger error: {0}")]
    Ledger(#[from] rollcall_ledger::Error),

    /// Error from rollcall-api
    #[error("Server error: {0}")]
    Api(#[from] rollcall_api::Error),

    /// `inspect` was given nothing to read
    #[error("no state file given; pass --file or set ledger.state_file")]
    NoStateFile,

    /// The state file does not exist
    #[error("state file not found: {0}")]
    StateFileMissing(std::path::PathBuf),
}
