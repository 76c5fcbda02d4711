//! Error types for rollcall-ledger
//!
//! [`LedgerError`] is the rejection taxonomy: what a caller gets back when
//! an operation would violate a ledger rule. [`Error`] covers everything
//! around the ledger (snapshots, files) and wraps rejections when they
//! surface through those paths.

use std::path::PathBuf;

use rollcall_core::{DayIndex, Identity, MatricNumber};
use thiserror::Error;

/// Result type alias for ledger operations.
pub type LedgerResult<T> = std::result::Result<T, LedgerError>;

/// Result type alias for rollcall-ledger storage operations
pub type Result<T> = std::result::Result<T, Error>;

/// A rejected ledger operation. No state was changed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Caller lacks the owner privilege the operation requires.
    #[error("unauthorized: {caller} may not {operation}")]
    Unauthorized {
        /// Who attempted the call
        caller: Identity,
        /// Operation that was attempted
        operation: &'static str,
    },

    /// A required argument was empty or the null identity.
    #[error("invalid argument: {field} {reason}")]
    InvalidArgument {
        /// Offending argument
        field: &'static str,
        /// What is wrong with it
        reason: &'static str,
    },

    /// A uniqueness rule would be broken.
    #[error("already exists: {binding} {key}")]
    AlreadyExists {
        /// Which binding collided
        binding: &'static str,
        /// The colliding key
        key: String,
    },

    /// The identity has no student record.
    #[error("not registered: {identity}")]
    NotRegistered {
        /// Identity that is not a student
        identity: Identity,
    },

    /// Attendance for this identity and day already exists.
    #[error("attendance already marked for {identity} on day {day}")]
    AlreadyMarked {
        /// Student identity
        identity: Identity,
        /// Day that is already marked
        day: DayIndex,
    },

    /// Attendance marking is switched off.
    #[error("attendance system is inactive")]
    SystemInactive,

    /// No identity is bound to the matric number.
    #[error("no student with matric number {matric}")]
    NotFound {
        /// Matric number that was looked up
        matric: MatricNumber,
    },
}

/// Coarse classification of a [`LedgerError`], stable across releases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// See [`LedgerError::Unauthorized`]
    Unauthorized,
    /// See [`LedgerError::InvalidArgument`]
    InvalidArgument,
    /// See [`LedgerError::AlreadyExists`]
    AlreadyExists,
    /// See [`LedgerError::NotRegistered`]
    NotRegistered,
    /// See [`LedgerError::AlreadyMarked`]
    AlreadyMarked,
    /// See [`LedgerError::SystemInactive`]
    SystemInactive,
    /// See [`LedgerError::NotFound`]
    NotFound,
}

impl ErrorKind {
    /// Machine-readable code, e.g. `"already_marked"`.
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::InvalidArgument => "invalid_argument",
            ErrorKind::AlreadyExists => "already_exists",
            ErrorKind::NotRegistered => "not_registered",
            ErrorKind::AlreadyMarked => "already_marked",
            ErrorKind::SystemInactive => "system_inactive",
            ErrorKind::NotFound => "not_found",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl LedgerError {
    /// Returns the kind of this rejection.
    pub fn kind(&self) -> ErrorKind {
        match self {
            LedgerError::Unauthorized { .. } => ErrorKind::Unauthorized,
            LedgerError::InvalidArgument { .. } => ErrorKind::InvalidArgument,
            LedgerError::AlreadyExists { .. } => ErrorKind::AlreadyExists,
            LedgerError::NotRegistered { .. } => ErrorKind::NotRegistered,
            LedgerError::AlreadyMarked { .. } => ErrorKind::AlreadyMarked,
            LedgerError::SystemInactive => ErrorKind::SystemInactive,
            LedgerError::NotFound { .. } => ErrorKind::NotFound,
        }
    }

    pub(crate) fn unauthorized(caller: &Identity, operation: &'static str) -> Self {
        LedgerError::Unauthorized {
            caller: caller.clone(),
            operation,
        }
    }

    pub(crate) fn invalid(field: &'static str, reason: &'static str) -> Self {
        LedgerError::InvalidArgument { field, reason }
    }
}

/// Errors that can occur in rollcall-ledger storage paths
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Error from rollcall-core
    #[error("Core error: {0}")]
    Core(#[from] rollcall_core::Error),

    /// A ledger rule rejected the operation
    #[error("Ledger rejected operation: {0}")]
    Ledger(#[from] LedgerError),

    /// I/O error on the snapshot file
    #[error("I/O error at {path}: {source}")]
    Io {
        /// File being read or written
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Snapshot parsed but breaks a ledger invariant
    #[error("Corrupt snapshot: {message}")]
    CorruptSnapshot {
        /// Which invariant was violated
        message: String,
    },
}

impl Error {
    /// Creates a corrupt-snapshot error.
    pub fn corrupt<S: Into<String>>(message: S) -> Self {
        Error::CorruptSnapshot {
            message: message.into(),
        }
    }

    /// Wraps an I/O error with the path it occurred on.
    pub fn io_with_path(source: std::io::Error, path: impl Into<PathBuf>) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}
