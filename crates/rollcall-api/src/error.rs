//! Error types for rollcall-api
//!
//! [`Error`] covers server startup and shutdown. [`ApiError`] is what a
//! single request can fail with; it renders itself as a JSON error body.

use axum::Json;
use axum::response::{IntoResponse, Response};
use http::StatusCode;
use rollcall_ledger::{ErrorKind, LedgerError};
use thiserror::Error;

/// Result type alias for rollcall-api operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur starting or running the server
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Error from rollcall-core
    #[error("Core error: {0}")]
    Core(#[from] rollcall_core::Error),

    /// Error from rollcall-ledger
    #[error("Ledger error: {0}")]
    Ledger(#[from] rollcall_ledger::Error),

    /// Could not bind the listen address
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// Address that could not be bound
        addr: std::net::SocketAddr,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The server stopped with an I/O error
    #[error("HTTP server error: {0}")]
    Serve(#[source] std::io::Error),
}

/// Why a single request failed.
#[derive(Error, Debug)]
pub enum ApiError {
    /// The ledger rejected the call
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// No caller identity header on a request that needs one
    #[error("missing caller identity header {header:?}")]
    MissingIdentity {
        /// Header that was expected
        header: String,
    },

    /// The request body or path could not be decoded
    #[error("malformed {what}: {message}")]
    Malformed {
        /// Which part of the request was bad
        what: &'static str,
        /// Decoder message
        message: String,
    },

    /// Persisting the ledger failed; the mutation was rolled back
    #[error("storage failure: {0}")]
    Storage(#[from] rollcall_ledger::Error),
}

impl ApiError {
    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Ledger(e) => match e.kind() {
                ErrorKind::Unauthorized | ErrorKind::NotRegistered => StatusCode::FORBIDDEN,
                ErrorKind::InvalidArgument => StatusCode::BAD_REQUEST,
                ErrorKind::AlreadyExists | ErrorKind::AlreadyMarked => StatusCode::CONFLICT,
                ErrorKind::SystemInactive => StatusCode::LOCKED,
                ErrorKind::NotFound => StatusCode::NOT_FOUND,
            },
            ApiError::MissingIdentity { .. } => StatusCode::UNAUTHORIZED,
            ApiError::Malformed { .. } => StatusCode::BAD_REQUEST,
            ApiError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable category for the error body.
    pub fn category(&self) -> &'static str {
        match self {
            ApiError::Ledger(e) => e.kind().code(),
            ApiError::MissingIdentity { .. } => "authentication",
            ApiError::Malformed { .. } => ErrorKind::InvalidArgument.code(),
            ApiError::Storage(_) => "storage",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, %status, "request rejected");
        }
        let body = serde_json::json!({
            "error": {
                "category": self.category(),
                "message": self.to_string(),
            }
        });
        (status, Json(body)).into_response()
    }
}
