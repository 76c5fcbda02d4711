//! # rollcall-api
//!
//! HTTP gateway for the Rollcall attendance ledger.
//!
//! This crate puts the ledger on the network:
//! - JSON endpoints for every ledger operation
//! - Caller identity taken from a configurable request header
//! - `now` supplied by an injected [`Clock`](rollcall_core::Clock)
//! - One ledger call at a time, behind an async mutex
//! - Snapshot persistence after each successful mutation, with rollback
//!   when the write fails

#![warn(missing_docs)]
#![warn(clippy::all)]
#![forbid(unsafe_code)]

pub mod error;
pub mod extract;
pub mod identity;
pub mod routes;
pub mod server;
pub mod state;

pub use error::{ApiError, Error, Result};
pub use identity::Caller;
pub use server::Server;
pub use state::AppState;
