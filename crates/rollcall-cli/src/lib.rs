//! # rollcall-cli
//!
//! The `rollcall` binary: runs the HTTP gateway, edits its configuration,
//! and summarizes persisted ledger files.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![forbid(unsafe_code)]

pub mod cli;
pub mod commands;
pub mod config_handlers;
pub mod error;
pub mod logging;

pub use error::{Error, Result};
