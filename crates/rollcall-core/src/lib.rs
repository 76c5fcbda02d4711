//! Rollcall Core: shared types, clock, configuration, and errors.
//!
//! This crate provides the foundational types used across all Rollcall crates.
//! It has no internal Rollcall dependencies (dependency level 0).
//!
//! # Modules
//!
//! - [`error`]: Error types and Result alias
//! - [`types`]: Identity, matric number, timestamp, and day-index values
//! - [`clock`]: Sources of "now"
//! - [`config`]: Workspace configuration
//! - [`traits`]: The [`ConfigManager`] trait

#![doc = include_str!("../README.md")]

pub mod clock;
pub mod config;
pub mod error;
pub mod traits;
pub mod types;

// Re-export key types at crate root for convenience
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::RollcallConfig;
pub use error::{Error, Result};
pub use traits::ConfigManager;
pub use types::{DayIndex, Identity, MatricNumber, ONE_DAY_SECS, Timestamp};
