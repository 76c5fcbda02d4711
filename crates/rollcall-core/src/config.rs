//! Rollcall configuration.
//!
//! Loaded from TOML (see the crate README for the layout) with
//! `ROLLCALL_*` environment variables taking precedence over the file.

use std::net::SocketAddr;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::traits::ConfigManager;
use crate::types::Identity;

/// Environment variable overriding `ledger.owner`.
pub const ENV_OWNER: &str = "ROLLCALL_OWNER";
/// Environment variable overriding `ledger.state_file`.
pub const ENV_STATE_FILE: &str = "ROLLCALL_STATE_FILE";
/// Environment variable overriding `server.listen`.
pub const ENV_LISTEN: &str = "ROLLCALL_LISTEN";
/// Environment variable overriding `logging.level`.
pub const ENV_LOG_LEVEL: &str = "ROLLCALL_LOG_LEVEL";

/// Default listen address for the HTTP gateway.
pub const DEFAULT_LISTEN: &str = "127.0.0.1:8080";
/// Default header carrying the caller identity.
pub const DEFAULT_IDENTITY_HEADER: &str = "x-rollcall-identity";

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RollcallConfig {
    /// Ledger settings
    pub ledger: LedgerConfig,
    /// HTTP gateway settings
    pub server: ServerConfig,
    /// Logging settings
    pub logging: LoggingConfig,
}

/// Ledger ownership and persistence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Identity that owns a freshly created ledger.
    pub owner: String,
    /// Where the ledger snapshot lives. In-memory only when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_file: Option<PathBuf>,
}

/// HTTP gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address to bind.
    pub listen: String,
    /// Request header carrying the caller identity.
    pub identity_header: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: DEFAULT_LISTEN.to_string(),
            identity_header: DEFAULT_IDENTITY_HEADER.to_string(),
        }
    }
}

/// Logging.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl RollcallConfig {
    /// The configured owner, rejecting the null identity.
    pub fn owner_identity(&self) -> Result<Identity> {
        let owner = Identity::new(self.ledger.owner.trim());
        if owner.is_null() {
            return Err(Error::config(format!(
                "ledger.owner must be a non-null identity (set it in the config file or {ENV_OWNER})"
            )));
        }
        Ok(owner)
    }

    /// The parsed listen address.
    pub fn listen_addr(&self) -> Result<SocketAddr> {
        self.server.listen.parse().map_err(|e| {
            Error::config(format!(
                "invalid server.listen address {:?}: {e}",
                self.server.listen
            ))
        })
    }
}

impl ConfigManager for RollcallConfig {
    fn project_name() -> &'static str {
        "rollcall"
    }

    fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(owner) = lookup(ENV_OWNER) {
            self.ledger.owner = owner;
        }
        if let Some(path) = lookup(ENV_STATE_FILE) {
            self.ledger.state_file = if path.trim().is_empty() {
                None
            } else {
                Some(PathBuf::from(path))
            };
        }
        if let Some(listen) = lookup(ENV_LISTEN) {
            self.server.listen = listen;
        }
        if let Some(level) = lookup(ENV_LOG_LEVEL) {
            self.logging.level = level;
        }
    }

    fn validate(&self) -> Result<()> {
        self.listen_addr()?;
        if self.server.identity_header.trim().is_empty() {
            return Err(Error::config("server.identity_header must not be empty"));
        }
        Ok(())
    }

    fn to_env_vars(&self) -> Result<Vec<(String, String)>> {
        let mut vars = vec![
            (ENV_OWNER.to_string(), self.ledger.owner.clone()),
            (ENV_LISTEN.to_string(), self.server.listen.clone()),
            (ENV_LOG_LEVEL.to_string(), self.logging.level.clone()),
        ];
        if let Some(path) = &self.ledger.state_file {
            vars.push((ENV_STATE_FILE.to_string(), path.display().to_string()));
        }
        Ok(vars)
    }
}
