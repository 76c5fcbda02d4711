//! Configuration management trait.
//!
//! [`ConfigManager`] gives any serde-friendly config struct a standard
//! lifecycle: locate the file, parse it, layer environment overrides on top,
//! validate, and render back to TOML or environment variables. The CLI's
//! `config` subcommands are written against this trait.

use std::path::PathBuf;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{Error, Result};

/// Standard lifecycle for a TOML-backed configuration type.
pub trait ConfigManager: Serialize + DeserializeOwned + Default {
    /// Short project name, used for the config directory and env prefix.
    fn project_name() -> &'static str;

    /// Environment variable naming an explicit config file.
    fn config_env_var() -> String {
        format!("{}_CONFIG", Self::project_name().to_uppercase())
    }

    /// Platform default location: `<config_dir>/<project>/config.toml`.
    fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(Self::project_name()).join("config.toml"))
    }

    /// Resolves the config file: explicit path, then env var, then default.
    fn resolve_config_path(explicit: Option<&str>) -> Option<PathBuf> {
        if let Some(p) = explicit {
            return Some(PathBuf::from(p));
        }
        if let Ok(p) = std::env::var(Self::config_env_var()) {
            if !p.trim().is_empty() {
                return Some(PathBuf::from(p));
            }
        }
        Self::default_config_path()
    }

    /// Applies overrides from an environment lookup function.
    fn apply_env_overrides<F>(&mut self, _lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
    }

    /// Checks cross-field consistency after loading.
    fn validate(&self) -> Result<()> {
        Ok(())
    }

    /// Loads configuration using the process environment for overrides.
    fn load(config_path: Option<&str>) -> Result<Self> {
        Self::load_with_env(config_path, |key| std::env::var(key).ok())
    }

    /// Loads configuration with an explicit environment lookup.
    ///
    /// A missing file is not an error: defaults are used and overrides
    /// still apply.
    fn load_with_env<F>(config_path: Option<&str>, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match Self::resolve_config_path(config_path) {
            Some(path) if path.exists() => {
                tracing::debug!(path = %path.display(), "loading configuration");
                let content =
                    std::fs::read_to_string(&path).map_err(|e| Error::io_with_path(e, &path))?;
                toml::from_str(&content).map_err(|e| {
                    Error::config(format!("Failed to parse {}: {e}", path.display()))
                })?
            }
            Some(path) => {
                tracing::debug!(path = %path.display(), "no configuration file, using defaults");
                Self::default()
            }
            None => Self::default(),
        };
        config.apply_env_overrides(lookup);
        config.validate()?;
        Ok(config)
    }

    /// Renders the configuration as pretty TOML.
    fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::config(e.to_string()))
    }

    /// Renders the configuration as `KEY=value` pairs.
    fn to_env_vars(&self) -> Result<Vec<(String, String)>>;
}
