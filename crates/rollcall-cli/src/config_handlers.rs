//! `rollcall config` subcommands.
//!
//! Handlers are generic over [`ConfigManager`] and return what they would
//! print; [`handle_config_command`] does the printing.

use std::path::PathBuf;

use rollcall_core::traits::ConfigManager;
use rollcall_core::{Error, Result, RollcallConfig};

use crate::cli::ConfigAction;

/// Runs a config subcommand against [`RollcallConfig`].
pub fn handle_config_command(config_path: Option<&str>, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Path => {
            let path = config_path_for::<RollcallConfig>(config_path)?;
            println!("{}", path.display());
            if !path.exists() {
                eprintln!(
                    "(file does not exist; run `{} config init` to create it)",
                    RollcallConfig::project_name()
                );
            }
        }
        ConfigAction::Get { key } => {
            println!("{}", config_get::<RollcallConfig>(config_path, &key)?);
        }
        ConfigAction::Set { key, value } => {
            let path = config_set::<RollcallConfig>(config_path, &key, &value)?;
            println!("Set {key} = {value} in {}", path.display());
        }
        ConfigAction::Init { file, force } => {
            let path = config_init::<RollcallConfig>(file.as_deref().or(config_path), force)?;
            println!("Config file created at {}", path.display());
        }
        ConfigAction::Export { docker_env } => {
            let config = RollcallConfig::load(config_path)?;
            for line in config_export(&config, docker_env)? {
                println!("{line}");
            }
        }
    }
    Ok(())
}

// ============================================================================
// Handlers
// ============================================================================

/// The config file path that would be used.
pub fn config_path_for<C: ConfigManager>(config_path: Option<&str>) -> Result<PathBuf> {
    C::resolve_config_path(config_path)
        .ok_or_else(|| Error::config("could not determine config directory for this platform"))
}

/// The effective value at a dotted key, after env overrides.
pub fn config_get<C: ConfigManager>(config_path: Option<&str>, key: &str) -> Result<String> {
    let config = C::load(config_path)?;
    let value = toml::Value::try_from(&config).map_err(|e| Error::config(e.to_string()))?;
    get_nested_value(&value, key)
        .map(format_toml_value)
        .ok_or_else(|| Error::config(format!("key '{key}' not found in configuration")))
}

/// Sets a dotted key in the config file and returns the file's path.
///
/// The new value takes the type of the value it replaces. The edited file
/// must still load as a valid configuration or nothing is written.
pub fn config_set<C: ConfigManager>(
    config_path: Option<&str>,
    key: &str,
    value: &str,
) -> Result<PathBuf> {
    let path = config_path_for::<C>(config_path)?;
    if !path.exists() {
        return Err(Error::config(format!(
            "config file does not exist at {}; run `{} config init` first",
            path.display(),
            C::project_name()
        )));
    }

    let content = std::fs::read_to_string(&path).map_err(|e| Error::io_with_path(e, &path))?;
    let mut doc: toml::Value = toml::from_str(&content)
        .map_err(|e| Error::config(format!("failed to parse {}: {e}", path.display())))?;

    let parsed = parse_value_like(get_nested_value(&doc, key), value)?;
    set_nested_value(&mut doc, key, parsed)?;

    let edited: C = doc
        .clone()
        .try_into()
        .map_err(|e| Error::config(format!("'{key}' = {value:?} is not valid here: {e}")))?;
    edited.validate()?;

    let toml_str = toml::to_string_pretty(&doc).map_err(|e| Error::config(e.to_string()))?;
    std::fs::write(&path, toml_str).map_err(|e| Error::io_with_path(e, &path))?;
    Ok(path)
}

/// Writes a default config file and returns its path.
pub fn config_init<C: ConfigManager>(file: Option<&str>, force: bool) -> Result<PathBuf> {
    let path = match file {
        Some(p) => PathBuf::from(p),
        None => C::default_config_path()
            .ok_or_else(|| Error::config("could not determine config directory"))?,
    };

    if path.exists() && !force {
        return Err(Error::config(format!(
            "config file already exists at {}; use --force to overwrite",
            path.display()
        )));
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| Error::io_with_path(e, parent))?;
    }
    let toml_str = C::default().to_toml_string()?;
    std::fs::write(&path, toml_str).map_err(|e| Error::io_with_path(e, &path))?;
    Ok(path)
}

/// The configuration as `KEY=value` lines, or `--env KEY=value` for docker.
pub fn config_export<C: ConfigManager>(config: &C, docker_env: bool) -> Result<Vec<String>> {
    let prefix = if docker_env { "--env " } else { "" };
    Ok(config
        .to_env_vars()?
        .into_iter()
        .map(|(key, value)| format!("{prefix}{key}={value}"))
        .collect())
}

// ============================================================================
// TOML dotted-key helpers
// ============================================================================

/// Looks up a dotted key in a TOML tree.
pub fn get_nested_value<'a>(value: &'a toml::Value, key: &str) -> Option<&'a toml::Value> {
    key.split('.')
        .try_fold(value, |current, part| current.as_table()?.get(part))
}

/// Sets a dotted key, creating intermediate tables as needed.
pub fn set_nested_value(root: &mut toml::Value, key: &str, value: toml::Value) -> Result<()> {
    let (parents, leaf) = key.rsplit_once('.').unwrap_or(("", key));
    if leaf.is_empty() {
        return Err(Error::config("empty key path"));
    }

    let mut current = root;
    for part in parents.split('.').filter(|p| !p.is_empty()) {
        let table = current
            .as_table_mut()
            .ok_or_else(|| Error::config(format!("cannot navigate into non-table '{part}'")))?;
        current = table
            .entry(part.to_string())
            .or_insert(toml::Value::Table(toml::map::Map::new()));
    }

    current
        .as_table_mut()
        .ok_or_else(|| Error::config("cannot set a key on a non-table value"))?
        .insert(leaf.to_string(), value);
    Ok(())
}

/// Parses `raw` with the type of `existing`.
///
/// Strings stay strings even when they look numeric, so an identity such as
/// `1234` is not turned into an integer. With no existing value the type is
/// guessed: bool, then integer, then string.
pub fn parse_value_like(existing: Option<&toml::Value>, raw: &str) -> Result<toml::Value> {
    let mismatch = |kind: &str| Error::config(format!("expected {kind}, got {raw:?}"));
    match existing {
        Some(toml::Value::String(_)) => Ok(toml::Value::String(raw.to_string())),
        Some(toml::Value::Boolean(_)) => raw
            .parse()
            .map(toml::Value::Boolean)
            .map_err(|_| mismatch("a boolean")),
        Some(toml::Value::Integer(_)) => raw
            .parse()
            .map(toml::Value::Integer)
            .map_err(|_| mismatch("an integer")),
        Some(toml::Value::Float(_)) => raw
            .parse()
            .map(toml::Value::Float)
            .map_err(|_| mismatch("a number")),
        Some(toml::Value::Array(_) | toml::Value::Table(_)) => {
            Err(Error::config("only scalar values can be set"))
        }
        Some(toml::Value::Datetime(_)) | None => Ok(guess_value(raw)),
    }
}

fn guess_value(raw: &str) -> toml::Value {
    match raw {
        "true" => toml::Value::Boolean(true),
        "false" => toml::Value::Boolean(false),
        _ => raw
            .parse::<i64>()
            .map(toml::Value::Integer)
            .unwrap_or_else(|_| toml::Value::String(raw.to_string())),
    }
}

/// Renders a TOML value for stdout.
pub fn format_toml_value(value: &toml::Value) -> String {
    match value {
        toml::Value::String(s) => s.clone(),
        toml::Value::Integer(i) => i.to_string(),
        toml::Value::Float(f) => f.to_string(),
        toml::Value::Boolean(b) => b.to_string(),
        toml::Value::Datetime(dt) => dt.to_string(),
        toml::Value::Array(_) | toml::Value::Table(_) => {
            toml::to_string_pretty(value).unwrap_or_else(|_| format!("{value:?}"))
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
