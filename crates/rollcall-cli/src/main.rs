//! Rollcall CLI
//!
//! Attendance ledger gateway and administration.

#![warn(clippy::all)]
#![forbid(unsafe_code)]

use anyhow::{Context, Result};
use clap::Parser;
use rollcall_cli::cli::{Cli, Command};
use rollcall_cli::{commands, config_handlers, logging};
use rollcall_core::{ConfigManager, RollcallConfig};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_path = cli.config.as_deref();

    match cli.command {
        Command::Config { action } => {
            logging::init_logging(cli.verbose, "warn");
            config_handlers::handle_config_command(config_path, action)?;
        }
        Command::Serve => {
            let config = RollcallConfig::load(config_path).context("loading configuration")?;
            logging::init_logging(cli.verbose, &config.logging.level);
            commands::serve(&config).await?;
        }
        Command::Inspect { file, json } => {
            let config = RollcallConfig::load(config_path).context("loading configuration")?;
            logging::init_logging(cli.verbose, &config.logging.level);
            let path = commands::resolve_state_file(file, &config)?;
            let report = commands::inspect(&path)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{}", commands::render_report(&report));
            }
        }
    }
    Ok(())
}
