//! Command-line arguments.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Rollcall - attendance ledger and HTTP gateway
#[derive(Parser, Debug)]
#[command(name = "rollcall", version, about, long_about = None)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true, env = "ROLLCALL_CONFIG")]
    pub config: Option<String>,

    /// Enable debug logging (ignored when RUST_LOG is set)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Command to run
    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP gateway until interrupted
    Serve,

    /// Inspect or edit configuration
    Config {
        /// Config action
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Summarize a ledger state file
    Inspect {
        /// State file to read (defaults to ledger.state_file from config)
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },
}

/// `rollcall config` subcommands.
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the resolved config file path
    Path,

    /// Print a value by dotted key, e.g. `server.listen`
    Get {
        /// Dotted key
        key: String,
    },

    /// Set a value by dotted key in the config file
    Set {
        /// Dotted key
        key: String,
        /// New value
        value: String,
    },

    /// Write a default config file
    Init {
        /// Where to write it (defaults to the platform config dir)
        #[arg(short, long)]
        file: Option<String>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the configuration as environment variables
    Export {
        /// Format as `--env KEY=value` for `docker run`
        #[arg(long)]
        docker_env: bool,
    },
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_serve_with_global_flags() {
        let cli = Cli::try_parse_from(["rollcall", "serve", "-v", "--config", "/tmp/r.toml"]).unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.config.as_deref(), Some("/tmp/r.toml"));
        assert!(matches!(cli.command, Command::Serve));
    }

    #[test]
    fn test_parse_config_set() {
        let cli = Cli::try_parse_from(["rollcall", "config", "set", "ledger.owner", "0xabc"]).unwrap();
        let Command::Config {
            action: ConfigAction::Set { key, value },
        } = cli.command
        else {
            unreachable!("expected config set");
        };
        assert_eq!(key, "ledger.owner");
        assert_eq!(value, "0xabc");
    }

    #[test]
    fn test_parse_inspect() {
        let cli = Cli::try_parse_from(["rollcall", "inspect", "--file", "state.json", "--json"]).unwrap();
        let Command::Inspect { file, json } = cli.command else {
            unreachable!("expected inspect");
        };
        assert_eq!(file, Some(PathBuf::from("state.json")));
        assert!(json);
    }
}
