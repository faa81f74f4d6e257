//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand};

/// Send command arguments.
#[derive(Debug, Args)]
pub struct SendCommand {
    /// The message to store (read from stdin when omitted)
    pub message: Option<String>,

    /// Echo the message in plain text instead of masking it
    #[arg(short, long)]
    pub show: bool,

    /// Copy the share URL to the clipboard
    #[arg(long)]
    pub copy: bool,

    /// Save the QR code as a PNG (defaults to the configured file name)
    #[arg(short, long, value_name = "PATH", num_args = 0..=1)]
    pub export: Option<Option<PathBuf>>,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Get command arguments.
#[derive(Debug, Args)]
pub struct GetCommand {
    /// A share link, path, or query string containing `id=...`
    #[arg(conflicts_with = "id")]
    pub link: Option<String>,

    /// The message id
    #[arg(long)]
    pub id: Option<String>,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Serve command arguments.
#[derive(Debug, Args)]
pub struct ServeCommand {
    /// Address to listen on (overrides the configuration)
    #[arg(short, long, value_name = "ADDR")]
    pub bind: Option<String>,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Local store administration (SQLite backend only).
#[derive(Debug, Subcommand)]
pub enum StoreCommand {
    /// Show database statistics
    Stats {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Set a config entry, such as the share domain
    SetConfig {
        /// Config key
        key: String,
        /// Config value
        value: String,
    },
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[derive(Debug, Parser)]
    struct Harness {
        #[command(subcommand)]
        store: StoreCommand,
    }

    #[test]
    fn test_store_set_config_args() {
        let parsed =
            Harness::try_parse_from(["harness", "set-config", "domain", "qr.example.com"]).unwrap();
        match parsed.store {
            StoreCommand::SetConfig { key, value } => {
                assert_eq!(key, "domain");
                assert_eq!(value, "qr.example.com");
            }
            StoreCommand::Stats { .. } => panic!("expected set-config"),
        }
    }

    #[test]
    fn test_store_stats_json_flag() {
        let parsed = Harness::try_parse_from(["harness", "stats", "--json"]).unwrap();
        assert!(matches!(parsed.store, StoreCommand::Stats { json: true }));
    }
}
