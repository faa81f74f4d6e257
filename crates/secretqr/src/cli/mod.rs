//! Command-line interface for secretqr.
//!
//! This module provides the CLI structure for the `secretqr` binary. The
//! command handlers live in the binary itself.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{ConfigCommand, GetCommand, SendCommand, ServeCommand, StoreCommand};

/// secretqr - Share secret messages through links and QR codes
///
/// Store a message, get back a link and a QR code pointing at it, and read
/// the message again from that link.
#[derive(Debug, Parser)]
#[command(name = "secretqr")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store a message and print its share link and QR code
    Send(SendCommand),

    /// Read a message from a share link
    Get(GetCommand),

    /// Run the web interface
    Serve(ServeCommand),

    /// View or check configuration
    #[command(subcommand)]
    Config(ConfigCommand),

    /// Administer the local message store
    #[command(subcommand)]
    Store(StoreCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        crate::logging::Verbosity::from_flags(self.quiet, self.verbose)
    }
}
