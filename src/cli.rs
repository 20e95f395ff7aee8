//! Command line interface for the peerfour binary.

use clap::{Parser, Subcommand};

/// Peer-to-peer Connect Four.
#[derive(Debug, Parser)]
#[command(name = "peerfour", version, about)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available run modes.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Play a two-seat game on this machine, taking columns from stdin.
    Local {
        /// Display name for the session host.
        #[arg(short, long, default_value = "Player 1")]
        name: String,
    },
    /// Run a scripted two-controller game over an in-memory link.
    Demo,
}
