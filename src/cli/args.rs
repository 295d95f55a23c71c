//! CLI argument parsing structures.

use clap::{Args, Parser};

use super::commands::Commands;

/// Main CLI structure for tokn.
#[derive(Parser, Debug)]
#[command(name = "tokn")]
#[command(about = "A CLI tool for rotating API tokens", long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all commands.
#[derive(Debug, Default, Args)]
pub struct GlobalArgs {
    /// Metadata backend to use for this invocation (local, doppler)
    #[arg(long, global = true)]
    pub backend: Option<String>,
}
