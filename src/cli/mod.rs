//! Command-line interface.

pub mod commands;
pub mod completions;
pub mod output;

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};

use crate::core::invoke::Limits;
use crate::error::Result;

/// Opden - fetch 1Password secrets by locator.
#[derive(Parser)]
#[command(
    name = "opden",
    about = "Fetch 1Password secrets by locator through the op CLI",
    version
)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to the op binary (defaults to PATH lookup)
    #[arg(long, global = true, env = "OPDEN_OP_PATH", value_name = "PATH")]
    pub op_path: Option<PathBuf>,

    /// Kill the op process if it runs longer than this many seconds
    #[arg(long, global = true, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Fail if op emits more than this many bytes of output
    #[arg(long, global = true, value_name = "BYTES")]
    pub max_output: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Execution limits assembled from the global flags.
    pub fn limits(&self) -> Limits {
        Limits {
            timeout: self.timeout.map(Duration::from_secs),
            max_output_bytes: self.max_output,
        }
    }
}

/// Top-level commands.
#[derive(Subcommand)]
pub enum Command {
    /// Fetch a whole item document and print it as JSON
    Item {
        /// Locator: op://VAULT/ITEM, opcli:k=v pairs, or a bare item name
        locator: String,
    },

    /// Fetch a single field value
    Read {
        /// Locator: op://VAULT/ITEM/FIELD or opcli:k=v pairs with a field
        locator: String,
    },

    /// Fetch the current one-time password for a field
    Otp {
        /// Locator: op://VAULT/ITEM/FIELD or opcli:k=v pairs with a field
        locator: String,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Shells with completion support.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}

/// Execute a parsed command.
///
/// # Errors
///
/// Returns error if the command execution fails.
pub fn execute(command: Command, op_path: Option<PathBuf>, limits: Limits) -> Result<()> {
    match command {
        Command::Item { locator } => commands::cmd_item(&locator, op_path, limits),
        Command::Read { locator } => commands::cmd_read(&locator, op_path, limits),
        Command::Otp { locator } => commands::cmd_otp(&locator, op_path, limits),
        Command::Completions { shell } => completions::execute(shell),
    }
}
