//! Opden - fetch 1Password secrets by locator.

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use opden::cli::output;
use opden::cli::{execute, Cli};
use opden::error::{Error, ToolError};

fn main() {
    let cli = Cli::parse();

    // Initialize tracing subscriber with env-filter support
    let filter = EnvFilter::try_from_env("OPDEN_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("opden=debug")
        } else {
            EnvFilter::new("opden=warn")
        }
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).without_time())
        .init();

    let limits = cli.limits();
    if let Err(e) = execute(cli.command, cli.op_path, limits) {
        let suggestion = match &e {
            Error::InvalidLocator(_) => Some(
                "locator forms: op://VAULT/ITEM[/FIELD], opcli:a=..:v=..:i=..:f=.., or a bare item name",
            ),
            Error::ExternalTool(ToolError::NotFound) => {
                Some("install the 1Password CLI: https://developer.1password.com/docs/cli/")
            }
            _ => None,
        };

        output::error(&e.to_string());
        if let Some(hint) = suggestion {
            output::hint(hint);
        }
        std::process::exit(1);
    }
}
