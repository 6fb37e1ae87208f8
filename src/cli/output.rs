//! Shared CLI output helpers.
//!
//! Errors go to stderr in red, hints in cyan; `console` downgrades to plain
//! text when the stream is not a terminal or colors are disabled.

use console::style;

/// Print an error message to stderr.
///
/// Example: `✗ invalid locator: locator has no item`
pub fn error(msg: &str) {
    eprintln!("{} {}", style("✗").red(), msg);
}

/// Print a hint message to stderr.
///
/// Example: `→ install the 1Password CLI`
pub fn hint(msg: &str) {
    eprintln!("{} {}", style("→").cyan(), style(msg).cyan());
}
