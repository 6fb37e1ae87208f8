//! Opden - locator resolution and secret fetching for the 1Password `op` CLI.
//!
//! # Architecture
//!
//! ```text
//! src/
//! ├── cli/              # Command-line interface
//! │   ├── commands      # Subcommand handlers
//! │   ├── completions   # Shell completions
//! │   └── output        # Terminal output helpers
//! └── core/             # Core library components
//!     ├── locator       # Locator grammars and canonical addresses
//!     ├── invoke        # op process invocation and capture
//!     └── client        # Fetch operations (item, field, otp)
//! ```
//!
//! # Features
//!
//! - Three locator grammars: canonical `op://VAULT/ITEM[/FIELD]`, extended
//!   `opcli:` key=value pairs (the only form that can name an account), and
//!   bare item names
//! - Item, field, and one-time-password fetches through the `op` CLI
//! - Per-call account selection via an environment overlay, never by
//!   mutating ambient process state
//! - Opt-in timeout and output-size limits on invocations

pub mod cli;
pub mod core;
pub mod error;

pub use crate::core::client::{OpClient, Operation};
pub use crate::core::invoke::{Invocation, Invoke, Limits, OpCli};
pub use crate::core::locator::Locator;
pub use crate::error::{Error, LocatorError, Result, ToolError};
