//! Error types.
//!
//! Two failure classes: locator problems (the caller can fix the input and
//! try again) and external tool problems (the `op` invocation itself went
//! wrong). Contract violations such as asking an under-specified locator for
//! its canonical address are programmer errors and panic instead.

use thiserror::Error;

/// A locator that could not be parsed or does not satisfy an operation's
/// field-presence requirements.
///
/// Always recoverable by fixing the input; never retried internally.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LocatorError {
    #[error("empty locator")]
    Empty,

    #[error("malformed locator `{0}`: expected op://VAULT/ITEM or op://VAULT/ITEM/FIELD")]
    MalformedCanonical(String),

    #[error("malformed locator `{0}`: expected opcli: followed by key=value pairs")]
    MalformedExtended(String),

    #[error("unknown locator key `{0}` (valid keys: a, v, i, f)")]
    UnknownKey(String),

    #[error("locator has no item")]
    MissingItem,

    #[error("{operation} requires a locator without a field")]
    FieldNotAllowed { operation: &'static str },

    #[error("{operation} requires a locator with a field")]
    FieldRequired { operation: &'static str },

    #[error("{operation} requires a locator with a vault")]
    VaultRequired { operation: &'static str },
}

/// A failure of the external `op` process or of decoding its output.
///
/// Carries best-effort diagnostic text; never retried internally.
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("op CLI not found (install the 1Password CLI or set OPDEN_OP_PATH)")]
    NotFound,

    #[error("failed to start op: {0}")]
    Spawn(std::io::Error),

    #[error("failed to capture op output: {0}")]
    Capture(std::io::Error),

    #[error("op failed: {0}")]
    CommandFailed(String),

    #[error("op produced non-UTF-8 output")]
    NonUtf8Output,

    #[error("failed to decode op output: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("op did not exit within {0:?}")]
    TimedOut(std::time::Duration),

    #[error("op output exceeded {0} bytes")]
    OutputTooLarge(u64),
}

/// Top-level error type.
#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid locator: {0}")]
    InvalidLocator(#[from] LocatorError),

    #[error(transparent)]
    ExternalTool(#[from] ToolError),
}

pub type Result<T> = std::result::Result<T, Error>;
