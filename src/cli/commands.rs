//! Command implementations.
//!
//! Handler functions for each CLI command. Resolution and fetching live in
//! `core`; handlers only wire flags together and print results.

use std::path::PathBuf;

use crate::core::client::OpClient;
use crate::core::invoke::{Limits, OpCli};
use crate::core::locator::Locator;
use crate::error::Result;

/// Fetch a whole item document and pretty-print it.
pub fn cmd_item(locator: &str, op_path: Option<PathBuf>, limits: Limits) -> Result<()> {
    let locator = Locator::parse(locator)?;
    let document = client(op_path, limits)?.fetch_item(&locator)?;
    println!("{document:#}");
    Ok(())
}

/// Fetch a single field value and print it.
pub fn cmd_read(locator: &str, op_path: Option<PathBuf>, limits: Limits) -> Result<()> {
    let locator = Locator::parse(locator)?;
    let value = client(op_path, limits)?.fetch_field(&locator)?;
    println!("{value}");
    Ok(())
}

/// Fetch the current one-time password and print it.
pub fn cmd_otp(locator: &str, op_path: Option<PathBuf>, limits: Limits) -> Result<()> {
    let locator = Locator::parse(locator)?;
    let code = client(op_path, limits)?.fetch_otp(&locator)?;
    println!("{code}");
    Ok(())
}

/// Build a client from the global flags.
fn client(op_path: Option<PathBuf>, limits: Limits) -> Result<OpClient> {
    let invoker = match op_path {
        Some(path) => OpCli::with_program(path),
        None => OpCli::new()?,
    };
    Ok(OpClient::with_invoker(invoker.limits(limits)))
}
