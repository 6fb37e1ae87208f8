//! Fetch operations against the `op` CLI.
//!
//! The dispatcher: validates a locator against the requested operation,
//! builds the `op` invocation, runs it through an [`Invoke`] implementation,
//! and decodes the result. No retries, no partial results.

use serde_json::Value;
use tracing::debug;

use crate::core::invoke::{Invocation, Invoke, OpCli, OP_ACCOUNT_ENV};
use crate::core::locator::Locator;
use crate::error::{LocatorError, Result};

/// The three fetch operations a locator can be used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Fetch the whole item document.
    Item,
    /// Fetch a single field's stored value.
    Field,
    /// Fetch the current one-time password for a field.
    Otp,
}

impl Operation {
    /// Short name used in diagnostics.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Item => "fetch-item",
            Self::Field => "fetch-field",
            Self::Otp => "fetch-otp",
        }
    }
}

/// Client that fetches secrets through an invoker.
///
/// Generic over [`Invoke`] so the dispatch and precondition logic is
/// testable without spawning processes; production use goes through
/// [`OpCli`].
#[derive(Debug)]
pub struct OpClient<I = OpCli> {
    invoker: I,
}

impl OpClient<OpCli> {
    /// Create a client backed by the real `op` binary.
    ///
    /// # Errors
    ///
    /// Returns `ToolError::NotFound` if the `op` binary cannot be located.
    pub fn new() -> Result<Self> {
        Ok(Self {
            invoker: OpCli::new()?,
        })
    }
}

impl<I: Invoke> OpClient<I> {
    /// Create a client with an explicit invoker.
    pub fn with_invoker(invoker: I) -> Self {
        Self { invoker }
    }

    /// Fetch the whole item document addressed by `locator`.
    ///
    /// The locator must not carry a field. The document is returned as
    /// decoded JSON without any shape validation.
    ///
    /// # Errors
    ///
    /// Fails with the invalid-locator class (without invoking the tool) if
    /// the locator carries a field, and with the external-tool class if the
    /// invocation or JSON decoding fails.
    pub fn fetch_item(&self, locator: &Locator) -> Result<Value> {
        let invocation = build_invocation(locator, Operation::Item)?;
        let raw = self.invoker.invoke(&invocation)?;
        let document: Value = serde_json::from_str(&raw)
            .map_err(crate::error::ToolError::Decode)?;
        debug!(item = locator.item(), "fetched item document");
        Ok(document)
    }

    /// Fetch the stored value of the field addressed by `locator`.
    ///
    /// The locator must carry both a vault and a field. Returns the output
    /// with surrounding whitespace trimmed.
    ///
    /// # Errors
    ///
    /// Fails with the invalid-locator class (without invoking the tool) if
    /// vault or field is missing, and with the external-tool class if the
    /// invocation fails.
    pub fn fetch_field(&self, locator: &Locator) -> Result<String> {
        let invocation = build_invocation(locator, Operation::Field)?;
        let raw = self.invoker.invoke(&invocation)?;
        debug!(item = locator.item(), "fetched field value");
        Ok(raw.trim().to_string())
    }

    /// Fetch the current one-time password of the field addressed by
    /// `locator`.
    ///
    /// Same preconditions as [`fetch_field`](Self::fetch_field); the
    /// canonical address is annotated with `?attribute=otp` so `op` returns
    /// the rolling code rather than the stored seed.
    ///
    /// # Errors
    ///
    /// Fails with the invalid-locator class (without invoking the tool) if
    /// vault or field is missing, and with the external-tool class if the
    /// invocation fails.
    pub fn fetch_otp(&self, locator: &Locator) -> Result<String> {
        let invocation = build_invocation(locator, Operation::Otp)?;
        let raw = self.invoker.invoke(&invocation)?;
        debug!(item = locator.item(), "fetched one-time password");
        Ok(raw.trim().to_string())
    }
}

/// Build the `op` invocation for one operation on one locator.
///
/// Precondition checks happen here, before anything is spawned. Vault
/// presence is checked explicitly so a user-supplied locator string can
/// never reach the `canonical_address` contract panic.
fn build_invocation(
    locator: &Locator,
    operation: Operation,
) -> std::result::Result<Invocation, LocatorError> {
    let args = match operation {
        Operation::Item => {
            if locator.field().is_some() {
                return Err(LocatorError::FieldNotAllowed {
                    operation: operation.label(),
                });
            }
            let mut args = vec![
                "item".to_string(),
                "get".to_string(),
                locator.item().to_string(),
                "--format".to_string(),
                "json".to_string(),
            ];
            if let Some(vault) = locator.vault() {
                args.push("--vault".to_string());
                args.push(vault.to_string());
            }
            args
        }
        Operation::Field | Operation::Otp => {
            if locator.field().is_none() {
                return Err(LocatorError::FieldRequired {
                    operation: operation.label(),
                });
            }
            if locator.vault().is_none() {
                return Err(LocatorError::VaultRequired {
                    operation: operation.label(),
                });
            }
            let mut address = locator.canonical_address();
            if operation == Operation::Otp {
                address.push_str("?attribute=otp");
            }
            vec!["read".to_string(), address]
        }
    };

    let mut invocation = Invocation::new(args);
    if let Some(account) = locator.account() {
        invocation = invocation.env(OP_ACCOUNT_ENV, account);
    }
    Ok(invocation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, ToolError};
    use std::cell::RefCell;

    /// Scripted invoker that records every invocation it receives.
    struct FakeInvoker {
        calls: RefCell<Vec<Invocation>>,
        response: FakeResponse,
    }

    enum FakeResponse {
        Stdout(&'static str),
        Fail(&'static str),
    }

    impl FakeInvoker {
        fn returning(stdout: &'static str) -> Self {
            Self {
                calls: RefCell::new(Vec::new()),
                response: FakeResponse::Stdout(stdout),
            }
        }

        fn failing(diagnostic: &'static str) -> Self {
            Self {
                calls: RefCell::new(Vec::new()),
                response: FakeResponse::Fail(diagnostic),
            }
        }

        fn calls(&self) -> Vec<Invocation> {
            self.calls.borrow().clone()
        }
    }

    impl Invoke for &FakeInvoker {
        fn invoke(&self, invocation: &Invocation) -> Result<String> {
            self.calls.borrow_mut().push(invocation.clone());
            match self.response {
                FakeResponse::Stdout(out) => Ok(out.to_string()),
                FakeResponse::Fail(diag) => {
                    Err(ToolError::CommandFailed(diag.to_string()).into())
                }
            }
        }
    }

    fn field_locator() -> Locator {
        Locator::for_item("PAUSE API")
            .unwrap()
            .in_vault("Private")
            .with_field("credential")
    }

    #[test]
    fn test_fetch_item_builds_item_get_invocation() {
        let fake = FakeInvoker::returning("{\"id\":\"abc\"}");
        let client = OpClient::with_invoker(&fake);
        let locator = Locator::for_item("github").unwrap().in_vault("Private");

        let document = client.fetch_item(&locator).unwrap();
        assert_eq!(document["id"], "abc");

        let calls = fake.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(
            calls[0].args(),
            ["item", "get", "github", "--format", "json", "--vault", "Private"]
        );
        assert!(calls[0].env_overlay().is_empty());
    }

    #[test]
    fn test_fetch_item_without_vault_omits_vault_flag() {
        let fake = FakeInvoker::returning("{}");
        let client = OpClient::with_invoker(&fake);
        let locator = Locator::for_item("github").unwrap();

        client.fetch_item(&locator).unwrap();
        assert_eq!(
            fake.calls()[0].args(),
            ["item", "get", "github", "--format", "json"]
        );
    }

    #[test]
    fn test_fetch_item_with_field_fails_without_invoking() {
        let fake = FakeInvoker::returning("{}");
        let client = OpClient::with_invoker(&fake);

        let err = client.fetch_item(&field_locator()).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidLocator(LocatorError::FieldNotAllowed { .. })
        ));
        assert!(fake.calls().is_empty());
    }

    #[test]
    fn test_fetch_item_undecodable_output_fails() {
        let fake = FakeInvoker::returning("not json at all");
        let client = OpClient::with_invoker(&fake);
        let locator = Locator::for_item("github").unwrap();

        let err = client.fetch_item(&locator).unwrap_err();
        assert!(matches!(err, Error::ExternalTool(ToolError::Decode(_))));
    }

    #[test]
    fn test_fetch_field_builds_read_invocation_and_trims() {
        let fake = FakeInvoker::returning("  hunter2\n");
        let client = OpClient::with_invoker(&fake);

        let value = client.fetch_field(&field_locator()).unwrap();
        assert_eq!(value, "hunter2");
        assert_eq!(
            fake.calls()[0].args(),
            ["read", "op://Private/PAUSE API/credential"]
        );
    }

    #[test]
    fn test_fetch_field_without_field_fails_without_invoking() {
        let fake = FakeInvoker::returning("x");
        let client = OpClient::with_invoker(&fake);
        let locator = Locator::for_item("github").unwrap().in_vault("Private");

        let err = client.fetch_field(&locator).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidLocator(LocatorError::FieldRequired { .. })
        ));
        assert!(fake.calls().is_empty());
    }

    #[test]
    fn test_fetch_field_without_vault_fails_without_invoking() {
        let fake = FakeInvoker::returning("x");
        let client = OpClient::with_invoker(&fake);
        let locator = Locator::for_item("github").unwrap().with_field("password");

        let err = client.fetch_field(&locator).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidLocator(LocatorError::VaultRequired { .. })
        ));
        assert!(fake.calls().is_empty());
    }

    #[test]
    fn test_fetch_otp_annotates_address() {
        let fake = FakeInvoker::returning("123456\n");
        let client = OpClient::with_invoker(&fake);

        let code = client.fetch_otp(&field_locator()).unwrap();
        assert_eq!(code, "123456");
        assert_eq!(
            fake.calls()[0].args(),
            ["read", "op://Private/PAUSE API/credential?attribute=otp"]
        );
    }

    #[test]
    fn test_fetch_otp_without_field_fails_without_invoking() {
        let fake = FakeInvoker::returning("x");
        let client = OpClient::with_invoker(&fake);
        let locator = Locator::for_item("github").unwrap().in_vault("Private");

        let err = client.fetch_otp(&locator).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidLocator(LocatorError::FieldRequired { .. })
        ));
        assert!(fake.calls().is_empty());
    }

    #[test]
    fn test_account_rides_as_env_overlay() {
        let fake = FakeInvoker::returning("x");
        let client = OpClient::with_invoker(&fake);
        let locator = field_locator().for_account("work");

        client.fetch_field(&locator).unwrap();
        assert_eq!(
            fake.calls()[0].env_overlay(),
            [(OP_ACCOUNT_ENV.to_string(), "work".to_string())]
        );
    }

    #[test]
    fn test_tool_failure_surfaces_without_partial_result() {
        let fake = FakeInvoker::failing("[ERROR] item not found");
        let client = OpClient::with_invoker(&fake);

        let err = client.fetch_field(&field_locator()).unwrap_err();
        match err {
            Error::ExternalTool(ToolError::CommandFailed(diag)) => {
                assert_eq!(diag, "[ERROR] item not found");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_operation_labels() {
        assert_eq!(Operation::Item.label(), "fetch-item");
        assert_eq!(Operation::Field.label(), "fetch-field");
        assert_eq!(Operation::Otp.label(), "fetch-otp");
    }
}
