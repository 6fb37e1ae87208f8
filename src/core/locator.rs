//! Secret locators.
//!
//! A locator is the four-field address of a secret held by 1Password:
//! `{account, vault, item, field}`. Three textual forms are accepted:
//!
//! - Canonical: `op://VAULT/ITEM` or `op://VAULT/ITEM/FIELD`, the form the
//!   `op` CLI natively understands. Cannot carry an account.
//! - Extended: `opcli:` followed by colon-separated `key=value` pairs with
//!   keys `a` (account), `v` (vault), `i` (item), `f` (field). Exists so a
//!   single opaque string can select among multiple signed-in accounts.
//! - Bare: anything else, taken verbatim as the item name.
//!
//! Grammars are tried most-specific first. An input that starts with a
//! scheme prefix but fails that scheme's grammar is rejected outright; it is
//! never reinterpreted as a bare item name.

use std::fmt;

use tracing::trace;

use crate::error::LocatorError;

/// Scheme prefix of the canonical three-segment form.
pub const CANONICAL_SCHEME: &str = "op://";

/// Scheme prefix of the extended key=value form.
pub const EXTENDED_SCHEME: &str = "opcli:";

/// Structured address of one secret or secret attribute.
///
/// Immutable once constructed; `item` is never empty. Whether `field` is
/// present decides which fetch operations the locator may be used for:
/// without a field it addresses the whole item document, with a field it
/// addresses a single attribute.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Locator {
    account: Option<String>,
    vault: Option<String>,
    item: String,
    field: Option<String>,
}

impl Locator {
    /// Create a locator addressing a whole item, with no vault, field, or
    /// account set.
    ///
    /// # Errors
    ///
    /// Returns `LocatorError::MissingItem` if `item` is empty.
    pub fn for_item(item: impl Into<String>) -> Result<Self, LocatorError> {
        let item = item.into();
        if item.is_empty() {
            return Err(LocatorError::MissingItem);
        }
        Ok(Self {
            account: None,
            vault: None,
            item,
            field: None,
        })
    }

    /// Scope the locator to a vault.
    #[must_use]
    pub fn in_vault(mut self, vault: impl Into<String>) -> Self {
        self.vault = Some(vault.into());
        self
    }

    /// Narrow the locator to a single field of the item.
    #[must_use]
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    /// Pin the locator to a specific signed-in account.
    #[must_use]
    pub fn for_account(mut self, account: impl Into<String>) -> Self {
        self.account = Some(account.into());
        self
    }

    /// Parse a locator from one of the three textual forms.
    ///
    /// # Errors
    ///
    /// Returns a `LocatorError` when the input is empty, when a scheme
    /// prefix is present but the rest does not match that scheme's grammar,
    /// or when no item can be extracted.
    pub fn parse(text: &str) -> Result<Self, LocatorError> {
        if text.is_empty() {
            return Err(LocatorError::Empty);
        }
        if let Some(rest) = text.strip_prefix(CANONICAL_SCHEME) {
            trace!(input = text, grammar = "canonical", "parsing locator");
            return Self::parse_canonical(text, rest);
        }
        if let Some(rest) = text.strip_prefix(EXTENDED_SCHEME) {
            trace!(input = text, grammar = "extended", "parsing locator");
            return Self::parse_extended(text, rest);
        }
        trace!(input = text, grammar = "bare", "parsing locator");
        Self::for_item(text)
    }

    /// Parse the segment list after `op://`.
    fn parse_canonical(text: &str, rest: &str) -> Result<Self, LocatorError> {
        let segments: Vec<&str> = rest.split('/').collect();
        let (vault, item, field) = match segments.as_slice() {
            [vault, item] => (*vault, *item, None),
            // A trailing empty segment means "no field" (`op://V/I/`).
            [vault, item, field] => (*vault, *item, Some(*field).filter(|f| !f.is_empty())),
            _ => return Err(LocatorError::MalformedCanonical(text.to_string())),
        };
        if vault.is_empty() {
            return Err(LocatorError::MalformedCanonical(text.to_string()));
        }
        if item.is_empty() {
            return Err(LocatorError::MissingItem);
        }
        Ok(Self {
            account: None,
            vault: Some(vault.to_string()),
            item: item.to_string(),
            field: field.map(str::to_string),
        })
    }

    /// Parse the `key=value` pair list after `opcli:`.
    ///
    /// Pair order is insignificant; an empty value counts as unset; a
    /// repeated key keeps its last value.
    fn parse_extended(text: &str, rest: &str) -> Result<Self, LocatorError> {
        if rest.is_empty() {
            return Err(LocatorError::MalformedExtended(text.to_string()));
        }

        let mut account = None;
        let mut vault = None;
        let mut item = None;
        let mut field = None;

        for pair in rest.split(':') {
            let (key, value) = pair
                .split_once('=')
                .ok_or_else(|| LocatorError::MalformedExtended(text.to_string()))?;
            let value = (!value.is_empty()).then(|| value.to_string());
            match key {
                "a" => account = value,
                "v" => vault = value,
                "i" => item = value,
                "f" => field = value,
                other => return Err(LocatorError::UnknownKey(other.to_string())),
            }
        }

        let item = item.ok_or(LocatorError::MissingItem)?;
        Ok(Self {
            account,
            vault,
            item,
            field,
        })
    }

    /// Account disambiguator, if any.
    pub fn account(&self) -> Option<&str> {
        self.account.as_deref()
    }

    /// Vault name, if any.
    pub fn vault(&self) -> Option<&str> {
        self.vault.as_deref()
    }

    /// Item name. Never empty.
    pub fn item(&self) -> &str {
        &self.item
    }

    /// Field name, if any.
    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }

    /// Rebuild the canonical `op://VAULT/ITEM/FIELD` address.
    ///
    /// The account is deliberately not part of the address: the canonical
    /// scheme cannot express it, so it travels as an environment overlay on
    /// the invocation instead.
    ///
    /// # Panics
    ///
    /// Panics if `vault` or `field` is unset or empty. Callers must
    /// fully qualify a locator before asking for its canonical address;
    /// anything less is a bug in the caller, not a recoverable condition.
    pub fn canonical_address(&self) -> String {
        let vault = self
            .vault
            .as_deref()
            .filter(|v| !v.is_empty())
            .expect("canonical address requires a vault");
        let field = self
            .field
            .as_deref()
            .filter(|f| !f.is_empty())
            .expect("canonical address requires a field");
        format!("{CANONICAL_SCHEME}{vault}/{}/{field}", self.item)
    }
}

impl fmt::Display for Locator {
    /// Renders the most faithful textual form: extended when an account is
    /// set, canonical when vault (and possibly field) allow it, bare item
    /// otherwise.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.account, &self.vault, &self.field) {
            (Some(_), _, _) => {
                write!(f, "{EXTENDED_SCHEME}")?;
                let mut sep = "";
                for (key, value) in [
                    ("a", self.account.as_deref()),
                    ("v", self.vault.as_deref()),
                    ("i", Some(self.item.as_str())),
                    ("f", self.field.as_deref()),
                ] {
                    if let Some(value) = value {
                        write!(f, "{sep}{key}={value}")?;
                        sep = ":";
                    }
                }
                Ok(())
            }
            (None, Some(vault), Some(field)) => {
                write!(f, "{CANONICAL_SCHEME}{vault}/{}/{field}", self.item)
            }
            (None, Some(vault), None) => write!(f, "{CANONICAL_SCHEME}{vault}/{}", self.item),
            (None, None, _) => write!(f, "{}", self.item),
        }
    }
}
