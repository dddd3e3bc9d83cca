//! Test accounts and account-list resolution

use crate::error::{ParityError, ParityResult};
use crate::{cell, Row};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// An opaque tenant/user identifier (e.g. "492")
///
/// Accounts are not deduplicated; a repeated account yields repeated cases.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Account(String);

impl Account {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the identifier text
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Account {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for Account {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl AsRef<str> for Account {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which accounts of the account sheet take part in a run
///
/// A non-empty `filter` wins over `max`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountSelection {
    /// Allow-list of account identifiers
    pub filter: Vec<String>,
    /// Keep only the first `max` accounts in source order
    pub max: Option<usize>,
}

impl AccountSelection {
    /// Select every account
    pub fn all() -> Self {
        Self::default()
    }

    /// Select only the listed accounts
    pub fn only<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            filter: ids.into_iter().map(Into::into).collect(),
            max: None,
        }
    }

    /// Select at most `max` accounts
    pub fn first(max: usize) -> Self {
        Self {
            filter: Vec::new(),
            max: Some(max),
        }
    }

    /// Resolve the account list from raw rows (header already skipped).
    ///
    /// Rows with an empty first cell are skipped. The filter is a membership
    /// test, so the result keeps source order, not filter order.
    pub fn resolve(&self, rows: &[Row]) -> ParityResult<Vec<Account>> {
        let raw = rows.iter().filter_map(|row| cell(row, 0)).map(Account::from);

        let accounts: Vec<Account> = if !self.filter.is_empty() {
            raw.filter(|acc| self.filter.iter().any(|f| f == acc.as_str()))
                .collect()
        } else if let Some(max) = self.max {
            raw.take(max).collect()
        } else {
            raw.collect()
        };

        if accounts.is_empty() {
            return Err(ParityError::configuration(
                "no valid account ids found in the account sheet",
            ));
        }

        debug!("Resolved {} accounts", accounts.len());
        Ok(accounts)
    }
}
