//! Mapping verified identities onto local accounts.

mod reconcile;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::identity::IdentityUrl;

pub use reconcile::{dedupe_accounts, reconcile, Reconciliation};

/// Identifier of a local user account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(pub i64);

impl std::fmt::Display for AccountId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for AccountId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// The application's account store.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Accounts linked to `identity_url`. May contain duplicates.
    async fn find_accounts_by_identity(&self, identity_url: &IdentityUrl) -> Result<Vec<AccountId>>;

    /// Human-readable label for an account, used on the picker and
    /// association screens.
    async fn display_name(&self, account: AccountId) -> Result<Option<String>> {
        Ok(Some(account.to_string()))
    }
}
