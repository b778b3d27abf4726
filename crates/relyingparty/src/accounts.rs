//! In-memory account store with demo data.

use std::collections::HashMap;

use async_trait::async_trait;
use relyingparty_core::{AccountId, AccountStore, IdentityUrl, Result};
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct Accounts {
    names: HashMap<AccountId, String>,
    links: HashMap<IdentityUrl, Vec<AccountId>>,
}

/// Accounts and their linked OpenIDs, held in memory.
#[derive(Debug, Default)]
pub struct InMemoryAccounts {
    inner: RwLock<Accounts>,
}

impl InMemoryAccounts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Demo accounts matching the identities the mock provider hands out:
    /// alice owns one account, bob owns two.
    pub fn with_demo_data() -> Self {
        let mut accounts = Accounts::default();
        for (id, name) in [(1, "alice"), (2, "bob"), (3, "bob (work)")] {
            accounts.names.insert(AccountId(id), name.to_string());
        }
        accounts
            .links
            .insert(IdentityUrl::from("http://alice.example/"), vec![AccountId(1)]);
        accounts.links.insert(
            IdentityUrl::from("http://bob.example/"),
            vec![AccountId(2), AccountId(3)],
        );

        Self {
            inner: RwLock::new(accounts),
        }
    }

    pub async fn create(&self, id: AccountId, name: impl Into<String>) {
        self.inner.write().await.names.insert(id, name.into());
    }

    pub async fn link(&self, identity_url: IdentityUrl, account: AccountId) {
        self.inner
            .write()
            .await
            .links
            .entry(identity_url)
            .or_default()
            .push(account);
    }
}

#[async_trait]
impl AccountStore for InMemoryAccounts {
    async fn find_accounts_by_identity(&self, identity_url: &IdentityUrl) -> Result<Vec<AccountId>> {
        Ok(self
            .inner
            .read()
            .await
            .links
            .get(identity_url)
            .cloned()
            .unwrap_or_default())
    }

    async fn display_name(&self, account: AccountId) -> Result<Option<String>> {
        Ok(self.inner.read().await.names.get(&account).cloned())
    }
}
