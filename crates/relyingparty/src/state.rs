//! Shared application state.

use std::sync::Arc;

use anyhow::Context;
use relyingparty_auth::{
    mock::{MockConsumer, MOCK_PROVIDER_PATH},
    CookieBinding, Endpoint, IdentityBinding, SessionBinding, SessionStore,
};
use relyingparty_core::OpenIdConsumer;

use crate::accounts::InMemoryAccounts;
use crate::config::{BindingKind, Config};

#[derive(Clone)]
pub struct AppState {
    pub endpoint: Endpoint,
    pub binding: Arc<dyn IdentityBinding>,
    /// Set when identities live in server-side sessions.
    pub sessions: Option<Arc<SessionBinding>>,
    pub accounts: Arc<InMemoryAccounts>,
}

impl AppState {
    /// Wire the endpoint, binding and account store from configuration.
    pub fn new(config: &Config, accounts: InMemoryAccounts) -> anyhow::Result<Self> {
        let provider_url = config
            .endpoint
            .base_url
            .join(MOCK_PROVIDER_PATH)
            .context("building mock provider URL")?;
        let consumer: Arc<dyn OpenIdConsumer> = Arc::new(MockConsumer::new(provider_url));
        let accounts = Arc::new(accounts);
        let builder = Endpoint::builder(config.endpoint.clone(), consumer);

        let (builder, binding, sessions) = match config.binding {
            BindingKind::Session => {
                let sessions = Arc::new(SessionBinding::new(
                    Arc::new(SessionStore::new()),
                    config.session.clone(),
                ));
                let builder = if config.account_linking {
                    builder.account_linking(accounts.clone(), sessions.clone())
                } else {
                    builder.binding(sessions.clone())
                };
                let binding: Arc<dyn IdentityBinding> = sessions.clone();
                (builder, binding, Some(sessions))
            }
            BindingKind::Cookie => {
                let binding: Arc<dyn IdentityBinding> = Arc::new(CookieBinding::new(
                    config.cookie.clone(),
                    &config.secret_key,
                ));
                (builder.binding(binding.clone()), binding, None)
            }
        };

        tracing::info!(
            binding = ?config.binding,
            account_linking = config.account_linking && sessions.is_some(),
            mount_path = %config.endpoint.mount_path,
            "Configured OpenID endpoint"
        );

        Ok(Self {
            endpoint: builder.build()?,
            binding,
            sessions,
            accounts,
        })
    }
}
