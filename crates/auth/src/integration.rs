//! Linking verified OpenIDs to local accounts.

use std::sync::Arc;

use async_trait::async_trait;
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::CookieJar;
use relyingparty_core::session::Principal;
use relyingparty_core::{reconcile, AccountId, AccountStore, IdentityRecord, Reconciliation};

use crate::binding::SessionBinding;
use crate::endpoint::{EndpointBuilder, LoginContext, LoginOutcome};
use crate::error::AuthError;
use crate::templates::{
    AccountChoice, AssociateTemplate, HtmlTemplate, PickAccountTemplate, RegisterTemplate,
};

/// Login outcome that reconciles the verified identity with the account
/// store and the account the session is already logged in as.
pub struct AccountLinking {
    accounts: Arc<dyn AccountStore>,
    sessions: Arc<SessionBinding>,
    after_login: String,
    after_logout: String,
}

impl AccountLinking {
    pub fn new(accounts: Arc<dyn AccountStore>, sessions: Arc<SessionBinding>) -> Self {
        Self {
            accounts,
            sessions,
            after_login: "/".to_string(),
            after_logout: "/".to_string(),
        }
    }

    pub fn redirects(mut self, after_login: impl Into<String>, after_logout: impl Into<String>) -> Self {
        self.after_login = after_login.into();
        self.after_logout = after_logout.into();
        self
    }

    async fn label(&self, account: AccountId) -> Result<String, AuthError> {
        Ok(self
            .accounts
            .display_name(account)
            .await?
            .unwrap_or_else(|| account.to_string()))
    }

    async fn associate_page(
        &self,
        jar: &CookieJar,
        account: AccountId,
        specific_openid: Option<String>,
    ) -> Result<Response, AuthError> {
        let openids = self
            .sessions
            .identities(jar)
            .await?
            .iter()
            .map(|record| record.identity_url.to_string())
            .collect();

        Ok(HtmlTemplate(AssociateTemplate {
            account: self.label(account).await?,
            specific_openid,
            openids,
        })
        .into_response())
    }
}

#[async_trait]
impl LoginOutcome for AccountLinking {
    async fn on_logged_in(
        &self,
        ctx: &LoginContext,
        jar: CookieJar,
        record: &IdentityRecord,
    ) -> Result<(CookieJar, Response), AuthError> {
        let matches = self
            .accounts
            .find_accounts_by_identity(&record.identity_url)
            .await?;
        let principal = self.sessions.principal(&jar).await?;
        let current = principal.as_ref().map(|principal| principal.account);

        let decision = reconcile(current, &matches);
        tracing::info!(identity = %record.identity_url, ?decision, "Reconciled OpenID with accounts");

        let destination = ctx.next.as_deref().unwrap_or(&self.after_login);
        match decision {
            Reconciliation::AlreadyLinked => {
                Ok((jar, Redirect::to(destination).into_response()))
            }
            Reconciliation::OfferAssociation => {
                // `current` is always set for this outcome.
                let account = current.ok_or(relyingparty_core::AuthError::NotAuthenticated)?;
                let page = self
                    .associate_page(&jar, account, Some(record.identity_url.to_string()))
                    .await?;
                Ok((jar, page))
            }
            Reconciliation::LogInAs(account) => {
                let jar = self.sessions.log_in(jar, Principal::openid(account)).await?;
                Ok((jar, Redirect::to(destination).into_response()))
            }
            Reconciliation::OfferAccountPicker(candidates) => {
                let mut accounts = Vec::with_capacity(candidates.len());
                for account in candidates {
                    accounts.push(AccountChoice {
                        id: account.0,
                        name: self.label(account).await?,
                    });
                }
                let page = HtmlTemplate(PickAccountTemplate {
                    identity_url: record.identity_url.to_string(),
                    accounts,
                });
                Ok((jar, page.into_response()))
            }
            Reconciliation::OfferRegistration => {
                let page = HtmlTemplate(RegisterTemplate {
                    identity_url: record.identity_url.to_string(),
                    sreg: record
                        .sreg
                        .iter()
                        .map(|(field, value)| (field.clone(), value.clone()))
                        .collect(),
                });
                Ok((jar, page.into_response()))
            }
        }
    }

    async fn on_logged_out(&self, ctx: &LoginContext) -> Result<Response, AuthError> {
        let destination = ctx.next.as_deref().unwrap_or(&self.after_logout);
        Ok(Redirect::to(destination).into_response())
    }

    fn supports_association(&self) -> bool {
        true
    }

    async fn associate(&self, ctx: &LoginContext, jar: &CookieJar) -> Result<Response, AuthError> {
        let principal = self
            .sessions
            .principal(jar)
            .await?
            .ok_or(relyingparty_core::AuthError::NotAuthenticated)?;

        let specific = ctx
            .params
            .get("openid")
            .filter(|value| !value.is_empty())
            .cloned();
        self.associate_page(jar, principal.account, specific).await
    }
}

impl EndpointBuilder {
    /// Bind identities to `sessions` and reconcile logins against `accounts`.
    pub fn account_linking(
        self,
        accounts: Arc<dyn AccountStore>,
        sessions: Arc<SessionBinding>,
    ) -> Self {
        let outcome = AccountLinking::new(accounts, sessions.clone()).redirects(
            self.config().redirect_after_login.clone(),
            self.config().redirect_after_logout.clone(),
        );
        self.binding(sessions).outcome(Arc::new(outcome))
    }
}
