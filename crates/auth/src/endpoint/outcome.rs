use async_trait::async_trait;
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::CookieJar;
use relyingparty_core::IdentityRecord;

use crate::error::AuthError;
use crate::templates::{HtmlTemplate, LoggedInTemplate};

/// Per-request facts handed to a [`LoginOutcome`].
#[derive(Debug, Clone)]
pub struct LoginContext {
    /// Path of the endpoint's root, with a trailing slash.
    pub endpoint_path: String,
    /// Validated local destination requested by the caller.
    pub next: Option<String>,
    /// Query parameters of the request.
    pub params: std::collections::BTreeMap<String, String>,
}

/// What happens after a login completes or a logout is processed.
///
/// The protocol failure outcomes (cancel, failure, setup needed) render the
/// error page and never reach this trait.
#[async_trait]
pub trait LoginOutcome: Send + Sync {
    /// Respond to a verified login. The identity is already bound.
    async fn on_logged_in(
        &self,
        ctx: &LoginContext,
        jar: CookieJar,
        record: &IdentityRecord,
    ) -> Result<(CookieJar, Response), AuthError>;

    /// Respond to a processed logout.
    async fn on_logged_out(&self, ctx: &LoginContext) -> Result<Response, AuthError>;

    /// Whether the `associate` sub-operation is served.
    fn supports_association(&self) -> bool {
        false
    }

    async fn associate(&self, _ctx: &LoginContext, _jar: &CookieJar) -> Result<Response, AuthError> {
        Err(relyingparty_core::AuthError::NotFound("associate".to_string()).into())
    }
}

/// Shows "You logged in as <identity>".
#[derive(Debug, Clone, Default)]
pub struct ShowIdentity;

#[async_trait]
impl LoginOutcome for ShowIdentity {
    async fn on_logged_in(
        &self,
        _ctx: &LoginContext,
        jar: CookieJar,
        record: &IdentityRecord,
    ) -> Result<(CookieJar, Response), AuthError> {
        let page = HtmlTemplate(LoggedInTemplate {
            identity_url: record.identity_url.to_string(),
        });
        Ok((jar, page.into_response()))
    }

    async fn on_logged_out(&self, ctx: &LoginContext) -> Result<Response, AuthError> {
        Ok(Redirect::to(ctx.next.as_deref().unwrap_or("/")).into_response())
    }
}

/// Redirects to `next` or a fixed destination.
#[derive(Debug, Clone)]
pub struct RedirectAfterLogin {
    pub after_login: String,
    pub after_logout: String,
}

impl Default for RedirectAfterLogin {
    fn default() -> Self {
        Self {
            after_login: "/".to_string(),
            after_logout: "/".to_string(),
        }
    }
}

#[async_trait]
impl LoginOutcome for RedirectAfterLogin {
    async fn on_logged_in(
        &self,
        ctx: &LoginContext,
        jar: CookieJar,
        _record: &IdentityRecord,
    ) -> Result<(CookieJar, Response), AuthError> {
        let target = ctx.next.as_deref().unwrap_or(&self.after_login);
        Ok((jar, Redirect::to(target).into_response()))
    }

    async fn on_logged_out(&self, ctx: &LoginContext) -> Result<Response, AuthError> {
        let target = ctx.next.as_deref().unwrap_or(&self.after_logout);
        Ok(Redirect::to(target).into_response())
    }
}
