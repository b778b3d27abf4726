//! Where verified identities live between requests.
//!
//! Two strategies are provided: [`SessionBinding`] keeps any number of
//! identities in server-side session state, [`CookieBinding`] keeps exactly
//! one in a signed cookie. Both plug into [`identity_context`] which runs
//! [`IdentityBinding::before_handle`] before every request and
//! [`IdentityBinding::after_handle`] on every response.
//!
//! [`identity_context`]: crate::middleware::identity_context

mod cookie;
mod session;

use async_trait::async_trait;
use axum::response::Response;
use axum_extra::extract::CookieJar;
use relyingparty_core::{IdentityRecord, IdentityUrl};

use crate::error::AuthError;

pub use cookie::CookieBinding;
pub use session::SessionBinding;

/// Identities attached to the current request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestIdentities {
    /// The first identity, if any.
    pub primary: Option<IdentityRecord>,
    /// All identities in order. Empty, or starting with `primary`.
    pub all: Vec<IdentityRecord>,
    /// Set when the incoming identity cookie failed verification and should
    /// be deleted on the way out.
    pub clear_cookie: bool,
}

impl RequestIdentities {
    pub fn from_records(all: Vec<IdentityRecord>) -> Self {
        Self {
            primary: all.first().cloned(),
            all,
            clear_cookie: false,
        }
    }

    pub fn is_logged_in(&self) -> bool {
        self.primary.is_some()
    }
}

#[async_trait]
pub trait IdentityBinding: Send + Sync {
    /// Read the identities carried by the incoming request.
    async fn before_handle(&self, jar: &CookieJar) -> Result<RequestIdentities, AuthError>;

    /// Post-process the outgoing response.
    fn after_handle(&self, _identities: &RequestIdentities, response: Response) -> Response {
        response
    }

    /// Persist a freshly verified identity.
    async fn bind(&self, jar: CookieJar, record: IdentityRecord) -> Result<CookieJar, AuthError>;

    /// Forget one identity, or all of them when `identity` is `None`.
    async fn unbind(
        &self,
        jar: CookieJar,
        identity: Option<&IdentityUrl>,
    ) -> Result<CookieJar, AuthError>;

    /// Query parameter naming a single identity to log out, if supported.
    fn logout_selector(&self) -> Option<&str> {
        None
    }

    /// JSON description of the binding state, for the debug page.
    async fn describe(&self, jar: &CookieJar) -> serde_json::Value;
}
