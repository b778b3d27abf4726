//! The mountable OpenID endpoint.
//!
//! One [`Endpoint`] serves every sub-operation under its mount path:
//!
//! - `GET|POST <mount>/` - login form / start login
//! - `GET|POST <mount>/complete/` - verify the provider response
//! - `GET <mount>/logout/` - forget identities (needs a binding)
//! - `GET <mount>/logo/` - OpenID logo
//! - `GET <mount>/debug/` - JSON dump (only when `debug` is enabled)
//! - `GET <mount>/associate/` - account association screen (account linking only)

mod handlers;
mod outcome;

use std::sync::Arc;

use axum::{routing::any, Router};
use relyingparty_core::protocol::{build_extension_args, ExtensionArg, Operation};
use relyingparty_core::OpenIdConsumer;

use crate::binding::IdentityBinding;
use crate::config::EndpointConfig;
use crate::error::AuthError;

pub use outcome::{LoginContext, LoginOutcome, RedirectAfterLogin, ShowIdentity};

/// A configured OpenID endpoint. Cheap to clone.
#[derive(Clone)]
pub struct Endpoint {
    inner: Arc<EndpointInner>,
}

struct EndpointInner {
    config: EndpointConfig,
    extension_args: Vec<ExtensionArg>,
    consumer: Arc<dyn OpenIdConsumer>,
    binding: Option<Arc<dyn IdentityBinding>>,
    outcome: Arc<dyn LoginOutcome>,
}

/// Builder for [`Endpoint`].
pub struct EndpointBuilder {
    config: EndpointConfig,
    consumer: Arc<dyn OpenIdConsumer>,
    binding: Option<Arc<dyn IdentityBinding>>,
    outcome: Option<Arc<dyn LoginOutcome>>,
}

impl EndpointBuilder {
    /// Persist verified identities with `binding`. Enables `logout`.
    pub fn binding(mut self, binding: Arc<dyn IdentityBinding>) -> Self {
        self.binding = Some(binding);
        self
    }

    pub fn outcome(mut self, outcome: Arc<dyn LoginOutcome>) -> Self {
        self.outcome = Some(outcome);
        self
    }

    pub(crate) fn config(&self) -> &EndpointConfig {
        &self.config
    }

    /// Build the endpoint.
    ///
    /// Without an explicit outcome, an endpoint with a binding redirects
    /// after login and one without shows the verified identity.
    ///
    /// # Errors
    ///
    /// Returns an error if a configured extension argument is not
    /// `<namespace>.<key>`.
    pub fn build(self) -> Result<Endpoint, AuthError> {
        let extension_args = build_extension_args(&self.config.extension_args, &self.config.sreg)?;

        let outcome = match (self.outcome, &self.binding) {
            (Some(outcome), _) => outcome,
            (None, Some(_)) => Arc::new(RedirectAfterLogin {
                after_login: self.config.redirect_after_login.clone(),
                after_logout: self.config.redirect_after_logout.clone(),
            }) as Arc<dyn LoginOutcome>,
            (None, None) => Arc::new(ShowIdentity),
        };

        Ok(Endpoint {
            inner: Arc::new(EndpointInner {
                config: self.config,
                extension_args,
                consumer: self.consumer,
                binding: self.binding,
                outcome,
            }),
        })
    }
}

impl Endpoint {
    pub fn builder(config: EndpointConfig, consumer: Arc<dyn OpenIdConsumer>) -> EndpointBuilder {
        EndpointBuilder {
            config,
            consumer,
            binding: None,
            outcome: None,
        }
    }

    pub fn config(&self) -> &EndpointConfig {
        &self.inner.config
    }

    pub fn binding(&self) -> Option<Arc<dyn IdentityBinding>> {
        self.inner.binding.clone()
    }

    /// Whether the sub-operation is served by this endpoint.
    pub fn supports(&self, operation: Operation) -> bool {
        match operation {
            Operation::Login | Operation::Complete | Operation::Logo => true,
            Operation::Logout => self.inner.binding.is_some(),
            Operation::Debug => self.inner.config.debug,
            Operation::Associate => self.inner.outcome.supports_association(),
        }
    }

    /// Router serving the endpoint under its mount path.
    pub fn router<S>(&self) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        let base = self.inner.config.base_path();
        let mut router = Router::new();
        if !base.is_empty() {
            router = router.route(base, any(handlers::dispatch));
        }
        router
            .route(&format!("{base}/"), any(handlers::dispatch))
            .route(&format!("{base}/{{*rest}}"), any(handlers::dispatch))
            .with_state(self.clone())
    }

    /// Path of the endpoint root, with a trailing slash.
    fn root_path(&self) -> String {
        format!("{}/", self.inner.config.base_path())
    }
}
