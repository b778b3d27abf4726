use std::collections::BTreeMap;

use async_trait::async_trait;
use thiserror::Error;
use url::Url;

use super::ConsumerResponse;
use crate::error::Result;

/// Discovery of a claimed identifier failed.
#[derive(Debug, Error)]
#[error("discovery failed: {0}")]
pub struct DiscoveryFailure(pub String);

/// A discovered, not yet redirected, authentication request.
pub trait AuthRequest: Send + Sync {
    /// Attach an extension argument such as `sreg.optional`.
    fn add_extension_arg(&mut self, namespace: &str, key: &str, value: &str);

    /// URL to redirect the user agent to.
    fn redirect_url(&self, trust_root: &str, return_to: &str) -> Result<Url>;
}

/// The OpenID discovery/verification library.
///
/// Owns pending-request state between `begin` and `complete`.
#[async_trait]
pub trait OpenIdConsumer: Send + Sync {
    /// Discover the provider for `claimed_identifier`.
    async fn begin(
        &self,
        claimed_identifier: &str,
    ) -> std::result::Result<Box<dyn AuthRequest>, DiscoveryFailure>;

    /// Verify the provider's response. `return_to` never carries a query string.
    async fn complete(
        &self,
        query: &BTreeMap<String, String>,
        return_to: &str,
    ) -> Result<ConsumerResponse>;
}
