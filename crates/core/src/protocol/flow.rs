use std::collections::BTreeMap;

use url::Url;

use super::{
    identifier_scheme, strip_query, ExtensionArg, IdentifierScheme, OpenIdConsumer,
    ProtocolResult,
};
use crate::error::{AuthError, Result};

/// Start a login: validate the identifier, discover, attach extension
/// arguments, and return the provider redirect URL.
///
/// # Errors
///
/// - `MissingIdentifier` for an empty identifier
/// - `UnsupportedIdentifierScheme` for an XRI when `xri_enabled` is false;
///   discovery is not attempted
/// - `InvalidIdentifier` when discovery fails
pub async fn begin_login(
    consumer: &dyn OpenIdConsumer,
    claimed_identifier: &str,
    trust_root: &str,
    return_to: &str,
    extension_args: &[ExtensionArg],
    xri_enabled: bool,
) -> Result<Url> {
    let claimed_identifier = claimed_identifier.trim();
    if claimed_identifier.is_empty() {
        return Err(AuthError::MissingIdentifier);
    }

    if identifier_scheme(claimed_identifier) == IdentifierScheme::Xri && !xri_enabled {
        return Err(AuthError::UnsupportedIdentifierScheme(
            claimed_identifier.to_string(),
        ));
    }

    let mut auth_request = consumer.begin(claimed_identifier).await.map_err(|e| {
        tracing::warn!(claimed = %claimed_identifier, error = %e, "OpenID discovery failed");
        AuthError::InvalidIdentifier(e.0)
    })?;

    for arg in extension_args {
        auth_request.add_extension_arg(&arg.namespace, &arg.key, &arg.value);
    }

    let redirect = auth_request.redirect_url(trust_root, return_to)?;
    tracing::debug!(claimed = %claimed_identifier, provider = %redirect, "Redirecting to OpenID provider");
    Ok(redirect)
}

/// Finish a login by verifying the provider's response.
///
/// `return_url` may be the full URL of the inbound request; its query is
/// stripped before it is handed to the consumer.
pub async fn complete_login(
    consumer: &dyn OpenIdConsumer,
    query: &BTreeMap<String, String>,
    return_url: &str,
) -> Result<ProtocolResult> {
    let response = consumer.complete(query, strip_query(return_url)).await?;
    tracing::debug!(status = %response.status, "OpenID response verified");
    ProtocolResult::from_response(response)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::identity::SregFields;
    use crate::protocol::{AuthRequest, ConsumerResponse, DiscoveryFailure};

    #[derive(Default)]
    struct RecordingConsumer {
        begun: Mutex<Vec<String>>,
        completed_with: Mutex<Vec<String>>,
        fail_discovery: bool,
        response: Option<ConsumerResponse>,
    }

    struct RecordingRequest {
        endpoint: String,
        args: Vec<(String, String, String)>,
    }

    impl AuthRequest for RecordingRequest {
        fn add_extension_arg(&mut self, namespace: &str, key: &str, value: &str) {
            self.args
                .push((namespace.to_string(), key.to_string(), value.to_string()));
        }

        fn redirect_url(&self, trust_root: &str, return_to: &str) -> Result<Url> {
            let mut url = Url::parse(&self.endpoint).map_err(|e| AuthError::Consumer(e.to_string()))?;
            {
                let mut pairs = url.query_pairs_mut();
                pairs
                    .append_pair("openid.trust_root", trust_root)
                    .append_pair("openid.return_to", return_to);
                for (ns, key, value) in &self.args {
                    pairs.append_pair(&format!("openid.{ns}.{key}"), value);
                }
            }
            Ok(url)
        }
    }

    #[async_trait]
    impl OpenIdConsumer for RecordingConsumer {
        async fn begin(
            &self,
            claimed_identifier: &str,
        ) -> std::result::Result<Box<dyn AuthRequest>, DiscoveryFailure> {
            self.begun
                .lock()
                .unwrap()
                .push(claimed_identifier.to_string());
            if self.fail_discovery {
                return Err(DiscoveryFailure("no provider".to_string()));
            }
            Ok(Box::new(RecordingRequest {
                endpoint: "https://provider.example/auth".to_string(),
                args: Vec::new(),
            }))
        }

        async fn complete(
            &self,
            _query: &BTreeMap<String, String>,
            return_to: &str,
        ) -> Result<ConsumerResponse> {
            self.completed_with
                .lock()
                .unwrap()
                .push(return_to.to_string());
            Ok(self.response.clone().unwrap_or_else(ConsumerResponse::cancel))
        }
    }

    #[tokio::test]
    async fn begin_embeds_trust_root_return_to_and_extension_args() {
        let consumer = RecordingConsumer::default();
        let args = vec![ExtensionArg {
            namespace: "sreg".into(),
            key: "optional".into(),
            value: "nickname,email".into(),
        }];

        let url = begin_login(
            &consumer,
            " https://alice.example.com/ ",
            "https://rp.example/",
            "https://rp.example/openid/complete/",
            &args,
            false,
        )
        .await
        .unwrap();

        let pairs: BTreeMap<_, _> = url.query_pairs().into_owned().collect();
        assert_eq!(pairs["openid.trust_root"], "https://rp.example/");
        assert_eq!(pairs["openid.return_to"], "https://rp.example/openid/complete/");
        assert_eq!(pairs["openid.sreg.optional"], "nickname,email");
        assert_eq!(*consumer.begun.lock().unwrap(), vec!["https://alice.example.com/"]);
    }

    #[tokio::test]
    async fn empty_identifier_is_rejected_before_discovery() {
        let consumer = RecordingConsumer::default();
        let result = begin_login(&consumer, "   ", "t", "r", &[], false).await;

        assert!(matches!(result, Err(AuthError::MissingIdentifier)));
        assert!(consumer.begun.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn xri_is_rejected_without_discovery() {
        let consumer = RecordingConsumer::default();
        let result = begin_login(&consumer, "=example.xri", "t", "r", &[], false).await;

        assert!(matches!(result, Err(AuthError::UnsupportedIdentifierScheme(_))));
        assert!(consumer.begun.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn xri_is_discovered_when_enabled() {
        let consumer = RecordingConsumer::default();
        let result = begin_login(&consumer, "=example.xri", "t", "r", &[], true).await;

        assert!(result.is_ok());
        assert_eq!(*consumer.begun.lock().unwrap(), vec!["=example.xri"]);
    }

    #[tokio::test]
    async fn discovery_failure_is_invalid_identifier() {
        let consumer = RecordingConsumer {
            fail_discovery: true,
            ..Default::default()
        };
        let result = begin_login(&consumer, "https://nobody.example/", "t", "r", &[], false).await;

        assert!(matches!(result, Err(AuthError::InvalidIdentifier(m)) if m == "no provider"));
    }

    #[tokio::test]
    async fn complete_strips_query_from_return_url() {
        let consumer = RecordingConsumer::default();
        let query = BTreeMap::new();

        for inbound in [
            "https://rp.example/openid/complete/?openid.mode=id_res&rp_nonce=abc",
            "https://rp.example/openid/complete/?next=/home?x=1",
            "https://rp.example/openid/complete/?",
            "https://rp.example/openid/complete/",
        ] {
            complete_login(&consumer, &query, inbound).await.unwrap();
        }

        let seen = consumer.completed_with.lock().unwrap();
        assert_eq!(seen.len(), 4);
        assert!(seen
            .iter()
            .all(|url| url == "https://rp.example/openid/complete/"));
    }

    #[tokio::test]
    async fn complete_maps_success() {
        let consumer = RecordingConsumer {
            response: Some(ConsumerResponse::success(
                "https://alice.example.com/".into(),
                SregFields::new(),
            )),
            ..Default::default()
        };

        let result = complete_login(&consumer, &BTreeMap::new(), "https://rp.example/c/")
            .await
            .unwrap();
        assert!(matches!(
            result,
            ProtocolResult::Success { identity_url, .. } if identity_url.as_str() == "https://alice.example.com/"
        ));
    }
}
