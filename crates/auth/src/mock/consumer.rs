use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use rand::{distr::Alphanumeric, Rng};
use relyingparty_core::protocol::{
    strip_query, AuthRequest, ConsumerResponse, DiscoveryFailure, OpenIdConsumer,
};
use relyingparty_core::{AuthError, IdentityUrl, Result, SregFields};
use tokio::sync::Mutex;
use url::Url;

/// How long a started login may wait for the provider's answer.
const PENDING_TTL: Duration = Duration::from_secs(10 * 60);

/// Upper bound on outstanding logins; the oldest are dropped first.
const MAX_PENDING: usize = 1024;

#[derive(Debug, Clone)]
struct Pending {
    identity: String,
    started: Instant,
    seq: u64,
}

#[derive(Debug, Default)]
struct PendingRequests {
    requests: HashMap<String, Pending>,
    next_seq: u64,
}

/// Mock consumer that works with the mock provider routes.
///
/// Pending requests are keyed by a nonce appended to `return_to`; each
/// nonce verifies at most one response. Abandoned requests expire.
#[derive(Debug, Clone)]
pub struct MockConsumer {
    provider_url: Url,
    pending: Arc<Mutex<PendingRequests>>,
    pending_ttl: Duration,
    max_pending: usize,
}

impl MockConsumer {
    /// Create a new MockConsumer.
    ///
    /// # Arguments
    /// * `provider_url` - The mock provider's authorize URL
    ///   (e.g., http://localhost:3000/mock-provider/authorize)
    pub fn new(provider_url: Url) -> Self {
        Self {
            provider_url,
            pending: Arc::new(Mutex::new(PendingRequests::default())),
            pending_ttl: PENDING_TTL,
            max_pending: MAX_PENDING,
        }
    }

    /// Override how long pending logins live and how many are kept.
    pub fn with_limits(mut self, pending_ttl: Duration, max_pending: usize) -> Self {
        self.pending_ttl = pending_ttl;
        self.max_pending = max_pending.max(1);
        self
    }

    /// Number of logins waiting for the provider.
    pub async fn pending_len(&self) -> usize {
        self.pending.lock().await.requests.len()
    }

    async fn remember(&self, nonce: String, identity: String) {
        let mut pending = self.pending.lock().await;
        let ttl = self.pending_ttl;
        pending
            .requests
            .retain(|_, request| request.started.elapsed() < ttl);

        while pending.requests.len() >= self.max_pending {
            let oldest = pending
                .requests
                .iter()
                .min_by_key(|(_, request)| request.seq)
                .map(|(nonce, _)| nonce.clone());
            match oldest {
                Some(nonce) => {
                    pending.requests.remove(&nonce);
                }
                None => break,
            }
        }

        let seq = pending.next_seq;
        pending.next_seq += 1;
        pending.requests.insert(
            nonce,
            Pending {
                identity,
                started: Instant::now(),
                seq,
            },
        );
    }

    async fn take(&self, nonce: &str) -> Option<String> {
        let request = self.pending.lock().await.requests.remove(nonce)?;
        (request.started.elapsed() < self.pending_ttl).then_some(request.identity)
    }
}

/// Turn a claimed identifier into the identity URL the mock provider
/// asserts. Hosts under `.invalid` never resolve.
pub fn normalize_identifier(claimed: &str) -> std::result::Result<String, DiscoveryFailure> {
    let candidate = if claimed.contains("://") {
        claimed.to_string()
    } else {
        format!("http://{claimed}")
    };

    let url = Url::parse(&candidate).map_err(|e| DiscoveryFailure(format!("{claimed}: {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(DiscoveryFailure(format!("{claimed}: unsupported scheme")));
    }
    match url.host_str() {
        None => Err(DiscoveryFailure(format!("{claimed}: no host"))),
        Some(host) if host.ends_with(".invalid") => {
            Err(DiscoveryFailure(format!("{claimed}: no OpenID provider found")))
        }
        Some(_) => Ok(url.to_string()),
    }
}

/// Build the URL the mock provider sends the browser back to.
///
/// `mode` is one of `id_res`, `cancel`, `setup_needed` or `error`.
pub fn assertion_url(
    return_to: &str,
    mode: &str,
    identity: &str,
    sreg: &SregFields,
) -> std::result::Result<Url, url::ParseError> {
    let mut url = Url::parse(return_to)?;
    {
        let mut pairs = url.query_pairs_mut();
        pairs
            .append_pair("openid.mode", mode)
            .append_pair("openid.identity", identity)
            .append_pair("openid.return_to", return_to);
        for (field, value) in sreg {
            pairs.append_pair(&format!("openid.sreg.{field}"), value);
        }
    }
    Ok(url)
}

fn generate_nonce() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(16)
        .map(char::from)
        .collect()
}

struct MockAuthRequest {
    provider_url: Url,
    identity: String,
    nonce: String,
    extension_args: Vec<(String, String, String)>,
}

impl AuthRequest for MockAuthRequest {
    fn add_extension_arg(&mut self, namespace: &str, key: &str, value: &str) {
        self.extension_args
            .push((namespace.to_string(), key.to_string(), value.to_string()));
    }

    fn redirect_url(&self, trust_root: &str, return_to: &str) -> Result<Url> {
        let mut return_to = Url::parse(return_to)
            .map_err(|e| AuthError::Consumer(format!("invalid return_to: {e}")))?;
        return_to.query_pairs_mut().append_pair("rp_nonce", &self.nonce);

        let mut url = self.provider_url.clone();
        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("openid.mode", "checkid_setup")
                .append_pair("openid.identity", &self.identity)
                .append_pair("openid.trust_root", trust_root)
                .append_pair("openid.return_to", return_to.as_str());
            for (namespace, key, value) in &self.extension_args {
                pairs.append_pair(&format!("openid.{namespace}.{key}"), value);
            }
        }
        Ok(url)
    }
}

#[async_trait]
impl OpenIdConsumer for MockConsumer {
    async fn begin(
        &self,
        claimed_identifier: &str,
    ) -> std::result::Result<Box<dyn AuthRequest>, DiscoveryFailure> {
        let identity = normalize_identifier(claimed_identifier)?;
        let nonce = generate_nonce();
        self.remember(nonce.clone(), identity.clone()).await;

        Ok(Box::new(MockAuthRequest {
            provider_url: self.provider_url.clone(),
            identity,
            nonce,
            extension_args: Vec::new(),
        }))
    }

    async fn complete(
        &self,
        query: &BTreeMap<String, String>,
        return_to: &str,
    ) -> Result<ConsumerResponse> {
        let Some(nonce) = query.get("rp_nonce") else {
            return Ok(ConsumerResponse::failure("missing nonce"));
        };
        let Some(identity) = self.take(nonce).await else {
            return Ok(ConsumerResponse::failure("unknown, expired or replayed nonce"));
        };

        match query.get("openid.mode").map(String::as_str) {
            Some("id_res") => {
                let echoed = query.get("openid.return_to").map(|s| strip_query(s));
                if echoed != Some(return_to) {
                    return Ok(ConsumerResponse::failure("return_to does not match"));
                }
                if query.get("openid.identity") != Some(&identity) {
                    return Ok(ConsumerResponse::failure("asserted identity does not match"));
                }

                let sreg: SregFields = query
                    .iter()
                    .filter_map(|(name, value)| {
                        name.strip_prefix("openid.sreg.")
                            .map(|field| (field.to_string(), value.clone()))
                    })
                    .collect();
                Ok(ConsumerResponse::success(IdentityUrl::new(identity), sreg))
            }
            Some("cancel") => Ok(ConsumerResponse::cancel()),
            Some("setup_needed") => Ok(ConsumerResponse::setup_needed()),
            Some("error") => Ok(ConsumerResponse::failure(
                query
                    .get("openid.error")
                    .cloned()
                    .unwrap_or_else(|| "provider error".to_string()),
            )),
            other => Ok(ConsumerResponse::failure(format!(
                "unexpected openid.mode: {}",
                other.unwrap_or("<none>")
            ))),
        }
    }
}
