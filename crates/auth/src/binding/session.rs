use std::sync::Arc;

use async_trait::async_trait;
use axum_extra::extract::cookie::{Cookie, SameSite};
use axum_extra::extract::CookieJar;
use chrono::Utc;
use relyingparty_core::session::{
    calculate_expiry, generate_session_id, is_session_expired, Principal, SessionData, SessionId,
    SessionRepository,
};
use relyingparty_core::{IdentityRecord, IdentityUrl, SessionIdentitySet};
use serde_json::json;

use super::{IdentityBinding, RequestIdentities};
use crate::config::SessionConfig;
use crate::error::AuthError;

/// Keeps every identity verified during a browser session in server-side
/// session state. The first one is the primary identity.
pub struct SessionBinding {
    store: Arc<dyn SessionRepository>,
    config: SessionConfig,
}

impl SessionBinding {
    pub fn new(store: Arc<dyn SessionRepository>, config: SessionConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Session ID carried by the request (or added to the jar earlier).
    pub fn session_id(&self, jar: &CookieJar) -> Option<SessionId> {
        jar.get(&self.config.cookie_name)
            .map(|cookie| SessionId::new(cookie.value().to_string()))
    }

    /// Load the live session for the jar. Missing and expired sessions
    /// both yield `None`.
    pub async fn load(&self, jar: &CookieJar) -> Result<Option<(SessionId, SessionData)>, AuthError> {
        let Some(id) = self.session_id(jar) else {
            return Ok(None);
        };

        match self.store.load(&id).await? {
            Some(data) if !is_session_expired(&data, Utc::now()) => Ok(Some((id, data))),
            Some(_) => {
                tracing::debug!("Ignoring expired session");
                Ok(None)
            }
            None => Ok(None),
        }
    }

    pub async fn identities(&self, jar: &CookieJar) -> Result<SessionIdentitySet, AuthError> {
        Ok(self
            .load(jar)
            .await?
            .map(|(_, data)| data.identities)
            .unwrap_or_default())
    }

    pub async fn principal(&self, jar: &CookieJar) -> Result<Option<Principal>, AuthError> {
        Ok(self.load(jar).await?.and_then(|(_, data)| data.principal))
    }

    /// Log the session in as `principal`.
    ///
    /// The session ID is rotated; identities already on the session are
    /// carried over.
    pub async fn log_in(&self, jar: CookieJar, principal: Principal) -> Result<CookieJar, AuthError> {
        let (old_id, mut data) = match self.load(&jar).await? {
            Some((id, data)) => (Some(id), data),
            None => (None, self.fresh_data()?),
        };
        data.principal = Some(principal);

        let id = generate_session_id();
        self.store.save(&id, &data).await?;
        if let Some(old_id) = old_id {
            self.store.delete(&old_id).await?;
        }

        Ok(jar.add(self.session_cookie(&id)?))
    }

    /// Read-modify-write the live session, creating one if needed.
    async fn modify<F>(&self, jar: CookieJar, change: F) -> Result<CookieJar, AuthError>
    where
        F: FnOnce(&mut SessionData) + Send,
    {
        let (id, mut data) = match self.load(&jar).await? {
            Some(found) => found,
            None => (generate_session_id(), self.fresh_data()?),
        };

        change(&mut data);
        self.store.save(&id, &data).await?;

        Ok(jar.add(self.session_cookie(&id)?))
    }

    fn fresh_data(&self) -> Result<SessionData, AuthError> {
        let now = Utc::now();
        let expires_at = calculate_expiry(now, self.config.ttl_delta()?).ok_or_else(|| {
            AuthError::Config("session expiry is out of the representable range".to_string())
        })?;
        Ok(SessionData::new(now, expires_at))
    }

    fn session_cookie(&self, id: &SessionId) -> Result<Cookie<'static>, AuthError> {
        let max_age = time::Duration::seconds(self.config.ttl_delta()?.num_seconds());
        Ok(Cookie::build((self.config.cookie_name.clone(), id.to_string()))
            .path("/")
            .http_only(true)
            .secure(self.config.cookie_secure)
            .same_site(SameSite::Lax)
            .max_age(max_age)
            .build())
    }
}

#[async_trait]
impl IdentityBinding for SessionBinding {
    async fn before_handle(&self, jar: &CookieJar) -> Result<RequestIdentities, AuthError> {
        let identities = self.identities(jar).await?;
        Ok(RequestIdentities::from_records(identities.to_vec()))
    }

    async fn bind(&self, jar: CookieJar, record: IdentityRecord) -> Result<CookieJar, AuthError> {
        tracing::info!(identity = %record.identity_url, "Binding OpenID to session");
        self.modify(jar, move |data| data.identities.insert(record))
            .await
    }

    async fn unbind(
        &self,
        jar: CookieJar,
        identity: Option<&IdentityUrl>,
    ) -> Result<CookieJar, AuthError> {
        if self.session_id(&jar).is_none() {
            return Ok(jar);
        }

        let identity = identity.cloned();
        self.modify(jar, move |data| match identity {
            Some(url) => {
                if !data.identities.remove(&url) {
                    tracing::debug!(identity = %url, "OpenID was not on the session");
                }
            }
            None => data.identities.clear(),
        })
        .await
    }

    fn logout_selector(&self) -> Option<&str> {
        Some(&self.config.logout_selector)
    }

    async fn describe(&self, jar: &CookieJar) -> serde_json::Value {
        match self.load(jar).await {
            Ok(Some((_, data))) => json!({
                "binding": "session",
                "identities": data.identities,
                "principal": data.principal,
                "expires_at": data.expires_at,
            }),
            Ok(None) => json!({ "binding": "session", "identities": [] }),
            Err(e) => json!({ "binding": "session", "error": e.to_string() }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sessions::SessionStore;
    use chrono::Duration;
    use relyingparty_core::AccountId;

    fn binding() -> (SessionBinding, SessionStore) {
        let store = SessionStore::new();
        let binding = SessionBinding::new(Arc::new(store.clone()), SessionConfig::default());
        (binding, store)
    }

    fn record(url: &str) -> IdentityRecord {
        IdentityRecord::new(IdentityUrl::from(url), Default::default(), Utc::now())
    }

    fn urls(identities: &RequestIdentities) -> Vec<&str> {
        identities
            .all
            .iter()
            .map(|r| r.identity_url.as_str())
            .collect()
    }

    #[tokio::test]
    async fn first_bound_identity_is_primary() {
        let (binding, _) = binding();

        let jar = binding.bind(CookieJar::new(), record("http://a.example/")).await.unwrap();
        let jar = binding.bind(jar, record("http://b.example/")).await.unwrap();

        let identities = binding.before_handle(&jar).await.unwrap();
        assert_eq!(urls(&identities), vec!["http://a.example/", "http://b.example/"]);
        assert_eq!(
            identities.primary.unwrap().identity_url.as_str(),
            "http://a.example/"
        );
    }

    #[tokio::test]
    async fn rebinding_moves_identity_to_back() {
        let (binding, _) = binding();

        let jar = binding.bind(CookieJar::new(), record("http://a.example/")).await.unwrap();
        let jar = binding.bind(jar, record("http://b.example/")).await.unwrap();
        let jar = binding.bind(jar, record("http://a.example/")).await.unwrap();

        let identities = binding.before_handle(&jar).await.unwrap();
        assert_eq!(urls(&identities), vec!["http://b.example/", "http://a.example/"]);
    }

    #[tokio::test]
    async fn unbind_one_keeps_the_rest() {
        let (binding, _) = binding();

        let jar = binding.bind(CookieJar::new(), record("http://a.example/")).await.unwrap();
        let jar = binding.bind(jar, record("http://b.example/")).await.unwrap();
        let jar = binding
            .unbind(jar, Some(&IdentityUrl::from("http://a.example/")))
            .await
            .unwrap();

        let identities = binding.before_handle(&jar).await.unwrap();
        assert_eq!(urls(&identities), vec!["http://b.example/"]);
    }

    #[tokio::test]
    async fn unbind_all_clears_session_identities() {
        let (binding, _) = binding();

        let jar = binding.bind(CookieJar::new(), record("http://a.example/")).await.unwrap();
        let jar = binding.unbind(jar, None).await.unwrap();

        let identities = binding.before_handle(&jar).await.unwrap();
        assert!(!identities.is_logged_in());
        assert!(identities.all.is_empty());
    }

    #[tokio::test]
    async fn unbind_without_session_is_noop() {
        let (binding, store) = binding();

        let jar = binding.unbind(CookieJar::new(), None).await.unwrap();

        assert!(binding.session_id(&jar).is_none());
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn expired_session_is_ignored() {
        let (binding, store) = binding();
        let id = SessionId::new("stale".to_string());
        let now = Utc::now();
        let mut data = SessionData::new(now - Duration::days(30), now - Duration::days(1));
        data.identities.insert(record("http://old.example/"));
        store.save(&id, &data).await.unwrap();

        let jar = CookieJar::new().add(Cookie::new("sessionid", "stale"));
        let identities = binding.before_handle(&jar).await.unwrap();
        assert!(identities.all.is_empty());

        let jar = binding.bind(jar, record("http://new.example/")).await.unwrap();
        assert_ne!(binding.session_id(&jar).unwrap().as_str(), "stale");
    }

    #[tokio::test]
    async fn log_in_rotates_session_and_keeps_identities() {
        let (binding, store) = binding();

        let jar = binding.bind(CookieJar::new(), record("http://a.example/")).await.unwrap();
        let old_id = binding.session_id(&jar).unwrap();

        let jar = binding
            .log_in(jar, Principal::openid(AccountId(7)))
            .await
            .unwrap();
        let new_id = binding.session_id(&jar).unwrap();

        assert_ne!(old_id, new_id);
        assert!(store.load(&old_id).await.unwrap().is_none());

        let principal = binding.principal(&jar).await.unwrap().unwrap();
        assert_eq!(principal.account, AccountId(7));
        assert!(principal.is_openid());
        assert_eq!(binding.identities(&jar).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn session_cookie_is_http_only_and_lax() {
        let (binding, _) = binding();

        let jar = binding.bind(CookieJar::new(), record("http://a.example/")).await.unwrap();
        let cookie = jar.get("sessionid").unwrap();

        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.path(), Some("/"));
    }

    #[tokio::test]
    async fn describe_lists_identities() {
        let (binding, _) = binding();

        let jar = binding.bind(CookieJar::new(), record("http://a.example/")).await.unwrap();
        let description = binding.describe(&jar).await;

        assert_eq!(description["binding"], "session");
        assert_eq!(description["identities"][0]["identity_url"], "http://a.example/");
    }

    #[tokio::test]
    async fn oversized_ttl_is_a_config_error() {
        let binding = SessionBinding::new(
            Arc::new(SessionStore::new()),
            SessionConfig {
                ttl: std::time::Duration::from_secs(u64::MAX),
                ..SessionConfig::default()
            },
        );

        let err = binding
            .bind(CookieJar::new(), record("http://a.example/"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Config(_)));
    }
}
