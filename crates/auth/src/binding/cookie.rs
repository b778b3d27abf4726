use async_trait::async_trait;
use axum::http::{header::SET_COOKIE, HeaderValue};
use axum::response::Response;
use axum_extra::extract::cookie::{Cookie, SameSite};
use axum_extra::extract::CookieJar;
use relyingparty_core::codec::{SigningKey, TokenCodec};
use relyingparty_core::{IdentityRecord, IdentityUrl};
use serde_json::json;

use super::{IdentityBinding, RequestIdentities};
use crate::config::CookieConfig;
use crate::error::AuthError;

/// Keeps a single identity in a signed cookie. The last login wins.
pub struct CookieBinding {
    codec: TokenCodec,
    config: CookieConfig,
}

impl CookieBinding {
    /// `application_secret` signs tokens unless the cookie config carries
    /// its own secret.
    pub fn new(config: CookieConfig, application_secret: &str) -> Self {
        let key = SigningKey::resolve(config.secret_key.as_deref(), application_secret);
        Self {
            codec: TokenCodec::new(key, config.scheme),
            config,
        }
    }

    pub fn config(&self) -> &CookieConfig {
        &self.config
    }

    fn identity_cookie(&self, value: String) -> Cookie<'static> {
        let mut cookie = Cookie::build((self.config.name.clone(), value))
            .path(self.config.path.clone())
            .http_only(self.config.http_only)
            .same_site(SameSite::Lax)
            .build();

        if let Some(domain) = &self.config.domain {
            cookie.set_domain(domain.clone());
        }
        if let Some(secure) = self.config.secure {
            cookie.set_secure(secure);
        }
        if let Some(max_age) = self.config.max_age {
            cookie.set_max_age(time::Duration::try_from(max_age).unwrap_or(time::Duration::MAX));
        }
        if let Some(expires) = self.config.expires {
            cookie.set_expires(expires);
        }
        cookie
    }

    /// Cookie matching the identity cookie's name, path and domain, so that
    /// deleting it hits the right cookie.
    fn removal_cookie(&self) -> Cookie<'static> {
        let mut cookie = Cookie::build((self.config.name.clone(), ""))
            .path(self.config.path.clone())
            .build();
        if let Some(domain) = &self.config.domain {
            cookie.set_domain(domain.clone());
        }
        cookie
    }

    fn response_sets_cookie(&self, response: &Response) -> bool {
        let prefix = format!("{}=", self.config.name);
        response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .any(|value| value.starts_with(&prefix))
    }
}

#[async_trait]
impl IdentityBinding for CookieBinding {
    async fn before_handle(&self, jar: &CookieJar) -> Result<RequestIdentities, AuthError> {
        let Some(cookie) = jar.get(&self.config.name) else {
            return Ok(RequestIdentities::default());
        };

        match self.codec.decode(cookie.value()) {
            Ok(record) => Ok(RequestIdentities::from_records(vec![record])),
            Err(e) if e.is_rejection() => {
                tracing::warn!(error = %e, "Rejected identity cookie");
                Ok(RequestIdentities {
                    clear_cookie: true,
                    ..RequestIdentities::default()
                })
            }
            Err(e) => {
                tracing::error!(error = %e, "Identity cookie passed verification but did not decode");
                Err(e.into())
            }
        }
    }

    fn after_handle(&self, identities: &RequestIdentities, mut response: Response) -> Response {
        if !identities.clear_cookie || self.response_sets_cookie(&response) {
            return response;
        }

        let mut removal = self.removal_cookie();
        removal.make_removal();
        match HeaderValue::from_str(&removal.to_string()) {
            Ok(value) => {
                response.headers_mut().append(SET_COOKIE, value);
            }
            Err(e) => tracing::error!(error = %e, "Cannot build identity cookie removal header"),
        }
        response
    }

    async fn bind(&self, jar: CookieJar, record: IdentityRecord) -> Result<CookieJar, AuthError> {
        tracing::info!(identity = %record.identity_url, "Binding OpenID to cookie");
        let token = self.codec.encode(&record)?;
        Ok(jar.add(self.identity_cookie(token)))
    }

    async fn unbind(
        &self,
        jar: CookieJar,
        _identity: Option<&IdentityUrl>,
    ) -> Result<CookieJar, AuthError> {
        Ok(jar.remove(self.removal_cookie()))
    }

    async fn describe(&self, jar: &CookieJar) -> serde_json::Value {
        match jar.get(&self.config.name) {
            Some(cookie) => match self.codec.decode(cookie.value()) {
                Ok(record) => json!({
                    "binding": "cookie",
                    "scheme": self.codec.scheme().to_string(),
                    "identity": record,
                }),
                Err(e) => json!({
                    "binding": "cookie",
                    "scheme": self.codec.scheme().to_string(),
                    "error": e.to_string(),
                }),
            },
            None => json!({
                "binding": "cookie",
                "scheme": self.codec.scheme().to_string(),
                "identity": null,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::response::IntoResponse;
    use chrono::Utc;
    use relyingparty_core::codec::SignatureScheme;

    fn binding() -> CookieBinding {
        CookieBinding::new(CookieConfig::default(), "app-secret")
    }

    fn record(url: &str) -> IdentityRecord {
        IdentityRecord::new(IdentityUrl::from(url), Default::default(), Utc::now())
    }

    fn request_jar(name: &str, value: &str) -> CookieJar {
        let mut headers = axum::http::HeaderMap::new();
        headers.insert(
            axum::http::header::COOKIE,
            HeaderValue::from_str(&format!("{name}={value}")).unwrap(),
        );
        CookieJar::from_headers(&headers)
    }

    fn set_cookies(response: &Response) -> Vec<String> {
        response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .map(|v| v.to_str().unwrap().to_string())
            .collect()
    }

    #[tokio::test]
    async fn bound_identity_is_read_back() {
        let binding = binding();

        let jar = binding.bind(CookieJar::new(), record("http://a.example/")).await.unwrap();
        let identities = binding.before_handle(&jar).await.unwrap();

        assert_eq!(
            identities.primary.unwrap().identity_url.as_str(),
            "http://a.example/"
        );
        assert_eq!(identities.all.len(), 1);
        assert!(!identities.clear_cookie);
    }

    #[tokio::test]
    async fn last_login_wins() {
        let binding = binding();

        let jar = binding.bind(CookieJar::new(), record("http://a.example/")).await.unwrap();
        let jar = binding.bind(jar, record("http://b.example/")).await.unwrap();
        let identities = binding.before_handle(&jar).await.unwrap();

        assert_eq!(identities.all.len(), 1);
        assert_eq!(
            identities.primary.unwrap().identity_url.as_str(),
            "http://b.example/"
        );
    }

    #[tokio::test]
    async fn forged_cookie_is_ignored_and_cleared() {
        let binding = binding();
        let jar = request_jar("openid", "forged:deadbeef");

        let identities = binding.before_handle(&jar).await.unwrap();
        assert!(!identities.is_logged_in());
        assert!(identities.clear_cookie);

        let response = binding.after_handle(&identities, "ok".into_response());
        let cookies = set_cookies(&response);
        assert_eq!(cookies.len(), 1);
        assert!(cookies[0].starts_with("openid="));
        assert!(cookies[0].contains("Max-Age=0"));
        assert!(cookies[0].contains("Path=/"));
    }

    #[tokio::test]
    async fn malformed_cookie_is_cleared() {
        let binding = binding();
        let jar = request_jar("openid", "no-separator");

        let identities = binding.before_handle(&jar).await.unwrap();
        assert!(identities.clear_cookie);
    }

    #[tokio::test]
    async fn signed_but_undecodable_cookie_is_fatal() {
        let payload = "bm90IHpsaWI=";
        let signature = SignatureScheme::LegacySha1
            .sign(&SigningKey::new("app-secret"), payload.as_bytes())
            .unwrap();
        let jar = request_jar("openid", &format!("{payload}:{signature}"));

        let err = binding().before_handle(&jar).await.unwrap_err();
        assert!(matches!(
            err,
            AuthError::Codec(relyingparty_core::codec::CodecError::CorruptPayload(_))
        ));
        assert_eq!(
            err.into_response().status(),
            axum::http::StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn token_from_other_secret_is_rejected() {
        let other = CookieBinding::new(CookieConfig::default(), "other-secret");
        let jar = other.bind(CookieJar::new(), record("http://a.example/")).await.unwrap();

        let identities = binding().before_handle(&jar).await.unwrap();
        assert!(!identities.is_logged_in());
        assert!(identities.clear_cookie);
    }

    #[tokio::test]
    async fn cookie_secret_overrides_application_secret() {
        let config = CookieConfig {
            secret_key: Some("cookie-secret".to_string()),
            ..CookieConfig::default()
        };
        let signer = CookieBinding::new(config.clone(), "app-secret");
        let verifier = CookieBinding::new(config, "different-app-secret");

        let jar = signer.bind(CookieJar::new(), record("http://a.example/")).await.unwrap();
        let identities = verifier.before_handle(&jar).await.unwrap();
        assert!(identities.is_logged_in());
    }

    #[tokio::test]
    async fn schemes_do_not_cross_verify() {
        let hmac = CookieBinding::new(
            CookieConfig {
                scheme: SignatureScheme::HmacSha256,
                ..CookieConfig::default()
            },
            "app-secret",
        );
        let jar = hmac.bind(CookieJar::new(), record("http://a.example/")).await.unwrap();

        assert!(hmac.before_handle(&jar).await.unwrap().is_logged_in());
        assert!(!binding().before_handle(&jar).await.unwrap().is_logged_in());
    }

    #[tokio::test]
    async fn after_handle_keeps_handler_cookie() {
        let binding = binding();
        let identities = RequestIdentities {
            clear_cookie: true,
            ..RequestIdentities::default()
        };

        let jar = binding.bind(CookieJar::new(), record("http://a.example/")).await.unwrap();
        let response = binding.after_handle(&identities, (jar, "ok").into_response());

        let cookies = set_cookies(&response);
        assert_eq!(cookies.len(), 1);
        assert!(!cookies[0].contains("Max-Age=0"));
    }

    #[tokio::test]
    async fn after_handle_leaves_valid_requests_alone() {
        let binding = binding();
        let response = binding.after_handle(&RequestIdentities::default(), "ok".into_response());
        assert!(set_cookies(&response).is_empty());
    }

    #[tokio::test]
    async fn unbind_removes_cookie_with_same_path_and_domain() {
        let config = CookieConfig {
            path: "/app".to_string(),
            domain: Some("rp.example".to_string()),
            ..CookieConfig::default()
        };
        let binding = CookieBinding::new(config, "app-secret");

        let jar = request_jar("openid", "anything");
        let jar = binding.unbind(jar, None).await.unwrap();
        let response = (jar, "bye").into_response();

        let cookies = set_cookies(&response);
        assert_eq!(cookies.len(), 1);
        assert!(cookies[0].contains("Path=/app"));
        assert!(cookies[0].contains("Domain=rp.example"));
    }

    #[tokio::test]
    async fn identity_cookie_carries_configured_attributes() {
        let config = CookieConfig {
            max_age: Some(std::time::Duration::from_secs(3600)),
            secure: Some(true),
            ..CookieConfig::default()
        };
        let binding = CookieBinding::new(config, "app-secret");

        let jar = binding.bind(CookieJar::new(), record("http://a.example/")).await.unwrap();
        let cookie = jar.get("openid").unwrap();

        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.max_age(), Some(time::Duration::seconds(3600)));
        assert_eq!(cookie.path(), Some("/"));
    }

    #[tokio::test]
    async fn oversized_max_age_saturates() {
        let config = CookieConfig {
            max_age: Some(std::time::Duration::from_secs(u64::MAX)),
            ..CookieConfig::default()
        };
        let binding = CookieBinding::new(config, "app-secret");

        let jar = binding.bind(CookieJar::new(), record("http://a.example/")).await.unwrap();
        assert_eq!(jar.get("openid").unwrap().max_age(), Some(time::Duration::MAX));
    }
}
