use std::collections::BTreeMap;
use std::time::Duration;

use chrono::TimeDelta;
use relyingparty_core::codec::SignatureScheme;
use relyingparty_core::protocol::SregRequest;
use relyingparty_core::session::calculate_expiry;
use url::Url;

use crate::error::AuthError;

/// User-facing texts of the built-in pages.
#[derive(Debug, Clone)]
pub struct Messages {
    pub openid_required: String,
    pub xri_disabled: String,
    pub invalid_openid: String,
    pub cancelled: String,
    pub setup_needed: String,
    pub failure_prefix: String,
    pub need_authenticated_user: String,
    pub not_found: String,
}

impl Default for Messages {
    fn default() -> Self {
        Self {
            openid_required: "Enter an OpenID".to_string(),
            xri_disabled: "i-names are not supported".to_string(),
            invalid_openid: "The OpenID was invalid".to_string(),
            cancelled: "The request was cancelled".to_string(),
            setup_needed: "Setup needed".to_string(),
            failure_prefix: "Failure: ".to_string(),
            need_authenticated_user:
                "You need to sign in with an existing user account to access this page."
                    .to_string(),
            not_found: "Not found".to_string(),
        }
    }
}

/// Configuration of one mounted OpenID endpoint.
#[derive(Debug, Clone)]
pub struct EndpointConfig {
    /// Path the endpoint is mounted under, e.g. `/openid`.
    pub mount_path: String,
    /// Public base URL used to build absolute trust roots and return URLs.
    pub base_url: Url,
    /// Realm sent to the provider. Defaults to the endpoint's absolute URL.
    pub trust_root: Option<String>,
    /// Return URL sent to the provider. Defaults to `<endpoint>/complete/`.
    pub on_complete_url: Option<String>,
    /// Logo shown on the login form. Defaults to `<endpoint>/logo/`.
    pub logo_path: Option<String>,
    pub xri_enabled: bool,
    /// Enables the `debug` sub-operation.
    pub debug: bool,
    pub sreg: SregRequest,
    /// Free-form `"<namespace>.<key>"` extension arguments.
    pub extension_args: BTreeMap<String, String>,
    pub redirect_after_login: String,
    pub redirect_after_logout: String,
    pub messages: Messages,
}

impl EndpointConfig {
    pub fn new(base_url: Url) -> Self {
        Self {
            mount_path: "/openid".to_string(),
            base_url,
            trust_root: None,
            on_complete_url: None,
            logo_path: None,
            xri_enabled: false,
            debug: false,
            sreg: SregRequest::default(),
            extension_args: BTreeMap::new(),
            redirect_after_login: "/".to_string(),
            redirect_after_logout: "/".to_string(),
            messages: Messages::default(),
        }
    }

    /// Load from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `OPENID_BASE_URL`: public base URL (default: `http://localhost:3000`)
    /// - `OPENID_MOUNT_PATH`: mount path (default: `/openid`)
    /// - `OPENID_TRUST_ROOT`: realm override (optional)
    /// - `OPENID_ON_COMPLETE_URL`: return URL override (optional)
    /// - `OPENID_LOGO_PATH`: login form logo override (optional)
    /// - `OPENID_XRI_ENABLED`: accept i-names (default: false)
    /// - `OPENID_DEBUG`: enable the debug page (default: false)
    /// - `OPENID_SREG_OPTIONAL`, `OPENID_SREG_REQUIRED`: comma-separated field lists
    /// - `OPENID_SREG_POLICY_URL`: policy URL (optional)
    /// - `OPENID_EXTENSION_ARGS`: `ns.key=value` pairs separated by `;`
    /// - `OPENID_REDIRECT_AFTER_LOGIN`, `OPENID_REDIRECT_AFTER_LOGOUT` (default: `/`)
    ///
    /// # Errors
    ///
    /// Returns `Config` when the base URL or an extension argument is malformed.
    pub fn from_env() -> Result<Self, AuthError> {
        let base_url: Url = std::env::var("OPENID_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:3000".to_string())
            .parse()
            .map_err(|e| AuthError::Config(format!("OPENID_BASE_URL: {e}")))?;

        let mut config = Self::new(base_url);

        if let Ok(mount_path) = std::env::var("OPENID_MOUNT_PATH") {
            config.mount_path = mount_path;
        }
        config.trust_root = std::env::var("OPENID_TRUST_ROOT").ok();
        config.on_complete_url = std::env::var("OPENID_ON_COMPLETE_URL").ok();
        config.logo_path = std::env::var("OPENID_LOGO_PATH").ok();
        config.xri_enabled = env_flag("OPENID_XRI_ENABLED", false);
        config.debug = env_flag("OPENID_DEBUG", false);
        config.sreg = SregRequest {
            optional: env_list("OPENID_SREG_OPTIONAL"),
            required: env_list("OPENID_SREG_REQUIRED"),
            policy_url: std::env::var("OPENID_SREG_POLICY_URL").ok(),
        };
        if let Ok(raw) = std::env::var("OPENID_EXTENSION_ARGS") {
            config.extension_args = parse_extension_args(&raw)?;
        }
        if let Ok(url) = std::env::var("OPENID_REDIRECT_AFTER_LOGIN") {
            config.redirect_after_login = url;
        }
        if let Ok(url) = std::env::var("OPENID_REDIRECT_AFTER_LOGOUT") {
            config.redirect_after_logout = url;
        }

        Ok(config)
    }

    /// Mount path without a trailing slash (`""` when mounted at the root).
    pub fn base_path(&self) -> &str {
        self.mount_path.trim_end_matches('/')
    }

    /// Absolute URL of a local path-and-query, resolved against `base_url`.
    pub fn absolute_url(&self, path_and_query: &str) -> Result<Url, AuthError> {
        self.base_url
            .join(path_and_query)
            .map_err(|e| AuthError::Config(format!("cannot build absolute URL: {e}")))
    }
}

/// Settings of the signed identity cookie.
#[derive(Debug, Clone)]
pub struct CookieConfig {
    pub name: String,
    pub max_age: Option<Duration>,
    pub expires: Option<time::OffsetDateTime>,
    pub path: String,
    pub domain: Option<String>,
    pub secure: Option<bool>,
    pub http_only: bool,
    /// Cookie-specific secret. Falls back to the application secret.
    pub secret_key: Option<String>,
    pub scheme: SignatureScheme,
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            name: "openid".to_string(),
            max_age: None,
            expires: None,
            path: "/".to_string(),
            domain: None,
            secure: None,
            http_only: true,
            secret_key: None,
            scheme: SignatureScheme::default(),
        }
    }
}

impl CookieConfig {
    /// Load from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `OPENID_COOKIE_NAME` (default: `openid`)
    /// - `OPENID_COOKIE_MAX_AGE_SECS` (optional)
    /// - `OPENID_COOKIE_PATH` (default: `/`)
    /// - `OPENID_COOKIE_DOMAIN` (optional)
    /// - `OPENID_COOKIE_SECURE` (optional)
    /// - `OPENID_COOKIE_SECRET` (optional, falls back to `SECRET_KEY`)
    /// - `OPENID_COOKIE_SCHEME`: `legacy-sha1` or `hmac-sha256` (default: `legacy-sha1`)
    pub fn from_env() -> Result<Self, AuthError> {
        let defaults = Self::default();
        let scheme = match std::env::var("OPENID_COOKIE_SCHEME") {
            Ok(raw) => raw.parse().map_err(AuthError::Config)?,
            Err(_) => defaults.scheme,
        };

        Ok(Self {
            name: std::env::var("OPENID_COOKIE_NAME").unwrap_or(defaults.name),
            max_age: match std::env::var("OPENID_COOKIE_MAX_AGE_SECS") {
                Ok(raw) => Some(parse_max_age(&raw)?),
                Err(_) => None,
            },
            expires: None,
            path: std::env::var("OPENID_COOKIE_PATH").unwrap_or(defaults.path),
            domain: std::env::var("OPENID_COOKIE_DOMAIN").ok(),
            secure: std::env::var("OPENID_COOKIE_SECURE")
                .ok()
                .map(|v| v == "true" || v == "1"),
            http_only: defaults.http_only,
            secret_key: std::env::var("OPENID_COOKIE_SECRET").ok(),
            scheme,
        })
    }
}

/// Settings of the server-side session binding.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub cookie_name: String,
    pub cookie_secure: bool,
    pub ttl: Duration,
    /// Query parameter selecting a single identity on logout.
    pub logout_selector: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: "sessionid".to_string(),
            cookie_secure: true,
            ttl: Duration::from_secs(14 * 24 * 60 * 60),
            logout_selector: "openids".to_string(),
        }
    }
}

impl SessionConfig {
    /// Load from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `SESSION_COOKIE_NAME` (default: `sessionid`)
    /// - `SESSION_TTL_DAYS` (default: 14)
    /// - `COOKIE_SECURE`: whether to set the secure flag (default: true)
    pub fn from_env() -> Result<Self, AuthError> {
        let defaults = Self::default();
        let ttl = match std::env::var("SESSION_TTL_DAYS") {
            Ok(raw) => raw
                .trim()
                .parse::<u64>()
                .ok()
                .and_then(|days| days.checked_mul(24 * 60 * 60))
                .map(Duration::from_secs)
                .ok_or_else(|| AuthError::Config(format!("invalid SESSION_TTL_DAYS '{raw}'")))?,
            Err(_) => defaults.ttl,
        };

        let config = Self {
            cookie_name: std::env::var("SESSION_COOKIE_NAME").unwrap_or(defaults.cookie_name),
            cookie_secure: env_flag("COOKIE_SECURE", defaults.cookie_secure),
            ttl,
            logout_selector: defaults.logout_selector,
        };
        let expiry = calculate_expiry(chrono::Utc::now(), config.ttl_delta()?);
        if expiry.is_none() {
            return Err(AuthError::Config(format!(
                "SESSION_TTL_DAYS of {}s is out of range",
                ttl.as_secs()
            )));
        }
        Ok(config)
    }

    /// Session lifetime as a calendar duration.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the TTL does not fit a `TimeDelta`.
    pub fn ttl_delta(&self) -> Result<TimeDelta, AuthError> {
        i64::try_from(self.ttl.as_secs())
            .ok()
            .and_then(TimeDelta::try_seconds)
            .ok_or_else(|| {
                AuthError::Config(format!("session TTL of {}s is out of range", self.ttl.as_secs()))
            })
    }
}

fn parse_max_age(raw: &str) -> Result<Duration, AuthError> {
    raw.trim()
        .parse::<u64>()
        .ok()
        .filter(|secs| i64::try_from(*secs).is_ok())
        .map(Duration::from_secs)
        .ok_or_else(|| AuthError::Config(format!("invalid OPENID_COOKIE_MAX_AGE_SECS '{raw}'")))
}

fn env_flag(name: &str, default: bool) -> bool {
    std::env::var(name)
        .map(|v| v == "true" || v == "1")
        .unwrap_or(default)
}

fn env_list(name: &str) -> Vec<String> {
    std::env::var(name)
        .map(|v| split_list(&v))
        .unwrap_or_default()
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Parse `ns.key=value;ns.other=value` into a map.
fn parse_extension_args(raw: &str) -> Result<BTreeMap<String, String>, AuthError> {
    raw.split(';')
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (name, value) = pair
                .split_once('=')
                .ok_or_else(|| AuthError::Config(format!("extension argument '{pair}' has no '='")))?;
            if !name.contains('.') {
                return Err(AuthError::Config(format!(
                    "extension argument '{name}' must be '<namespace>.<key>'"
                )));
            }
            Ok((name.trim().to_string(), value.trim().to_string()))
        })
        .collect()
}
