use std::{env, str::FromStr};

use anyhow::Context;
use rand::{distr::Alphanumeric, Rng};
use relyingparty_auth::{CookieConfig, EndpointConfig, SessionConfig};

/// Where verified identities are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingKind {
    Session,
    Cookie,
}

impl FromStr for BindingKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "session" => Ok(Self::Session),
            "cookie" => Ok(Self::Cookie),
            other => Err(format!("unknown binding '{other}', expected 'session' or 'cookie'")),
        }
    }
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub endpoint: EndpointConfig,
    pub cookie: CookieConfig,
    pub session: SessionConfig,
    /// Application-wide secret used to sign identity cookies.
    pub secret_key: String,
    pub binding: BindingKind,
    /// Reconcile logins with the account store (session binding only).
    pub account_linking: bool,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Environment variables (besides the `OPENID_*`, `OPENID_COOKIE_*` and
    /// `SESSION_*` ones read by the auth crate):
    /// - `SECRET_KEY` - Application secret (default: random per process)
    /// - `OPENID_BINDING` - `session` or `cookie` (default: `session`)
    /// - `OPENID_ACCOUNT_LINKING` - Enable account linking (default: true)
    pub fn from_env() -> anyhow::Result<Self> {
        let secret_key = match env::var("SECRET_KEY") {
            Ok(secret) if !secret.is_empty() => secret,
            _ => {
                tracing::warn!("SECRET_KEY is not set, identity cookies will not survive a restart");
                random_secret()
            }
        };

        let binding = match env::var("OPENID_BINDING") {
            Ok(raw) => raw.parse().map_err(anyhow::Error::msg)?,
            Err(_) => BindingKind::Session,
        };

        Ok(Self {
            endpoint: EndpointConfig::from_env().context("loading endpoint configuration")?,
            cookie: CookieConfig::from_env().context("loading cookie configuration")?,
            session: SessionConfig::from_env().context("loading session configuration")?,
            secret_key,
            binding,
            account_linking: env::var("OPENID_ACCOUNT_LINKING")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(true),
        })
    }
}

fn random_secret() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(48)
        .map(char::from)
        .collect()
}
