use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Simple-registration fields returned by the provider (`nickname`, `email`, ...).
pub type SregFields = BTreeMap<String, String>;

/// Canonical identity URL asserted by an identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdentityUrl(String);

impl IdentityUrl {
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for IdentityUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for IdentityUrl {
    fn from(url: &str) -> Self {
        Self::new(url)
    }
}

/// A verified identity.
///
/// Only built from a successful provider response and never mutated
/// afterwards. Two records denote the same identity when their
/// `identity_url`s are equal, whatever their sreg data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityRecord {
    pub identity_url: IdentityUrl,
    #[serde(default)]
    pub sreg: SregFields,
    pub issued_at: DateTime<Utc>,
}

impl IdentityRecord {
    pub fn new(identity_url: IdentityUrl, sreg: SregFields, issued_at: DateTime<Utc>) -> Self {
        Self {
            identity_url,
            sreg,
            issued_at,
        }
    }

    /// Whether `other` refers to the same identity URL.
    pub fn same_identity(&self, other: &IdentityUrl) -> bool {
        &self.identity_url == other
    }

    /// Convenience accessor for a simple-registration field.
    pub fn sreg_field(&self, name: &str) -> Option<&str> {
        self.sreg.get(name).map(String::as_str)
    }
}
