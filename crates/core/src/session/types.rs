use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::accounts::AccountId;
use crate::identity::SessionIdentitySet;

/// Provenance recorded on principals logged in through OpenID.
pub const OPENID_PROVENANCE: &str = "relyingparty_auth::openid";

/// Cryptographically random session identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: String) -> Self {
        Self(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The local account a session is logged in as, and which module did it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub account: AccountId,
    pub provenance: String,
}

impl Principal {
    /// A principal authenticated by the OpenID endpoints.
    pub fn openid(account: AccountId) -> Self {
        Self {
            account,
            provenance: OPENID_PROVENANCE.to_string(),
        }
    }

    pub fn is_openid(&self) -> bool {
        self.provenance == OPENID_PROVENANCE
    }
}

/// Server-side state of one browser session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionData {
    #[serde(default)]
    pub identities: SessionIdentitySet,
    #[serde(default)]
    pub principal: Option<Principal>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl SessionData {
    pub fn new(created_at: DateTime<Utc>, expires_at: DateTime<Utc>) -> Self {
        Self {
            identities: SessionIdentitySet::new(),
            principal: None,
            created_at,
            expires_at,
        }
    }
}
