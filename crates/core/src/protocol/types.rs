use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AuthError, Result};
use crate::identity::{IdentityRecord, IdentityUrl, SregFields};

/// The four canonical statuses of a completed OpenID exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsumerStatus {
    Success,
    Cancel,
    Failure,
    SetupNeeded,
}

impl std::fmt::Display for ConsumerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Cancel => write!(f, "cancel"),
            Self::Failure => write!(f, "failure"),
            Self::SetupNeeded => write!(f, "setup_needed"),
        }
    }
}

impl FromStr for ConsumerStatus {
    type Err = AuthError;

    /// Parse a status as reported by an OpenID library. Anything outside the
    /// four canonical statuses is an internal error.
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "success" => Ok(Self::Success),
            "cancel" => Ok(Self::Cancel),
            "failure" => Ok(Self::Failure),
            "setup_needed" => Ok(Self::SetupNeeded),
            other => Err(AuthError::UnmappedStatus(other.to_string())),
        }
    }
}

/// Verification result handed back by the consumer collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsumerResponse {
    pub status: ConsumerStatus,
    pub identity_url: Option<IdentityUrl>,
    pub message: Option<String>,
    /// Simple-registration fields signed by the provider.
    pub sreg: SregFields,
}

impl ConsumerResponse {
    pub fn success(identity_url: IdentityUrl, sreg: SregFields) -> Self {
        Self {
            status: ConsumerStatus::Success,
            identity_url: Some(identity_url),
            message: None,
            sreg,
        }
    }

    pub fn cancel() -> Self {
        Self::bare(ConsumerStatus::Cancel, None)
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self::bare(ConsumerStatus::Failure, Some(message.into()))
    }

    pub fn setup_needed() -> Self {
        Self::bare(ConsumerStatus::SetupNeeded, None)
    }

    fn bare(status: ConsumerStatus, message: Option<String>) -> Self {
        Self {
            status,
            identity_url: None,
            message,
            sreg: SregFields::new(),
        }
    }
}

/// Outcome of `complete_login`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolResult {
    Success {
        identity_url: IdentityUrl,
        response: ConsumerResponse,
    },
    Cancelled,
    Failed {
        message: String,
    },
    SetupNeeded,
}

impl ProtocolResult {
    /// Map a collaborator response onto the sealed result.
    ///
    /// # Errors
    ///
    /// Returns `MissingIdentityUrl` for a success that carries no identity.
    pub fn from_response(response: ConsumerResponse) -> Result<Self> {
        match response.status {
            ConsumerStatus::Success => {
                let identity_url = response
                    .identity_url
                    .clone()
                    .ok_or(AuthError::MissingIdentityUrl)?;
                Ok(Self::Success {
                    identity_url,
                    response,
                })
            }
            ConsumerStatus::Cancel => Ok(Self::Cancelled),
            ConsumerStatus::Failure => Ok(Self::Failed {
                message: response.message.unwrap_or_default(),
            }),
            ConsumerStatus::SetupNeeded => Ok(Self::SetupNeeded),
        }
    }

    /// Turn a success into a fresh identity record, anything else into the
    /// matching user-facing error.
    pub fn into_identity(self, issued_at: DateTime<Utc>) -> Result<IdentityRecord> {
        match self {
            Self::Success {
                identity_url,
                response,
            } => Ok(IdentityRecord::new(identity_url, response.sreg, issued_at)),
            Self::Cancelled => Err(AuthError::ProtocolCancelled),
            Self::Failed { message } => Err(AuthError::ProtocolStatusFailure(message)),
            Self::SetupNeeded => Err(AuthError::SetupNeeded),
        }
    }
}

/// Sub-operations of a mounted endpoint, selected by the first path segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Login,
    Complete,
    Logout,
    Logo,
    Debug,
    Associate,
}

impl Operation {
    pub const ALL: [Operation; 6] = [
        Self::Login,
        Self::Complete,
        Self::Logout,
        Self::Logo,
        Self::Debug,
        Self::Associate,
    ];

    /// Map a path segment to an operation. The empty segment is `Login`.
    pub fn from_segment(segment: &str) -> Option<Self> {
        match segment {
            "" => Some(Self::Login),
            "complete" => Some(Self::Complete),
            "logout" => Some(Self::Logout),
            "logo" => Some(Self::Logo),
            "debug" => Some(Self::Debug),
            "associate" => Some(Self::Associate),
            _ => None,
        }
    }

    pub fn segment(self) -> &'static str {
        match self {
            Self::Login => "",
            Self::Complete => "complete",
            Self::Logout => "logout",
            Self::Logo => "logo",
            Self::Debug => "debug",
            Self::Associate => "associate",
        }
    }
}

/// A namespace-qualified extension argument, e.g. `sreg` / `optional` / `nickname,email`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionArg {
    pub namespace: String,
    pub key: String,
    pub value: String,
}

/// Simple-registration fields to ask the provider for.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SregRequest {
    pub optional: Vec<String>,
    pub required: Vec<String>,
    pub policy_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parses_canonical_strings_only() {
        assert_eq!("success".parse::<ConsumerStatus>().unwrap(), ConsumerStatus::Success);
        assert_eq!(
            "setup_needed".parse::<ConsumerStatus>().unwrap(),
            ConsumerStatus::SetupNeeded
        );
        assert!(matches!(
            "pending".parse::<ConsumerStatus>(),
            Err(AuthError::UnmappedStatus(s)) if s == "pending"
        ));
    }

    #[test]
    fn from_response_maps_every_status() {
        let success = ConsumerResponse::success("https://a.example/".into(), SregFields::new());
        assert!(matches!(
            ProtocolResult::from_response(success).unwrap(),
            ProtocolResult::Success { identity_url, .. } if identity_url.as_str() == "https://a.example/"
        ));
        assert_eq!(
            ProtocolResult::from_response(ConsumerResponse::cancel()).unwrap(),
            ProtocolResult::Cancelled
        );
        assert_eq!(
            ProtocolResult::from_response(ConsumerResponse::failure("bad sig")).unwrap(),
            ProtocolResult::Failed {
                message: "bad sig".to_string()
            }
        );
        assert_eq!(
            ProtocolResult::from_response(ConsumerResponse::setup_needed()).unwrap(),
            ProtocolResult::SetupNeeded
        );
    }

    #[test]
    fn success_without_identity_is_internal_error() {
        let mut response = ConsumerResponse::cancel();
        response.status = ConsumerStatus::Success;
        assert!(matches!(
            ProtocolResult::from_response(response),
            Err(AuthError::MissingIdentityUrl)
        ));
    }

    #[test]
    fn into_identity_carries_sreg() {
        let mut sreg = SregFields::new();
        sreg.insert("email".to_string(), "a@example.com".to_string());
        let result = ProtocolResult::from_response(ConsumerResponse::success(
            "https://a.example/".into(),
            sreg,
        ))
        .unwrap();

        let now = Utc::now();
        let record = result.into_identity(now).unwrap();
        assert_eq!(record.sreg_field("email"), Some("a@example.com"));
        assert_eq!(record.issued_at, now);
    }

    #[test]
    fn into_identity_maps_non_success_to_errors() {
        let now = Utc::now();
        assert!(matches!(
            ProtocolResult::Cancelled.into_identity(now),
            Err(AuthError::ProtocolCancelled)
        ));
        assert!(matches!(
            ProtocolResult::SetupNeeded.into_identity(now),
            Err(AuthError::SetupNeeded)
        ));
        assert!(matches!(
            ProtocolResult::Failed { message: "nope".into() }.into_identity(now),
            Err(AuthError::ProtocolStatusFailure(m)) if m == "nope"
        ));
    }

    #[test]
    fn operation_segments_round_trip() {
        for op in Operation::ALL {
            assert_eq!(Operation::from_segment(op.segment()), Some(op));
        }
        assert_eq!(Operation::from_segment("admin"), None);
        assert_eq!(Operation::from_segment("Complete"), None);
    }
}
