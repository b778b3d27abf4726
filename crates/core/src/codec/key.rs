use std::fmt;
use std::str::FromStr;

use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};
use sha2::Sha256;

use super::{CodecError, Result};

/// Secret used to sign tokens. Redacted in `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct SigningKey(String);

impl SigningKey {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// Pick a strategy-specific secret if present, else the application-wide one.
    pub fn resolve(specific: Option<&str>, application: &str) -> Self {
        match specific {
            Some(secret) if !secret.is_empty() => Self::new(secret),
            _ => Self::new(application),
        }
    }

    fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SigningKey([REDACTED])")
    }
}

/// How the signature half of a token is computed.
///
/// `LegacySha1` is `hex(sha1(payload ++ secret))`, compatible with cookies
/// issued by existing deployments. It is not a real MAC; new deployments
/// should opt into `HmacSha256`. Tokens signed under one scheme never
/// verify under the other.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SignatureScheme {
    #[default]
    LegacySha1,
    HmacSha256,
}

impl SignatureScheme {
    /// Sign `payload` and return the lowercase hex signature.
    pub fn sign(self, key: &SigningKey, payload: &[u8]) -> Result<String> {
        match self {
            Self::LegacySha1 => {
                let mut hasher = Sha1::new();
                hasher.update(payload);
                hasher.update(key.as_bytes());
                Ok(hex::encode(hasher.finalize()))
            }
            Self::HmacSha256 => {
                let mut mac = Hmac::<Sha256>::new_from_slice(key.as_bytes())
                    .map_err(|e| CodecError::InvalidKey(e.to_string()))?;
                mac.update(payload);
                Ok(hex::encode(mac.finalize().into_bytes()))
            }
        }
    }

    /// Check `signature` against `payload` without early exit on mismatch.
    pub fn verify(self, key: &SigningKey, payload: &[u8], signature: &str) -> Result<bool> {
        let expected = self.sign(key, payload)?;
        Ok(constant_time_eq(expected.as_bytes(), signature.as_bytes()))
    }
}

impl fmt::Display for SignatureScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LegacySha1 => write!(f, "legacy-sha1"),
            Self::HmacSha256 => write!(f, "hmac-sha256"),
        }
    }
}

impl FromStr for SignatureScheme {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "legacy-sha1" | "sha1" => Ok(Self::LegacySha1),
            "hmac-sha256" | "hmac" => Ok(Self::HmacSha256),
            other => Err(format!("unknown signature scheme '{other}'")),
        }
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
