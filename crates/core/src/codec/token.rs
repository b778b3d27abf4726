use std::io::{Read, Write};

use base64::{engine::general_purpose::URL_SAFE, Engine};
use flate2::{read::ZlibDecoder, write::ZlibEncoder, Compression};

use super::{CodecError, Result, SignatureScheme, SigningKey};
use crate::identity::IdentityRecord;

const SEPARATOR: char = ':';

/// Encodes identity records into signed, URL-safe tokens and back.
#[derive(Debug, Clone)]
pub struct TokenCodec {
    key: SigningKey,
    scheme: SignatureScheme,
}

impl TokenCodec {
    pub fn new(key: SigningKey, scheme: SignatureScheme) -> Self {
        Self { key, scheme }
    }

    pub fn scheme(&self) -> SignatureScheme {
        self.scheme
    }

    /// Serialize, compress, base64url-encode and sign `record`.
    ///
    /// Deterministic for a given key, scheme and record.
    pub fn encode(&self, record: &IdentityRecord) -> Result<String> {
        let json =
            serde_json::to_vec(record).map_err(|e| CodecError::Serialize(e.to_string()))?;

        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder
            .write_all(&json)
            .map_err(|e| CodecError::Serialize(e.to_string()))?;
        let compressed = encoder
            .finish()
            .map_err(|e| CodecError::Serialize(e.to_string()))?;

        let payload = URL_SAFE.encode(compressed);
        let signature = self.scheme.sign(&self.key, payload.as_bytes())?;

        Ok(format!("{payload}{SEPARATOR}{signature}"))
    }

    /// Verify and decode a token produced by [`TokenCodec::encode`].
    ///
    /// # Errors
    ///
    /// - `MalformedToken` when the token does not have exactly one `:`; no
    ///   signature work is done in that case.
    /// - `SignatureError` when the signature does not match.
    /// - `CorruptPayload` when a correctly signed payload cannot be decoded.
    pub fn decode(&self, token: &str) -> Result<IdentityRecord> {
        if token.matches(SEPARATOR).count() != 1 {
            return Err(CodecError::MalformedToken);
        }
        let (payload, signature) = token
            .split_once(SEPARATOR)
            .ok_or(CodecError::MalformedToken)?;

        if !self.scheme.verify(&self.key, payload.as_bytes(), signature)? {
            return Err(CodecError::SignatureError);
        }

        let compressed = URL_SAFE
            .decode(payload)
            .map_err(|e| CodecError::CorruptPayload(e.to_string()))?;

        let mut json = Vec::new();
        ZlibDecoder::new(compressed.as_slice())
            .read_to_end(&mut json)
            .map_err(|e| CodecError::CorruptPayload(e.to_string()))?;

        serde_json::from_slice(&json).map_err(|e| CodecError::CorruptPayload(e.to_string()))
    }
}
