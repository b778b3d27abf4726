use thiserror::Error;

/// Errors raised while encoding or decoding a signed token.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// The token does not contain exactly one `:` separator.
    #[error("malformed token: expected exactly one ':' separator")]
    MalformedToken,

    /// The signature does not match the payload.
    #[error("token signature does not match")]
    SignatureError,

    /// The payload carried a valid signature but could not be decoded.
    #[error("corrupt token payload: {0}")]
    CorruptPayload(String),

    /// The record could not be serialized.
    #[error("failed to serialize token payload: {0}")]
    Serialize(String),

    #[error("invalid signing key: {0}")]
    InvalidKey(String),
}

impl CodecError {
    /// Errors that mean "this cookie is not ours": the client should be
    /// treated as logged out and the cookie cleared.
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::MalformedToken | Self::SignatureError)
    }
}

/// Result type for codec operations.
pub type Result<T> = std::result::Result<T, CodecError>;
