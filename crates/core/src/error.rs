use thiserror::Error;

/// Result type for relying-party operations.
pub type Result<T> = std::result::Result<T, AuthError>;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("no OpenID was entered")]
    MissingIdentifier,

    #[error("the OpenID could not be discovered: {0}")]
    InvalidIdentifier(String),

    #[error("unsupported identifier scheme: {0}")]
    UnsupportedIdentifierScheme(String),

    #[error("identity provider reported failure: {0}")]
    ProtocolStatusFailure(String),

    #[error("the request was cancelled")]
    ProtocolCancelled,

    #[error("identity provider needs setup")]
    SetupNeeded,

    #[error("authenticated user required")]
    NotAuthenticated,

    #[error("not found: {0}")]
    NotFound(String),

    #[error("unmapped OpenID response status: {0}")]
    UnmappedStatus(String),

    #[error("successful OpenID response carried no identity URL")]
    MissingIdentityUrl,

    #[error("extension argument key must be '<namespace>.<key>': {0}")]
    InvalidExtensionKey(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("consumer error: {0}")]
    Consumer(String),
}

impl AuthError {
    /// Whether the error is caused by user input or provider behaviour rather
    /// than a defect on our side.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Self::MissingIdentifier
                | Self::InvalidIdentifier(_)
                | Self::UnsupportedIdentifierScheme(_)
                | Self::ProtocolStatusFailure(_)
                | Self::ProtocolCancelled
                | Self::SetupNeeded
                | Self::NotAuthenticated
                | Self::NotFound(_)
        )
    }
}
