use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use relyingparty_core::codec::CodecError;
use thiserror::Error;

use crate::config::Messages;
use crate::templates::{ErrorTemplate, HtmlTemplate};

/// Errors raised by the relyingparty_auth crate.
///
/// This wraps the core `AuthError` and `CodecError` and adds variants for
/// the concerns that only exist at the HTTP edge.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Error from the core (protocol outcome, lookup, storage)
    #[error(transparent)]
    Core(#[from] relyingparty_core::AuthError),

    /// Error from the identity cookie codec
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Template rendering error
    #[error("template error: {0}")]
    Template(String),
}

impl From<askama::Error> for AuthError {
    fn from(err: askama::Error) -> Self {
        AuthError::Template(err.to_string())
    }
}

impl AuthError {
    /// Status code and user-facing message for this error.
    pub fn status_and_message(&self, messages: &Messages) -> (StatusCode, String) {
        use relyingparty_core::AuthError as CoreError;

        match self {
            AuthError::Core(core_err) => match core_err {
                CoreError::MissingIdentifier => {
                    (StatusCode::BAD_REQUEST, messages.openid_required.clone())
                }
                CoreError::UnsupportedIdentifierScheme(_) => {
                    (StatusCode::BAD_REQUEST, messages.xri_disabled.clone())
                }
                CoreError::InvalidIdentifier(_) => {
                    (StatusCode::BAD_REQUEST, messages.invalid_openid.clone())
                }
                CoreError::ProtocolStatusFailure(message) => (
                    StatusCode::UNAUTHORIZED,
                    format!("{}{}", messages.failure_prefix, message),
                ),
                CoreError::ProtocolCancelled => (StatusCode::OK, messages.cancelled.clone()),
                CoreError::SetupNeeded => (StatusCode::OK, messages.setup_needed.clone()),
                CoreError::NotAuthenticated => (
                    StatusCode::UNAUTHORIZED,
                    messages.need_authenticated_user.clone(),
                ),
                CoreError::NotFound(_) => (StatusCode::NOT_FOUND, messages.not_found.clone()),
                CoreError::InvalidExtensionKey(_)
                | CoreError::UnmappedStatus(_)
                | CoreError::MissingIdentityUrl
                | CoreError::Storage(_)
                | CoreError::Consumer(_) => {
                    tracing::error!("OpenID error: {}", self);
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "Internal server error".to_string(),
                    )
                }
            },
            AuthError::Codec(codec_err) if codec_err.is_rejection() => {
                (StatusCode::BAD_REQUEST, "Invalid identity token".to_string())
            }
            AuthError::Codec(_) => {
                tracing::error!("Identity codec error: {}", self);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            AuthError::Config(_) => {
                tracing::error!("Config error: {}", self);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Server configuration error".to_string(),
                )
            }
            AuthError::Template(_) => {
                tracing::error!("Template error: {}", self);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        }
    }

    /// Render the error page with the given message set.
    pub fn into_page(self, messages: &Messages) -> Response {
        let (status, message) = self.status_and_message(messages);
        (status, HtmlTemplate(ErrorTemplate { message })).into_response()
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        self.into_page(&Messages::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relyingparty_core::AuthError as CoreError;

    fn status_of(err: AuthError) -> (StatusCode, String) {
        err.status_and_message(&Messages::default())
    }

    #[test]
    fn protocol_outcomes_map_to_documented_statuses() {
        assert_eq!(
            status_of(CoreError::InvalidIdentifier("x".into()).into()),
            (StatusCode::BAD_REQUEST, "The OpenID was invalid".to_string())
        );
        assert_eq!(
            status_of(CoreError::ProtocolCancelled.into()),
            (StatusCode::OK, "The request was cancelled".to_string())
        );
        assert_eq!(
            status_of(CoreError::SetupNeeded.into()),
            (StatusCode::OK, "Setup needed".to_string())
        );
        assert_eq!(
            status_of(CoreError::ProtocolStatusFailure("bad signature".into()).into()),
            (StatusCode::UNAUTHORIZED, "Failure: bad signature".to_string())
        );
        assert_eq!(
            status_of(CoreError::NotAuthenticated.into()).0,
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_of(CoreError::NotFound("logout".into()).into()).0,
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn internal_errors_hide_details() {
        let (status, message) = status_of(CoreError::Storage("disk on fire".into()).into());
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!message.contains("disk"));

        let (status, _) = status_of(CoreError::UnmappedStatus("weird".into()).into());
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

        let (status, _) = status_of(AuthError::Config("missing".into()));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn custom_messages_are_used() {
        let messages = Messages {
            cancelled: "Abgebrochen".to_string(),
            ..Messages::default()
        };
        let (_, message) =
            AuthError::from(CoreError::ProtocolCancelled).status_and_message(&messages);
        assert_eq!(message, "Abgebrochen");
    }
}
