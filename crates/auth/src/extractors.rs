//! Axum extractors for the identities attached by [`identity_context`].
//!
//! [`identity_context`]: crate::middleware::identity_context

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
};
use relyingparty_core::IdentityRecord;

use crate::binding::RequestIdentities;
use crate::error::AuthError;

/// All identities on the request. Never rejects once the middleware is installed.
#[derive(Debug, Clone, Default)]
pub struct OpenIds {
    pub primary: Option<IdentityRecord>,
    pub all: Vec<IdentityRecord>,
}

impl<S> FromRequestParts<S> for OpenIds
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let identities = parts.extensions.get::<RequestIdentities>().ok_or((
            StatusCode::INTERNAL_SERVER_ERROR,
            "Identity middleware not installed",
        ))?;

        Ok(OpenIds {
            primary: identities.primary.clone(),
            all: identities.all.clone(),
        })
    }
}

/// Extractor for the primary identity. Returns 401 if nobody is signed in.
pub struct CurrentOpenId(pub IdentityRecord);

impl<S> FromRequestParts<S> for CurrentOpenId
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<RequestIdentities>()
            .and_then(|identities| identities.primary.clone())
            .map(CurrentOpenId)
            .ok_or(AuthError::Core(relyingparty_core::AuthError::NotAuthenticated))
    }
}
