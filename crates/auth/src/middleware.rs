//! Request/response hooks of the identity bindings.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::CookieJar;

use crate::binding::IdentityBinding;

/// Middleware attaching [`RequestIdentities`] to every request.
///
/// Install with `axum::middleware::from_fn_with_state(binding, identity_context)`.
/// Handlers read the identities through the [`OpenIds`] and
/// [`CurrentOpenId`] extractors.
///
/// [`RequestIdentities`]: crate::binding::RequestIdentities
/// [`OpenIds`]: crate::extractors::OpenIds
/// [`CurrentOpenId`]: crate::extractors::CurrentOpenId
pub async fn identity_context(
    State(binding): State<Arc<dyn IdentityBinding>>,
    mut request: Request,
    next: Next,
) -> Response {
    let jar = CookieJar::from_headers(request.headers());
    let identities = match binding.before_handle(&jar).await {
        Ok(identities) => identities,
        Err(e) => return e.into_response(),
    };

    request.extensions_mut().insert(identities.clone());
    let response = next.run(request).await;
    binding.after_handle(&identities, response)
}
