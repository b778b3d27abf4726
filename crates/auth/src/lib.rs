//! OpenID relying-party endpoints for axum.
//!
//! This crate provides:
//! - A mountable [`Endpoint`] serving login, completion, logout, logo and debug pages
//! - Identity bindings: server-side sessions or a signed cookie
//! - Middleware and extractors exposing the identities of the current request
//! - Optional account linking on top of the session binding
//! - A mock consumer and provider for development (`mock` feature)

mod binding;
mod config;
mod endpoint;
mod error;
mod extractors;
mod integration;
mod middleware;
mod sessions;
mod templates;

pub use binding::{CookieBinding, IdentityBinding, RequestIdentities, SessionBinding};
pub use config::{CookieConfig, EndpointConfig, Messages, SessionConfig};
pub use endpoint::{
    Endpoint, EndpointBuilder, LoginContext, LoginOutcome, RedirectAfterLogin, ShowIdentity,
};
pub use error::AuthError;
pub use extractors::{CurrentOpenId, OpenIds};
pub use integration::AccountLinking;
pub use middleware::identity_context;
pub use sessions::SessionStore;

#[cfg(any(test, feature = "mock"))]
pub mod mock;
