//! Mock OpenID consumer and provider for development and testing.
//!
//! [`MockConsumer`] performs "discovery" by normalizing the claimed
//! identifier into an http(s) URL and points the browser at the mock
//! provider pages served by [`mock_provider_routes`]. No network I/O and no
//! signatures are involved.

mod consumer;
mod provider;
mod templates;

pub use consumer::{assertion_url, normalize_identifier, MockConsumer};
pub use provider::{mock_provider_routes, MOCK_PROVIDER_PATH};
