//! Functional core for OpenID 1.1/2.0 relying-party endpoints.
//!
//! Everything in here is free of HTTP concerns:
//! - identity records and the multi-identity session set
//! - the signed cookie codec
//! - the begin/complete protocol flow over an [`OpenIdConsumer`] collaborator
//! - account reconciliation
//! - collaborator traits for sessions and accounts

pub mod accounts;
pub mod codec;
mod error;
pub mod identity;
pub mod protocol;
pub mod session;

pub use accounts::{dedupe_accounts, reconcile, AccountId, AccountStore, Reconciliation};
pub use error::{AuthError, Result};
pub use identity::{IdentityRecord, IdentityUrl, SessionIdentitySet, SregFields};
pub use protocol::{AuthRequest, ConsumerResponse, ConsumerStatus, OpenIdConsumer, ProtocolResult};
