//! Tamper-evident cookie tokens.
//!
//! A token is `base64url(zlib(json(IdentityRecord))) ":" hex(signature)`, the
//! signature being computed over the base64 text. Only [`IdentityRecord`]s
//! are encodable so the wire format stays fixed.
//!
//! [`IdentityRecord`]: crate::identity::IdentityRecord

mod error;
mod key;
mod token;

pub use error::{CodecError, Result};
pub use key::{SignatureScheme, SigningKey};
pub use token::TokenCodec;
