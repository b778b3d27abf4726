mod functions;
mod traits;
mod types;

pub use functions::{calculate_expiry, generate_session_id, is_session_expired};
pub use traits::SessionRepository;
pub use types::{Principal, SessionData, SessionId, OPENID_PROVENANCE};
