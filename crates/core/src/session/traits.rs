use async_trait::async_trait;

use super::{SessionData, SessionId};
use crate::error::Result;

/// Server-side session storage.
///
/// Each request does at most one read-modify-write; concurrent requests on
/// the same session are serialized (or not) by the implementation.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Retrieve session data by ID.
    async fn load(&self, id: &SessionId) -> Result<Option<SessionData>>;

    /// Create or overwrite session data.
    async fn save(&self, id: &SessionId, data: &SessionData) -> Result<()>;

    /// Delete a session.
    async fn delete(&self, id: &SessionId) -> Result<()>;
}
