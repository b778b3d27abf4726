//! In-memory session storage for development and testing.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use relyingparty_core::session::{SessionData, SessionId, SessionRepository};
use relyingparty_core::Result;

/// In-memory session store for development and testing.
///
/// Stores sessions in a HashMap wrapped in `Arc<RwLock<_>>`.
/// Data is not persisted and will be lost when the store is dropped.
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<String, SessionData>>>,
}

impl SessionStore {
    /// Creates a new empty in-memory session store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored sessions, expired ones included.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[async_trait]
impl SessionRepository for SessionStore {
    async fn load(&self, id: &SessionId) -> Result<Option<SessionData>> {
        let sessions = self.sessions.read().await;
        Ok(sessions.get(id.as_str()).cloned())
    }

    async fn save(&self, id: &SessionId, data: &SessionData) -> Result<()> {
        let mut sessions = self.sessions.write().await;
        sessions.insert(id.as_str().to_string(), data.clone());
        Ok(())
    }

    async fn delete(&self, id: &SessionId) -> Result<()> {
        let mut sessions = self.sessions.write().await;
        sessions.remove(id.as_str());
        Ok(())
    }
}
