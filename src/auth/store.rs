//! Persistence for interactive sessions, keyed by the OAuth `state`.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::token::Token;
use crate::Result;

/// Storage for tokens obtained through the authorization-code flow.
///
/// The authenticator treats a failing `get` as a miss and a failing `put`
/// as non-fatal, so implementations backed by external storage may fail
/// without breaking request execution.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Load the token stored for `session_id`.
    async fn get(&self, session_id: &str) -> Result<Option<Token>>;

    /// Store or replace the token for `session_id`.
    async fn put(&self, session_id: &str, token: &Token) -> Result<()>;

    /// Forget `session_id`.
    async fn delete(&self, session_id: &str) -> Result<()>;
}

/// Process-local [`SessionStore`].
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<String, Token>>,
}

impl InMemorySessionStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored sessions.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Returns `true` if nothing is stored.
    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, session_id: &str) -> Result<Option<Token>> {
        Ok(self.sessions.read().await.get(session_id).cloned())
    }

    async fn put(&self, session_id: &str, token: &Token) -> Result<()> {
        self.sessions
            .write()
            .await
            .insert(session_id.to_string(), token.clone());
        Ok(())
    }

    async fn delete(&self, session_id: &str) -> Result<()> {
        self.sessions.write().await.remove(session_id);
        Ok(())
    }
}
