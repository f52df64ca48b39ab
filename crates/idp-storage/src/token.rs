//! Granted token store port.

use async_trait::async_trait;
use idp_model::{ClaimSet, GrantedToken};
use tokio::sync::RwLock;

use crate::error::StorageResult;

/// Provider for issued access tokens.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Finds the most recent token issued to `client_id` for exactly `scope`
    /// and the given claim sets. Expired tokens are returned too; callers
    /// decide whether to reuse them.
    async fn get_token(
        &self,
        scope: &str,
        client_id: &str,
        id_token_payload: Option<&ClaimSet>,
        userinfo_payload: Option<&ClaimSet>,
    ) -> StorageResult<Option<GrantedToken>>;

    /// Gets a token by its access token value.
    async fn get_access_token(&self, access_token: &str) -> StorageResult<Option<GrantedToken>>;

    /// Stores a token.
    async fn add(&self, token: &GrantedToken) -> StorageResult<()>;

    /// Removes a token by its access token value. Returns whether a token was
    /// removed.
    async fn remove(&self, access_token: &str) -> StorageResult<bool>;
}

/// In-memory token store.
#[derive(Debug, Default)]
pub struct InMemoryTokenStore {
    tokens: RwLock<Vec<GrantedToken>>,
}

impl InMemoryTokenStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored tokens.
    pub async fn len(&self) -> usize {
        self.tokens.read().await.len()
    }

    /// Whether the store holds no tokens.
    pub async fn is_empty(&self) -> bool {
        self.tokens.read().await.is_empty()
    }
}

#[async_trait]
impl TokenStore for InMemoryTokenStore {
    async fn get_token(
        &self,
        scope: &str,
        client_id: &str,
        id_token_payload: Option<&ClaimSet>,
        userinfo_payload: Option<&ClaimSet>,
    ) -> StorageResult<Option<GrantedToken>> {
        let tokens = self.tokens.read().await;
        Ok(tokens
            .iter()
            .rev()
            .find(|t| {
                t.scope == scope
                    && t.client_id == client_id
                    && t.id_token_payload.as_ref() == id_token_payload
                    && t.userinfo_payload.as_ref() == userinfo_payload
            })
            .cloned())
    }

    async fn get_access_token(&self, access_token: &str) -> StorageResult<Option<GrantedToken>> {
        let tokens = self.tokens.read().await;
        Ok(tokens.iter().find(|t| t.access_token == access_token).cloned())
    }

    async fn add(&self, token: &GrantedToken) -> StorageResult<()> {
        self.tokens.write().await.push(token.clone());
        Ok(())
    }

    async fn remove(&self, access_token: &str) -> StorageResult<bool> {
        let mut tokens = self.tokens.write().await;
        let before = tokens.len();
        tokens.retain(|t| t.access_token != access_token);
        Ok(tokens.len() != before)
    }
}
