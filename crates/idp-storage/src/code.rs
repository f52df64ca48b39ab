//! Authorization code store port.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use idp_model::AuthorizationCode;
use tokio::sync::RwLock;

use crate::error::StorageResult;

/// Provider for storing and retrieving authorization codes.
///
/// Lookups take the raw code value; stores key codes by their hash.
#[async_trait]
pub trait AuthorizationCodeStore: Send + Sync {
    /// Stores an authorization code.
    async fn add(&self, code: &AuthorizationCode) -> StorageResult<()>;

    /// Retrieves an authorization code by its raw value.
    async fn get(&self, code: &str) -> StorageResult<Option<AuthorizationCode>>;

    /// Removes an authorization code. Returns whether a code was removed.
    async fn remove(&self, code: &str) -> StorageResult<bool>;
}

/// In-memory authorization code store (for testing and single-instance deployments).
#[derive(Debug, Default)]
pub struct InMemoryAuthorizationCodeStore {
    codes: RwLock<HashMap<String, AuthorizationCode>>,
}

impl InMemoryAuthorizationCodeStore {
    /// Creates a new in-memory authorization code store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes expired codes. Returns the number removed.
    pub async fn remove_expired(&self) -> u64 {
        let mut codes = self.codes.write().await;
        let now = Utc::now();
        let initial_len = codes.len();
        codes.retain(|_, code| code.expires_at > now);
        (initial_len - codes.len()) as u64
    }

    /// Number of stored codes.
    pub async fn len(&self) -> usize {
        self.codes.read().await.len()
    }

    /// Whether the store holds no codes.
    pub async fn is_empty(&self) -> bool {
        self.codes.read().await.is_empty()
    }
}

#[async_trait]
impl AuthorizationCodeStore for InMemoryAuthorizationCodeStore {
    async fn add(&self, code: &AuthorizationCode) -> StorageResult<()> {
        self.codes
            .write()
            .await
            .insert(code.code_hash.clone(), code.clone());
        Ok(())
    }

    async fn get(&self, code: &str) -> StorageResult<Option<AuthorizationCode>> {
        let hash = AuthorizationCode::hash_code(code);
        Ok(self.codes.read().await.get(&hash).cloned())
    }

    async fn remove(&self, code: &str) -> StorageResult<bool> {
        let hash = AuthorizationCode::hash_code(code);
        Ok(self.codes.write().await.remove(&hash).is_some())
    }
}
