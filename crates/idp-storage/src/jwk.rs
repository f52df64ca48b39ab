//! JSON Web Key repository port.

use async_trait::async_trait;
use idp_model::{JsonWebKey, KeyAlgorithm, KeyOperation, KeyUse};
use tokio::sync::RwLock;

use crate::error::{StorageError, StorageResult};

/// Provider for the server's own keys.
#[async_trait]
pub trait JsonWebKeyRepository: Send + Sync {
    /// Gets a key by its ID.
    async fn get_by_kid(&self, kid: &str) -> StorageResult<Option<JsonWebKey>>;

    /// Gets the keys with the given use and algorithm that allow every
    /// operation in `ops`.
    async fn get_by_algorithm(
        &self,
        key_use: KeyUse,
        alg: KeyAlgorithm,
        ops: &[KeyOperation],
    ) -> StorageResult<Vec<JsonWebKey>>;

    /// Gets every key.
    async fn get_all(&self) -> StorageResult<Vec<JsonWebKey>>;
}

/// In-memory key repository.
///
/// Keys are returned in insertion order.
#[derive(Debug, Default)]
pub struct InMemoryJsonWebKeyRepository {
    keys: RwLock<Vec<JsonWebKey>>,
}

impl InMemoryJsonWebKeyRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a key.
    ///
    /// ## Errors
    ///
    /// Returns `StorageError::Duplicate` if the `kid` is taken; keys are
    /// immutable once issued.
    pub async fn insert(&self, key: JsonWebKey) -> StorageResult<()> {
        let mut keys = self.keys.write().await;
        if keys.iter().any(|k| k.kid == key.kid) {
            return Err(StorageError::duplicate("JsonWebKey", "kid", key.kid));
        }
        keys.push(key);
        Ok(())
    }
}

#[async_trait]
impl JsonWebKeyRepository for InMemoryJsonWebKeyRepository {
    async fn get_by_kid(&self, kid: &str) -> StorageResult<Option<JsonWebKey>> {
        let keys = self.keys.read().await;
        Ok(keys.iter().find(|k| k.kid == kid).cloned())
    }

    async fn get_by_algorithm(
        &self,
        key_use: KeyUse,
        alg: KeyAlgorithm,
        ops: &[KeyOperation],
    ) -> StorageResult<Vec<JsonWebKey>> {
        let keys = self.keys.read().await;
        Ok(keys
            .iter()
            .filter(|k| k.key_use == key_use && k.alg == alg)
            .filter(|k| ops.iter().all(|op| k.allows(*op)))
            .cloned()
            .collect())
    }

    async fn get_all(&self) -> StorageResult<Vec<JsonWebKey>> {
        Ok(self.keys.read().await.clone())
    }
}
