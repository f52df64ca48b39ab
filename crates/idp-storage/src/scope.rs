//! Scope repository port.

use std::collections::HashMap;

use async_trait::async_trait;
use idp_model::Scope;
use tokio::sync::RwLock;

use crate::error::{StorageError, StorageResult};

/// Provider for scope lookups.
#[async_trait]
pub trait ScopeRepository: Send + Sync {
    /// Gets the scopes with the given names. Unknown names are skipped.
    async fn search_by_names(&self, names: &[String]) -> StorageResult<Vec<Scope>>;

    /// Gets every scope.
    async fn get_all(&self) -> StorageResult<Vec<Scope>>;
}

/// In-memory scope repository.
#[derive(Debug, Default)]
pub struct InMemoryScopeRepository {
    scopes: RwLock<HashMap<String, Scope>>,
}

impl InMemoryScopeRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a scope.
    ///
    /// ## Errors
    ///
    /// Returns `StorageError::Duplicate` if the name is taken.
    pub async fn insert(&self, scope: Scope) -> StorageResult<()> {
        let mut scopes = self.scopes.write().await;
        if scopes.contains_key(&scope.name) {
            return Err(StorageError::duplicate("Scope", "name", scope.name));
        }
        scopes.insert(scope.name.clone(), scope);
        Ok(())
    }
}

#[async_trait]
impl ScopeRepository for InMemoryScopeRepository {
    async fn search_by_names(&self, names: &[String]) -> StorageResult<Vec<Scope>> {
        let scopes = self.scopes.read().await;
        Ok(names.iter().filter_map(|n| scopes.get(n).cloned()).collect())
    }

    async fn get_all(&self) -> StorageResult<Vec<Scope>> {
        let scopes = self.scopes.read().await;
        Ok(scopes.values().cloned().collect())
    }
}
