//! Consent repository port.

use async_trait::async_trait;
use idp_model::Consent;
use tokio::sync::RwLock;

use crate::error::StorageResult;

/// Provider for confirmed consents.
#[async_trait]
pub trait ConsentRepository: Send + Sync {
    /// Gets the consents `subject` confirmed for `client_id`.
    async fn get_confirmed_consents(
        &self,
        subject: &str,
        client_id: &str,
    ) -> StorageResult<Vec<Consent>>;
}

/// In-memory consent repository.
#[derive(Debug, Default)]
pub struct InMemoryConsentRepository {
    consents: RwLock<Vec<Consent>>,
}

impl InMemoryConsentRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a confirmed consent.
    pub async fn insert(&self, consent: Consent) {
        self.consents.write().await.push(consent);
    }
}

#[async_trait]
impl ConsentRepository for InMemoryConsentRepository {
    async fn get_confirmed_consents(
        &self,
        subject: &str,
        client_id: &str,
    ) -> StorageResult<Vec<Consent>> {
        let consents = self.consents.read().await;
        Ok(consents
            .iter()
            .filter(|c| c.subject == subject && c.client_id == client_id)
            .cloned()
            .collect())
    }
}
