//! Client repository port.
//!
//! Persistent stores keep enumerated settings as text (grant and response
//! types as comma-joined strings, algorithms as JWA names). [`ClientRecord`]
//! is that persisted shape; conversion to and from [`Client`] happens here,
//! so the core only ever sees typed sets.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;
use std::str::FromStr;

use async_trait::async_trait;
use idp_crypto::{JweAlg, JweEnc, JwsAlg};
use idp_model::{Client, ClientSecret, GrantType, JsonWebKey, ResponseType};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::error::{StorageError, StorageResult};

/// Provider for client lookups.
///
/// Implementations must be thread-safe and support concurrent access.
#[async_trait]
pub trait ClientRepository: Send + Sync {
    /// Gets a client by `client_id` (OAuth client identifier).
    async fn get_by_client_id(&self, client_id: &str) -> StorageResult<Option<Client>>;

    /// Gets every registered client.
    async fn get_all(&self) -> StorageResult<Vec<Client>>;
}

/// Persisted form of a [`Client`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientRecord {
    /// OAuth `client_id`.
    pub client_id: String,
    /// Display name.
    pub client_name: Option<String>,
    /// Client credentials.
    pub secrets: Vec<ClientSecret>,
    /// Comma-joined grant type names.
    pub grant_types: String,
    /// Comma-joined response type names.
    pub response_types: String,
    /// Registered redirection URLs.
    pub redirection_urls: Vec<String>,
    /// JWKS location.
    pub jwks_uri: Option<String>,
    /// Allowed scope names.
    pub allowed_scopes: Vec<String>,
    /// PKCE requirement.
    pub require_pkce: bool,
    /// JWA name of the identity token signing algorithm.
    pub id_token_signed_response_alg: Option<String>,
    /// JWA name of the identity token key management algorithm.
    pub id_token_encrypted_response_alg: Option<String>,
    /// JWA name of the identity token content encryption.
    pub id_token_encrypted_response_enc: Option<String>,
    /// Inline JSON Web Keys.
    pub json_web_keys: Vec<JsonWebKey>,
    /// Token lifetime override, in seconds.
    pub token_lifetime_seconds: Option<i64>,
}

impl From<&Client> for ClientRecord {
    fn from(client: &Client) -> Self {
        Self {
            client_id: client.client_id.clone(),
            client_name: client.client_name.clone(),
            secrets: client.secrets.clone(),
            grant_types: join_set(&client.grant_types),
            response_types: join_set(&client.response_types),
            redirection_urls: client.redirection_urls.clone(),
            jwks_uri: client.jwks_uri.clone(),
            allowed_scopes: client.allowed_scopes.clone(),
            require_pkce: client.require_pkce,
            id_token_signed_response_alg: client
                .id_token_signed_response_alg
                .map(|a| a.jwa_name().to_string()),
            id_token_encrypted_response_alg: client
                .id_token_encrypted_response_alg
                .map(|a| a.jwa_name().to_string()),
            id_token_encrypted_response_enc: client
                .id_token_encrypted_response_enc
                .map(|e| e.jwa_name().to_string()),
            json_web_keys: client.json_web_keys.clone(),
            token_lifetime_seconds: client.token_lifetime_seconds,
        }
    }
}

impl TryFrom<ClientRecord> for Client {
    type Error = StorageError;

    fn try_from(record: ClientRecord) -> Result<Self, Self::Error> {
        let grant_types: HashSet<GrantType> = parse_set(&record.grant_types)?;
        let response_types: HashSet<ResponseType> = parse_set(&record.response_types)?;

        let id_token_signed_response_alg = record
            .id_token_signed_response_alg
            .as_deref()
            .map(JwsAlg::from_jwa)
            .transpose()
            .map_err(|e| StorageError::InvalidData(e.to_string()))?;
        let id_token_encrypted_response_alg = record
            .id_token_encrypted_response_alg
            .as_deref()
            .map(JweAlg::from_jwa)
            .transpose()
            .map_err(|e| StorageError::InvalidData(e.to_string()))?;
        let id_token_encrypted_response_enc = record
            .id_token_encrypted_response_enc
            .as_deref()
            .map(JweEnc::from_jwa)
            .transpose()
            .map_err(|e| StorageError::InvalidData(e.to_string()))?;

        Ok(Self {
            client_id: record.client_id,
            client_name: record.client_name,
            secrets: record.secrets,
            grant_types,
            response_types,
            redirection_urls: record.redirection_urls,
            jwks_uri: record.jwks_uri,
            allowed_scopes: record.allowed_scopes,
            require_pkce: record.require_pkce,
            id_token_signed_response_alg,
            id_token_encrypted_response_alg,
            id_token_encrypted_response_enc,
            json_web_keys: record.json_web_keys,
            token_lifetime_seconds: record.token_lifetime_seconds,
        })
    }
}

fn join_set<T: ToString>(set: &HashSet<T>) -> String {
    let mut names: Vec<String> = set.iter().map(ToString::to_string).collect();
    names.sort();
    names.join(",")
}

fn parse_set<T>(joined: &str) -> StorageResult<HashSet<T>>
where
    T: FromStr<Err = String> + Eq + Hash,
{
    joined
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse().map_err(StorageError::InvalidData))
        .collect()
}

/// In-memory client repository (for testing and single-instance deployments).
#[derive(Debug, Default)]
pub struct InMemoryClientRepository {
    records: RwLock<HashMap<String, ClientRecord>>,
}

impl InMemoryClientRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a client.
    ///
    /// ## Errors
    ///
    /// Returns `StorageError::Duplicate` if the `client_id` is taken.
    pub async fn insert(&self, client: &Client) -> StorageResult<()> {
        let mut records = self.records.write().await;
        if records.contains_key(&client.client_id) {
            return Err(StorageError::duplicate(
                "Client",
                "client_id",
                client.client_id.clone(),
            ));
        }
        records.insert(client.client_id.clone(), ClientRecord::from(client));
        Ok(())
    }
}

#[async_trait]
impl ClientRepository for InMemoryClientRepository {
    async fn get_by_client_id(&self, client_id: &str) -> StorageResult<Option<Client>> {
        let records = self.records.read().await;
        records
            .get(client_id)
            .cloned()
            .map(Client::try_from)
            .transpose()
    }

    async fn get_all(&self) -> StorageResult<Vec<Client>> {
        let records = self.records.read().await;
        records.values().cloned().map(Client::try_from).collect()
    }
}
