//! Retrieval of client key sets published at a `jwks_uri`.

use async_trait::async_trait;
use idp_core::Config;
use idp_model::JsonWebKeySet;

/// Fetches a JSON Web Key Set.
///
/// A fetch that fails for any reason yields `None`; callers treat it as
/// "no key found".
#[async_trait]
pub trait JwksFetcher: Send + Sync {
    /// Fetches the key set published at `jwks_uri`.
    async fn fetch(&self, jwks_uri: &str) -> Option<JsonWebKeySet>;
}

/// [`JwksFetcher`] backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct ReqwestJwksFetcher {
    client: reqwest::Client,
}

impl ReqwestJwksFetcher {
    /// Creates a fetcher whose requests time out after the configured JWKS
    /// fetch timeout.
    ///
    /// # Errors
    ///
    /// Returns `idp_core::Error::Config` if the HTTP client cannot be built.
    pub fn from_config(config: &Config) -> idp_core::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.jwks_fetch_timeout())
            .build()
            .map_err(|e| idp_core::Error::Config(format!("cannot build the JWKS HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl JwksFetcher for ReqwestJwksFetcher {
    async fn fetch(&self, jwks_uri: &str) -> Option<JsonWebKeySet> {
        let response = match self.client.get(jwks_uri).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(jwks_uri, error = %e, "JWKS request failed");
                return None;
            }
        };

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(jwks_uri, status = status.as_u16(), "JWKS endpoint returned an error");
            return None;
        }

        match response.json::<JsonWebKeySet>().await {
            Ok(jwks) => {
                tracing::debug!(jwks_uri, keys = jwks.keys.len(), "fetched JWKS");
                Some(jwks)
            }
            Err(e) => {
                tracing::warn!(jwks_uri, error = %e, "JWKS document is not a valid key set");
                None
            }
        }
    }
}
