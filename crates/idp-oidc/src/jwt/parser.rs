//! Token verification and decryption.

use std::sync::Arc;

use idp_model::{Client, JsonWebKey, KeyUse};
use idp_storage::{ClientRepository, JsonWebKeyRepository};

use crate::error::JwtError;
use crate::jwt::jwks::JwksFetcher;
use crate::jwt::payload::JwsPayload;
use crate::jwt::{jwe, jws, read_header};

/// Verifies and decrypts tokens.
///
/// Keys come from the server's key repository, or from a client's inline
/// key set and then its `jwks_uri` when a client id is given. A key that
/// cannot be found, or a signature that does not verify, yields `Ok(None)`.
/// Errors are reserved for a bad client id, a repository failure and a key
/// whose `use` contradicts the operation.
pub struct JwtParser {
    keys: Arc<dyn JsonWebKeyRepository>,
    clients: Arc<dyn ClientRepository>,
    jwks_fetcher: Arc<dyn JwksFetcher>,
    allow_unsigned_tokens: bool,
}

impl JwtParser {
    /// Creates a parser.
    #[must_use]
    pub fn new(
        keys: Arc<dyn JsonWebKeyRepository>,
        clients: Arc<dyn ClientRepository>,
        jwks_fetcher: Arc<dyn JwksFetcher>,
        allow_unsigned_tokens: bool,
    ) -> Self {
        Self {
            keys,
            clients,
            jwks_fetcher,
            allow_unsigned_tokens,
        }
    }

    /// Returns whether the token is a compact JWS.
    #[must_use]
    pub fn is_jws(&self, token: &str) -> bool {
        super::is_jws(token)
    }

    /// Returns whether the token is a compact JWE.
    #[must_use]
    pub fn is_jwe(&self, token: &str) -> bool {
        super::is_jwe(token)
    }

    /// Verifies a JWS with a key of the server.
    ///
    /// # Errors
    ///
    /// Returns an error if the key repository fails or the key named by the
    /// header is not a signing key.
    pub async fn unsign(&self, jws: &str) -> Result<Option<JwsPayload>, JwtError> {
        let Some(header) = read_header(jws) else {
            return Ok(None);
        };
        if header.jws_alg() == Some(idp_crypto::JwsAlg::None) {
            return Ok(self.unsecured_payload(jws));
        }
        let Some(kid) = header.kid else {
            return Ok(None);
        };

        let Some(key) = self.keys.get_by_kid(&kid).await? else {
            tracing::debug!(kid, "no server key for jws");
            return Ok(None);
        };
        verify_with(jws, &key)
    }

    /// Verifies a JWS issued by a client.
    ///
    /// # Errors
    ///
    /// Returns an error if `client_id` is empty or unknown, a repository
    /// fails, or the resolved key is not a signing key.
    pub async fn unsign_for_client(&self, jws: &str, client_id: &str) -> Result<Option<JwsPayload>, JwtError> {
        let client = self.client(client_id).await?;
        let Some(header) = read_header(jws) else {
            return Ok(None);
        };
        if header.jws_alg() == Some(idp_crypto::JwsAlg::None) {
            return Ok(self.unsecured_payload(jws));
        }
        let Some(kid) = header.kid else {
            return Ok(None);
        };

        match self.client_key(&client, &kid).await {
            Some(key) => verify_with(jws, &key),
            None => Ok(None),
        }
    }

    /// Decrypts a JWE with a key of the server.
    ///
    /// # Errors
    ///
    /// Returns an error if the key repository fails or the key named by the
    /// header is not an encryption key.
    pub async fn decrypt(&self, jwe: &str) -> Result<Option<String>, JwtError> {
        let Some(kid) = read_header(jwe).and_then(|h| h.kid) else {
            return Ok(None);
        };
        let Some(key) = self.keys.get_by_kid(&kid).await? else {
            tracing::debug!(kid, "no server key for jwe");
            return Ok(None);
        };
        check_use(&key, KeyUse::Enc)?;
        Ok(jwe::decrypt(jwe, &key))
    }

    /// Decrypts a JWE with a key of a client.
    ///
    /// # Errors
    ///
    /// Same as [`JwtParser::unsign_for_client`], for encryption keys.
    pub async fn decrypt_for_client(&self, jwe: &str, client_id: &str) -> Result<Option<String>, JwtError> {
        let client = self.client(client_id).await?;
        let Some(kid) = read_header(jwe).and_then(|h| h.kid) else {
            return Ok(None);
        };
        let Some(key) = self.client_key(&client, &kid).await else {
            return Ok(None);
        };
        check_use(&key, KeyUse::Enc)?;
        Ok(jwe::decrypt(jwe, &key))
    }

    /// Decrypts a PBES2 JWE whose key is derived from `password`. The key
    /// named by the header is taken from the client.
    ///
    /// # Errors
    ///
    /// Same as [`JwtParser::decrypt_for_client`].
    pub async fn decrypt_with_password(
        &self,
        jwe: &str,
        client_id: &str,
        password: &str,
    ) -> Result<Option<String>, JwtError> {
        let client = self.client(client_id).await?;
        let Some(kid) = read_header(jwe).and_then(|h| h.kid) else {
            return Ok(None);
        };
        let Some(key) = self.client_key(&client, &kid).await else {
            return Ok(None);
        };
        check_use(&key, KeyUse::Enc)?;
        Ok(jwe::decrypt_with_password(jwe, &key, password))
    }

    fn unsecured_payload(&self, jws: &str) -> Option<JwsPayload> {
        if self.allow_unsigned_tokens {
            jws::unverified_payload(jws)
        } else {
            tracing::warn!("rejected an unsigned token");
            None
        }
    }

    async fn client(&self, client_id: &str) -> Result<Client, JwtError> {
        if client_id.trim().is_empty() {
            return Err(JwtError::MissingClientId);
        }
        self.clients
            .get_by_client_id(client_id)
            .await?
            .ok_or_else(|| JwtError::UnknownClient(client_id.to_string()))
    }

    async fn client_key(&self, client: &Client, kid: &str) -> Option<JsonWebKey> {
        if let Some(key) = client.find_json_web_key(kid) {
            return Some(key.clone());
        }
        let jwks_uri = client.jwks_uri.as_deref()?;
        let jwks = self.jwks_fetcher.fetch(jwks_uri).await?;
        let key = jwks.find_key(kid).cloned();
        if key.is_none() {
            tracing::debug!(client_id = %client.client_id, kid, "kid not published by client");
        }
        key
    }
}

fn check_use(key: &JsonWebKey, expected: KeyUse) -> Result<(), JwtError> {
    if key.key_use == expected {
        Ok(())
    } else {
        Err(JwtError::KeyUseMismatch {
            kid: key.kid.clone(),
            expected,
        })
    }
}

fn verify_with(jws: &str, key: &JsonWebKey) -> Result<Option<JwsPayload>, JwtError> {
    check_use(key, KeyUse::Sig)?;
    Ok(jws::verify(jws, key))
}
