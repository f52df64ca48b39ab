//! Client domain model.
//!
//! Clients represent relying parties that request authentication and
//! authorization from the identity provider (OAuth 2.0 / OIDC clients).

use std::collections::HashSet;

use idp_crypto::{JweAlg, JweEnc, JwsAlg};
use serde::{Deserialize, Serialize};

use crate::jwk::JsonWebKey;
use crate::types::{GrantType, ResponseType};

/// Kind of client credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientSecretType {
    /// Shared secret.
    SharedSecret,
    /// Thumbprint of the client's X.509 certificate.
    X509Thumbprint,
    /// Subject name of the client's X.509 certificate.
    X509Name,
}

/// A client credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientSecret {
    /// Kind of credential.
    pub secret_type: ClientSecretType,
    /// Credential value.
    pub value: String,
}

/// A registered OAuth 2.0 / OIDC client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Client {
    // === Identity ===
    /// Unique client identifier (OAuth `client_id`).
    pub client_id: String,
    /// Display name.
    pub client_name: Option<String>,

    // === Credentials ===
    /// Client credentials.
    pub secrets: Vec<ClientSecret>,

    // === OAuth Flows ===
    /// Allowed grant types. Empty means `authorization_code` only.
    pub grant_types: HashSet<GrantType>,
    /// Allowed response types. Empty means `code` only.
    pub response_types: HashSet<ResponseType>,

    // === URLs ===
    /// Registered redirection URLs, compared by exact string match.
    pub redirection_urls: Vec<String>,
    /// Location of the client's published JSON Web Key Set.
    pub jwks_uri: Option<String>,

    // === Scope ===
    /// Scopes the client may request.
    pub allowed_scopes: Vec<String>,

    // === Security ===
    /// Whether authorization requests must carry a PKCE code challenge.
    pub require_pkce: bool,
    /// JWS algorithm for identity tokens issued to this client.
    pub id_token_signed_response_alg: Option<JwsAlg>,
    /// JWE key management algorithm for identity tokens, if encrypted.
    pub id_token_encrypted_response_alg: Option<JweAlg>,
    /// JWE content encryption for identity tokens, if encrypted.
    pub id_token_encrypted_response_enc: Option<JweEnc>,
    /// Inline JSON Web Key Set.
    pub json_web_keys: Vec<JsonWebKey>,

    // === Tokens ===
    /// Token lifetime override, in seconds.
    pub token_lifetime_seconds: Option<i64>,
}

impl Client {
    /// Creates a client with no grants, no redirection URLs and no scopes.
    #[must_use]
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_name: None,
            secrets: Vec::new(),
            grant_types: HashSet::new(),
            response_types: HashSet::new(),
            redirection_urls: Vec::new(),
            jwks_uri: None,
            allowed_scopes: Vec::new(),
            require_pkce: false,
            id_token_signed_response_alg: None,
            id_token_encrypted_response_alg: None,
            id_token_encrypted_response_enc: None,
            json_web_keys: Vec::new(),
            token_lifetime_seconds: None,
        }
    }

    /// Sets the display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.client_name = Some(name.into());
        self
    }

    /// Adds a shared secret.
    #[must_use]
    pub fn with_shared_secret(mut self, secret: impl Into<String>) -> Self {
        self.secrets.push(ClientSecret {
            secret_type: ClientSecretType::SharedSecret,
            value: secret.into(),
        });
        self
    }

    /// Sets the allowed grant types.
    #[must_use]
    pub fn with_grant_types(mut self, grants: impl IntoIterator<Item = GrantType>) -> Self {
        self.grant_types = grants.into_iter().collect();
        self
    }

    /// Sets the allowed response types.
    #[must_use]
    pub fn with_response_types(mut self, types: impl IntoIterator<Item = ResponseType>) -> Self {
        self.response_types = types.into_iter().collect();
        self
    }

    /// Adds a redirection URL.
    #[must_use]
    pub fn with_redirection_url(mut self, url: impl Into<String>) -> Self {
        self.redirection_urls.push(url.into());
        self
    }

    /// Sets the allowed scopes.
    #[must_use]
    pub fn with_allowed_scopes<S: Into<String>>(mut self, scopes: impl IntoIterator<Item = S>) -> Self {
        self.allowed_scopes = scopes.into_iter().map(Into::into).collect();
        self
    }

    /// Requires PKCE on authorization requests.
    #[must_use]
    pub const fn with_pkce_required(mut self) -> Self {
        self.require_pkce = true;
        self
    }

    /// Sets the identity token signing algorithm.
    #[must_use]
    pub const fn with_id_token_signing_alg(mut self, alg: JwsAlg) -> Self {
        self.id_token_signed_response_alg = Some(alg);
        self
    }

    /// Requests encrypted identity tokens.
    #[must_use]
    pub const fn with_id_token_encryption(mut self, alg: JweAlg, enc: Option<JweEnc>) -> Self {
        self.id_token_encrypted_response_alg = Some(alg);
        self.id_token_encrypted_response_enc = enc;
        self
    }

    /// Adds a key to the inline JSON Web Key Set.
    #[must_use]
    pub fn with_json_web_key(mut self, key: JsonWebKey) -> Self {
        self.json_web_keys.push(key);
        self
    }

    /// Sets the JWKS location.
    #[must_use]
    pub fn with_jwks_uri(mut self, uri: impl Into<String>) -> Self {
        self.jwks_uri = Some(uri.into());
        self
    }

    /// Overrides the token lifetime.
    #[must_use]
    pub const fn with_token_lifetime(mut self, seconds: i64) -> Self {
        self.token_lifetime_seconds = Some(seconds);
        self
    }

    /// Checks whether `url` is one of the registered redirection URLs.
    #[must_use]
    pub fn has_redirection_url(&self, url: &str) -> bool {
        self.redirection_urls.iter().any(|u| u == url)
    }

    /// Checks whether the client supports `response_type`.
    #[must_use]
    pub fn supports_response_type(&self, response_type: ResponseType) -> bool {
        if self.response_types.is_empty() {
            return response_type == ResponseType::Code;
        }
        self.response_types.contains(&response_type)
    }

    /// Finds a key in the inline JSON Web Key Set.
    #[must_use]
    pub fn find_json_web_key(&self, kid: &str) -> Option<&JsonWebKey> {
        self.json_web_keys.iter().find(|k| k.kid == kid)
    }
}
