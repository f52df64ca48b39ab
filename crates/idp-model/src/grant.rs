//! Artifacts issued by the authorization endpoint.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::CodeChallengeMethod;

/// A claim set stored alongside an issued artifact.
pub type ClaimSet = Map<String, Value>;

// ============================================================================
// Authorization Code
// ============================================================================

/// Stored authorization code data.
///
/// Issued by the authorization endpoint and kept until it is exchanged for
/// tokens. Only the hash of the code value is stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorizationCode {
    /// The authorization code value (hashed for security).
    pub code_hash: String,

    /// Client ID that requested the code.
    pub client_id: String,

    /// Redirect URI used in the request.
    pub redirect_uri: String,

    /// Granted scopes.
    pub scopes: Vec<String>,

    /// Identity token claims computed at authorization time.
    pub id_token_payload: Option<ClaimSet>,

    /// UserInfo claims computed at authorization time.
    pub userinfo_payload: Option<ClaimSet>,

    /// PKCE code challenge.
    pub code_challenge: Option<String>,

    /// PKCE code challenge method.
    pub code_challenge_method: Option<CodeChallengeMethod>,

    /// When the code was created.
    pub created_at: DateTime<Utc>,

    /// When the code expires.
    pub expires_at: DateTime<Utc>,
}

/// Parameters for creating a new authorization code.
pub struct AuthorizationCodeParams {
    /// The raw authorization code value.
    pub code: String,
    /// OAuth `client_id`.
    pub client_id: String,
    /// Redirect URI.
    pub redirect_uri: String,
    /// Granted scopes.
    pub scopes: Vec<String>,
    /// TTL in seconds.
    pub ttl_seconds: i64,
}

impl AuthorizationCode {
    /// Creates a new stored authorization code from parameters.
    #[must_use]
    pub fn new(params: AuthorizationCodeParams) -> Self {
        let now = Utc::now();
        Self {
            code_hash: Self::hash_code(&params.code),
            client_id: params.client_id,
            redirect_uri: params.redirect_uri,
            scopes: params.scopes,
            id_token_payload: None,
            userinfo_payload: None,
            code_challenge: None,
            code_challenge_method: None,
            created_at: now,
            expires_at: now + Duration::seconds(params.ttl_seconds),
        }
    }

    /// Attaches the identity token and UserInfo claims.
    #[must_use]
    pub fn with_payloads(mut self, id_token: Option<ClaimSet>, userinfo: Option<ClaimSet>) -> Self {
        self.id_token_payload = id_token;
        self.userinfo_payload = userinfo;
        self
    }

    /// Sets PKCE parameters.
    #[must_use]
    pub fn with_pkce(
        mut self,
        challenge: Option<String>,
        method: Option<CodeChallengeMethod>,
    ) -> Self {
        self.code_challenge = challenge;
        self.code_challenge_method = method;
        self
    }

    /// Checks if the code has expired.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }

    /// Verifies the code value.
    #[must_use]
    pub fn verify_code(&self, code: &str) -> bool {
        Self::hash_code(code) == self.code_hash
    }

    /// Hashes an authorization code for storage and lookup.
    #[must_use]
    pub fn hash_code(code: &str) -> String {
        let hash = idp_crypto::sha256(code.as_bytes());
        base64::Engine::encode(&base64::engine::general_purpose::URL_SAFE_NO_PAD, hash)
    }
}

// ============================================================================
// Granted Token
// ============================================================================

/// An access token issued to a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrantedToken {
    /// Opaque access token.
    pub access_token: String,
    /// Opaque refresh token.
    pub refresh_token: Option<String>,
    /// Identity token issued with the access token, if any.
    pub id_token: Option<String>,
    /// Token type (always `Bearer`).
    pub token_type: String,
    /// Client the token was issued to.
    pub client_id: String,
    /// Granted scopes, space-separated.
    pub scope: String,
    /// Lifetime in seconds.
    pub expires_in: i64,
    /// Identity token claims bound to the token.
    pub id_token_payload: Option<ClaimSet>,
    /// UserInfo claims bound to the token.
    pub userinfo_payload: Option<ClaimSet>,
    /// When the token was issued.
    pub created_at: DateTime<Utc>,
}

impl GrantedToken {
    /// Checks whether the token is still within its lifetime at `now`.
    #[must_use]
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.created_at + Duration::seconds(self.expires_in)
    }

    /// Checks whether the token is still within its lifetime.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.is_valid_at(Utc::now())
    }
}
