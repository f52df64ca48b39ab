//! Identity token generation.
//!
//! ## NIST 800-53 Rev5: SC-13 (Cryptographic Protection)
//!
//! Identity tokens are signed with a server key selected by use, algorithm
//! and operation, then encrypted for the client when it registered an
//! encryption algorithm.

use std::sync::Arc;

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::Utc;
use idp_core::Config;
use idp_crypto::{JweAlg, JweEnc, JwsAlg};
use idp_model::{Client, KeyOperation, KeyUse, ResponseType};
use idp_storage::{ClientRepository, JsonWebKeyRepository};
use serde_json::Value;

use crate::claims::{self, ClaimsResolver};
use crate::error::{AuthResult, JwtError};
use crate::jwt::payload::JwsPayload;
use crate::jwt::{jwe, jws};
use crate::parameter::{AuthorizationParameter, ClaimParameter};
use crate::principal::Principal;
use crate::types::{claim_names, ACR_PASSWORD, AMR_PASSWORD};

/// Builds, signs and encrypts identity tokens.
pub struct JwtGenerator {
    config: Arc<Config>,
    keys: Arc<dyn JsonWebKeyRepository>,
    clients: Arc<dyn ClientRepository>,
    claims: ClaimsResolver,
}

impl JwtGenerator {
    /// Creates a generator.
    #[must_use]
    pub fn new(
        config: Arc<Config>,
        keys: Arc<dyn JsonWebKeyRepository>,
        clients: Arc<dyn ClientRepository>,
        claims: ClaimsResolver,
    ) -> Self {
        Self {
            config,
            keys,
            clients,
            claims,
        }
    }

    /// Builds the identity token payload.
    ///
    /// When the request names identity token claims they are the only
    /// resource owner claims released; otherwise the requested scopes decide.
    /// The protocol claims (`iss`, `aud`, `exp`, ...) are added either way.
    ///
    /// # Errors
    ///
    /// Returns `invalid_grant` when a requested claim cannot be satisfied and
    /// `server_error` when a repository fails.
    pub async fn generate_id_token_payload(
        &self,
        parameter: &AuthorizationParameter,
        principal: &Principal,
        client: &Client,
    ) -> AuthResult<JwsPayload> {
        let requested: &[ClaimParameter] = parameter
            .claims
            .as_ref()
            .filter(|c| c.has_id_token_claims())
            .map_or(&[], |c| c.id_token.as_slice());

        let mut payload = if requested.is_empty() {
            self.claims.claims_for_scopes(&parameter.scopes, principal).await?
        } else {
            self.claims.filtered_claims(requested, principal)?
        };
        self.fill_in_identity_token_claims(&mut payload, parameter, principal, client, requested)
            .await?;
        Ok(payload)
    }

    /// Builds the `UserInfo` payload.
    ///
    /// # Errors
    ///
    /// Same as [`JwtGenerator::generate_id_token_payload`].
    pub async fn generate_userinfo_payload(
        &self,
        parameter: &AuthorizationParameter,
        principal: &Principal,
    ) -> AuthResult<JwsPayload> {
        match parameter.claims.as_ref().filter(|c| c.has_userinfo_claims()) {
            Some(claims) => self.claims.filtered_claims(&claims.userinfo, principal),
            None => self.claims.claims_for_scopes(&parameter.scopes, principal).await,
        }
    }

    async fn fill_in_identity_token_claims(
        &self,
        payload: &mut JwsPayload,
        parameter: &AuthorizationParameter,
        principal: &Principal,
        client: &Client,
        requested: &[ClaimParameter],
    ) -> AuthResult<()> {
        let issuer = self.config.issuer.name.as_str();
        let issued_at = Utc::now().timestamp();
        let lifetime = client
            .token_lifetime_seconds
            .unwrap_or(self.config.tokens.validity_seconds);

        let mut audiences: Vec<String> = self
            .clients
            .get_all()
            .await?
            .into_iter()
            .filter(|c| c.supports_response_type(ResponseType::IdToken))
            .map(|c| c.client_id)
            .collect();
        for audience in [client.client_id.as_str(), issuer] {
            if !audiences.iter().any(|a| a == audience) {
                audiences.push(audience.to_string());
            }
        }

        let auth_time_requested = requested
            .iter()
            .any(|c| c.name == claim_names::AUTH_TIME && c.is_essential());

        let mut standard: Vec<(&str, Value)> = vec![
            (claim_names::ISSUER, Value::from(issuer)),
            (claim_names::AUDIENCES, Value::from(audiences.clone())),
            (claim_names::EXPIRATION_TIME, Value::from(issued_at + lifetime)),
            (claim_names::ISSUED_AT, Value::from(issued_at)),
        ];
        if auth_time_requested || parameter.max_age.is_some() {
            if let Some(auth_instant) = principal.auth_instant {
                standard.push((claim_names::AUTH_TIME, Value::from(auth_instant)));
            }
        }
        if let Some(nonce) = parameter.nonce.as_deref() {
            standard.push((claim_names::NONCE, Value::from(nonce)));
        }
        standard.push((claim_names::ACR, Value::from(ACR_PASSWORD)));
        let amr = if parameter.amr_values.is_empty() {
            vec![AMR_PASSWORD.to_string()]
        } else {
            parameter.amr_values.clone()
        };
        standard.push((claim_names::AMR, Value::from(amr)));
        if audiences.len() > 1 || audiences.first() != Some(&client.client_id) {
            standard.push((claim_names::AZP, Value::from(client.client_id.as_str())));
        }

        for (name, value) in standard {
            if let Some(claim) = requested.iter().find(|c| c.name == name) {
                if !claims::is_satisfied(claim, Some(&value)) {
                    return Err(claims::invalid_claim(name));
                }
            }
            payload.add(name, value)?;
        }
        Ok(())
    }

    /// Adds `c_hash` and `at_hash` for the identity token algorithm.
    ///
    /// The hash is the left half of the digest matching the algorithm's hash
    /// size, base64url encoded. Nothing is added for `none`.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateClaim` if a hash is already present.
    pub fn fill_in_hashes(
        payload: &mut JwsPayload,
        alg: JwsAlg,
        code: Option<&str>,
        access_token: Option<&str>,
    ) -> Result<(), JwtError> {
        let Some(hash_alg) = alg.hash_algorithm() else {
            return Ok(());
        };
        let left_half = |value: &str| {
            let digest = idp_crypto::hash(hash_alg, value.as_bytes());
            URL_SAFE_NO_PAD.encode(&digest[..digest.len() / 2])
        };
        if let Some(code) = code {
            payload.add(claim_names::C_HASH, left_half(code))?;
        }
        if let Some(access_token) = access_token {
            payload.add(claim_names::AT_HASH, left_half(access_token))?;
        }
        Ok(())
    }

    /// Signs a payload with the first server key for `alg`.
    ///
    /// # Errors
    ///
    /// Returns `NoSigningKey` if no key with `use=sig` supports `alg`.
    pub async fn sign(&self, payload: &JwsPayload, alg: JwsAlg) -> Result<String, JwtError> {
        if alg == JwsAlg::None {
            return jws::sign_unsecured(payload);
        }
        let keys = self
            .keys
            .get_by_algorithm(KeyUse::Sig, alg.into(), &[KeyOperation::Sign])
            .await?;
        let key = keys
            .first()
            .ok_or_else(|| JwtError::NoSigningKey(alg.jwa_name().to_string()))?;
        tracing::debug!(kid = %key.kid, %alg, "signing jws");
        jws::sign(payload, alg, key)
    }

    /// Encrypts a JWS with the first server key for `alg`.
    ///
    /// # Errors
    ///
    /// Returns `NoEncryptionKey` if no key with `use=enc` supports `alg`.
    pub async fn encrypt(&self, jws: &str, alg: JweAlg, enc: JweEnc) -> Result<String, JwtError> {
        let keys = self
            .keys
            .get_by_algorithm(KeyUse::Enc, alg.into(), &[KeyOperation::Encrypt])
            .await?;
        let key = keys
            .first()
            .ok_or_else(|| JwtError::NoEncryptionKey(alg.jwa_name().to_string()))?;
        tracing::debug!(kid = %key.kid, %alg, %enc, "encrypting jws");
        jwe::encrypt(jws, alg, enc, key)
    }

    /// Signing algorithm for the client's identity tokens.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedAlgorithm` if the client has no preference and the
    /// configured default is not a JWS algorithm.
    pub fn id_token_signing_alg(&self, client: &Client) -> Result<JwsAlg, JwtError> {
        match client.id_token_signed_response_alg {
            Some(alg) => Ok(alg),
            None => {
                let default = &self.config.crypto.default_id_token_signing_alg;
                JwsAlg::from_jwa(default).map_err(|_| JwtError::UnsupportedAlgorithm(default.clone()))
            }
        }
    }

    /// Signs the payload with the client's algorithm, then encrypts it when
    /// the client registered an encryption algorithm.
    ///
    /// # Errors
    ///
    /// Returns an error if no suitable key exists or a JOSE operation fails.
    pub async fn generate_id_token(&self, client: &Client, payload: &JwsPayload) -> Result<String, JwtError> {
        let alg = self.id_token_signing_alg(client)?;
        let jws = self.sign(payload, alg).await?;

        let Some(enc_alg) = client.id_token_encrypted_response_alg else {
            return Ok(jws);
        };
        let enc = match client.id_token_encrypted_response_enc {
            Some(enc) => enc,
            None => {
                let default = &self.config.crypto.default_id_token_encryption_enc;
                JweEnc::from_jwa(default).map_err(|_| JwtError::UnsupportedAlgorithm(default.clone()))?
            }
        };
        self.encrypt(&jws, enc_alg, enc).await
    }
}
