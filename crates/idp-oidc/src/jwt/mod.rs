//! JWT codec.
//!
//! - [`JwtGenerator`] builds identity token payloads, signs them (JWS) and
//!   encrypts them (JWE) with the server's keys.
//! - [`JwtParser`] verifies and decrypts tokens, resolving keys from the
//!   server's repository or from a client's JSON Web Key Set.
//!
//! Compact JWS is handled by `jsonwebtoken`, compact JWE by `josekit`. The
//! unsecured `none` algorithm is serialized here.
//!
//! ## NIST 800-53 Rev5: SC-13 (Cryptographic Protection)
//!
//! A key is only used for the operation its `use` member declares; a
//! signing key is never accepted for decryption and vice versa.

pub mod generator;
pub mod jwe;
pub mod jwks;
pub mod jws;
pub mod parser;
pub mod payload;

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use idp_crypto::{JweAlg, JwsAlg};
use serde::Deserialize;

pub use generator::JwtGenerator;
pub use jwks::{JwksFetcher, ReqwestJwksFetcher};
pub use parser::JwtParser;
pub use payload::JwsPayload;

/// JOSE protected header members the codec reads.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProtectedHeader {
    /// Algorithm.
    pub alg: String,
    /// Key ID.
    #[serde(default)]
    pub kid: Option<String>,
    /// Content encryption, for JWE.
    #[serde(default)]
    pub enc: Option<String>,
    /// Token type.
    #[serde(default)]
    pub typ: Option<String>,
}

impl ProtectedHeader {
    /// JWS algorithm named by the header.
    #[must_use]
    pub fn jws_alg(&self) -> Option<JwsAlg> {
        JwsAlg::from_jwa(&self.alg).ok()
    }

    /// JWE algorithm named by the header.
    #[must_use]
    pub fn jwe_alg(&self) -> Option<JweAlg> {
        JweAlg::from_jwa(&self.alg).ok()
    }
}

/// Reads the protected header of a compact JWS or JWE.
///
/// Returns `None` when the first segment is not base64url-encoded JSON.
#[must_use]
pub fn read_header(token: &str) -> Option<ProtectedHeader> {
    let first = token.split('.').next()?;
    let bytes = URL_SAFE_NO_PAD.decode(first).ok()?;
    serde_json::from_slice(&bytes).ok()
}

/// Checks whether the token is a compact JWS with a supported algorithm.
#[must_use]
pub fn is_jws(token: &str) -> bool {
    token.split('.').count() == 3
        && read_header(token).and_then(|h| h.jws_alg()).is_some()
}

/// Checks whether the token is a compact JWE with a supported algorithm.
#[must_use]
pub fn is_jwe(token: &str) -> bool {
    token.split('.').count() == 5
        && read_header(token).is_some_and(|h| h.jwe_alg().is_some() && h.enc.is_some())
}
