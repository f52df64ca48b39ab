//! JSON Web Key (JWK) model.
//!
//! Implements the key representation of:
//! - [RFC 7517](https://tools.ietf.org/html/rfc7517) (JSON Web Key)
//! - [RFC 7518](https://tools.ietf.org/html/rfc7518) (JSON Web Algorithms)
//!
//! A key is immutable once issued; its `kid` is its identity. Public members
//! (`n`/`e`, `crv`/`x`/`y`) travel in published key sets, while private
//! material is held as PEM and symmetric secrets as `k`. Use
//! [`JsonWebKey::to_public`] before publishing a key.

use std::fmt;
use std::str::FromStr;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use idp_crypto::{AlgorithmError, JweAlg, JwsAlg};
use serde::{Deserialize, Deserializer, Serialize};

/// JSON Web Key Set.
///
/// Deserialization keeps every entry this model can represent and skips the
/// rest (other key types, keys without `use` or `alg`), so a published set
/// still resolves the keys it does understand.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JsonWebKeySet {
    /// Array of JSON Web Keys.
    #[serde(deserialize_with = "supported_keys")]
    pub keys: Vec<JsonWebKey>,
}

fn supported_keys<'de, D>(deserializer: D) -> Result<Vec<JsonWebKey>, D::Error>
where
    D: Deserializer<'de>,
{
    let entries = Vec::<serde_json::Value>::deserialize(deserializer)?;
    Ok(entries
        .into_iter()
        .filter_map(|entry| serde_json::from_value(entry).ok())
        .collect())
}

impl JsonWebKeySet {
    /// Creates a JWKS with the given keys.
    #[must_use]
    pub const fn with_keys(keys: Vec<JsonWebKey>) -> Self {
        Self { keys }
    }

    /// Finds a key by its ID.
    #[must_use]
    pub fn find_key(&self, kid: &str) -> Option<&JsonWebKey> {
        self.keys.iter().find(|k| k.kid == kid)
    }

    /// Returns the publishable form of the set.
    ///
    /// Private material is stripped and symmetric keys are left out.
    #[must_use]
    pub fn to_public(&self) -> Self {
        Self {
            keys: self.keys.iter().filter_map(JsonWebKey::to_public).collect(),
        }
    }
}

/// JSON Web Key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonWebKey {
    /// Key ID.
    pub kid: String,

    /// Key type.
    pub kty: KeyType,

    /// Public key use.
    #[serde(rename = "use")]
    pub key_use: KeyUse,

    /// Algorithm intended for use with the key.
    pub alg: KeyAlgorithm,

    /// Key operations. Empty means the key is not restricted beyond `use`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub key_ops: Vec<KeyOperation>,

    /// X.509 URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x5u: Option<String>,

    // === RSA Key Parameters ===
    /// RSA modulus (base64url encoded).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n: Option<String>,

    /// RSA exponent (base64url encoded).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub e: Option<String>,

    // === EC Key Parameters ===
    /// EC curve name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crv: Option<EcCurve>,

    /// EC x coordinate (base64url encoded).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<String>,

    /// EC y coordinate (base64url encoded).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<String>,

    // === Symmetric Key Parameters ===
    /// Symmetric key value (base64url encoded).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub k: Option<String>,

    // === Private Material ===
    /// PEM-encoded private key (PKCS#1 for RSA, PKCS#8 for EC).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_key_pem: Option<String>,
}

impl JsonWebKey {
    /// Creates an RSA key from its base64url-encoded public components.
    #[must_use]
    pub fn rsa(
        kid: impl Into<String>,
        key_use: KeyUse,
        alg: impl Into<KeyAlgorithm>,
        n: impl Into<String>,
        e: impl Into<String>,
    ) -> Self {
        Self {
            n: Some(n.into()),
            e: Some(e.into()),
            ..Self::bare(kid.into(), KeyType::Rsa, key_use, alg.into())
        }
    }

    /// Creates an EC signing key from its base64url-encoded public coordinates.
    #[must_use]
    pub fn ec(
        kid: impl Into<String>,
        alg: JwsAlg,
        curve: EcCurve,
        x: impl Into<String>,
        y: impl Into<String>,
    ) -> Self {
        Self {
            crv: Some(curve),
            x: Some(x.into()),
            y: Some(y.into()),
            ..Self::bare(kid.into(), KeyType::Ec, KeyUse::Sig, alg.into())
        }
    }

    /// Creates a symmetric key.
    #[must_use]
    pub fn symmetric(
        kid: impl Into<String>,
        key_use: KeyUse,
        alg: impl Into<KeyAlgorithm>,
        secret: &[u8],
    ) -> Self {
        Self {
            k: Some(URL_SAFE_NO_PAD.encode(secret)),
            ..Self::bare(kid.into(), KeyType::Oct, key_use, alg.into())
        }
    }

    fn bare(kid: String, kty: KeyType, key_use: KeyUse, alg: KeyAlgorithm) -> Self {
        Self {
            kid,
            kty,
            key_use,
            alg,
            key_ops: Vec::new(),
            x5u: None,
            n: None,
            e: None,
            crv: None,
            x: None,
            y: None,
            k: None,
            private_key_pem: None,
        }
    }

    /// Attaches PEM-encoded private key material.
    #[must_use]
    pub fn with_private_key_pem(mut self, pem: impl Into<String>) -> Self {
        self.private_key_pem = Some(pem.into());
        self
    }

    /// Restricts the key to the given operations.
    #[must_use]
    pub fn with_key_ops(mut self, ops: impl IntoIterator<Item = KeyOperation>) -> Self {
        self.key_ops = ops.into_iter().collect();
        self
    }

    /// Sets the X.509 URL.
    #[must_use]
    pub fn with_x5u(mut self, x5u: impl Into<String>) -> Self {
        self.x5u = Some(x5u.into());
        self
    }

    /// Checks whether the key may be used for `op`.
    ///
    /// A key without `key_ops` allows every operation compatible with its use.
    #[must_use]
    pub fn allows(&self, op: KeyOperation) -> bool {
        self.key_ops.is_empty() || self.key_ops.contains(&op)
    }

    /// Returns the JWS algorithm, when this is a signing key.
    #[must_use]
    pub const fn jws_alg(&self) -> Option<JwsAlg> {
        match self.alg {
            KeyAlgorithm::Jws(alg) => Some(alg),
            KeyAlgorithm::Jwe(_) => None,
        }
    }

    /// Returns the JWE algorithm, when this is an encryption key.
    #[must_use]
    pub const fn jwe_alg(&self) -> Option<JweAlg> {
        match self.alg {
            KeyAlgorithm::Jwe(alg) => Some(alg),
            KeyAlgorithm::Jws(_) => None,
        }
    }

    /// Decodes the symmetric key value.
    #[must_use]
    pub fn symmetric_key(&self) -> Option<Vec<u8>> {
        self.k
            .as_deref()
            .and_then(|k| URL_SAFE_NO_PAD.decode(k).ok())
    }

    /// Returns the publishable form of the key.
    ///
    /// Private material is removed; symmetric keys have no public form.
    #[must_use]
    pub fn to_public(&self) -> Option<Self> {
        if self.kty == KeyType::Oct {
            return None;
        }
        let mut key = self.clone();
        key.private_key_pem = None;
        Some(key)
    }
}

/// Key type for JWK.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyType {
    /// RSA key.
    #[serde(rename = "RSA")]
    Rsa,

    /// Elliptic Curve key.
    #[serde(rename = "EC")]
    Ec,

    /// Octet sequence (symmetric key).
    #[serde(rename = "oct")]
    Oct,
}

/// Intended use of a public key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyUse {
    /// Signature.
    Sig,
    /// Encryption.
    Enc,
}

impl fmt::Display for KeyUse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sig => write!(f, "sig"),
            Self::Enc => write!(f, "enc"),
        }
    }
}

/// Key operations (RFC 7517 Section 4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum KeyOperation {
    /// Compute digital signature or MAC.
    Sign,
    /// Verify digital signature or MAC.
    Verify,
    /// Encrypt content.
    Encrypt,
    /// Decrypt content and validate decryption.
    Decrypt,
    /// Encrypt key.
    WrapKey,
    /// Decrypt key and validate decryption.
    UnwrapKey,
}

/// Elliptic curve names for JWK.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EcCurve {
    /// NIST P-256 curve.
    #[serde(rename = "P-256")]
    P256,

    /// NIST P-384 curve.
    #[serde(rename = "P-384")]
    P384,
}

impl EcCurve {
    /// Returns the curve name as a string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::P256 => "P-256",
            Self::P384 => "P-384",
        }
    }
}

/// Algorithm bound to a key: a JWS algorithm for `use=sig`, a JWE key
/// management algorithm for `use=enc`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum KeyAlgorithm {
    /// Signature algorithm.
    Jws(JwsAlg),
    /// Key management algorithm.
    Jwe(JweAlg),
}

impl KeyAlgorithm {
    /// Returns the JWA name.
    #[must_use]
    pub const fn jwa_name(self) -> &'static str {
        match self {
            Self::Jws(alg) => alg.jwa_name(),
            Self::Jwe(alg) => alg.jwa_name(),
        }
    }
}

impl From<JwsAlg> for KeyAlgorithm {
    fn from(alg: JwsAlg) -> Self {
        Self::Jws(alg)
    }
}

impl From<JweAlg> for KeyAlgorithm {
    fn from(alg: JweAlg) -> Self {
        Self::Jwe(alg)
    }
}

impl fmt::Display for KeyAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.jwa_name())
    }
}

impl FromStr for KeyAlgorithm {
    type Err = AlgorithmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        JwsAlg::from_jwa(s)
            .map(Self::Jws)
            .or_else(|_| JweAlg::from_jwa(s).map(Self::Jwe))
    }
}

impl TryFrom<String> for KeyAlgorithm {
    type Error = AlgorithmError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<KeyAlgorithm> for String {
    fn from(alg: KeyAlgorithm) -> Self {
        alg.jwa_name().to_string()
    }
}
