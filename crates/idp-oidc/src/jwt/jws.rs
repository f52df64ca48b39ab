//! Compact JWS serialization (RFC 7515).

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use idp_crypto::JwsAlg;
use idp_model::{ClaimSet, JsonWebKey, KeyUse};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};

use crate::error::JwtError;
use crate::jwt::payload::JwsPayload;
use crate::jwt::read_header;

/// Maps a JWS algorithm to `jsonwebtoken`. `none` has no mapping.
const fn jwt_algorithm(alg: JwsAlg) -> Option<Algorithm> {
    match alg {
        JwsAlg::None => None,
        JwsAlg::Hs256 => Some(Algorithm::HS256),
        JwsAlg::Hs384 => Some(Algorithm::HS384),
        JwsAlg::Hs512 => Some(Algorithm::HS512),
        JwsAlg::Rs256 => Some(Algorithm::RS256),
        JwsAlg::Rs384 => Some(Algorithm::RS384),
        JwsAlg::Rs512 => Some(Algorithm::RS512),
        JwsAlg::Ps256 => Some(Algorithm::PS256),
        JwsAlg::Ps384 => Some(Algorithm::PS384),
        JwsAlg::Ps512 => Some(Algorithm::PS512),
        JwsAlg::Es256 => Some(Algorithm::ES256),
        JwsAlg::Es384 => Some(Algorithm::ES384),
    }
}

/// Signs a payload with `key`.
///
/// # Errors
///
/// Returns an error if the key is not a signing key for `alg`, lacks private
/// material, or signing fails.
pub fn sign(payload: &JwsPayload, alg: JwsAlg, key: &JsonWebKey) -> Result<String, JwtError> {
    if key.key_use != KeyUse::Sig {
        return Err(JwtError::KeyUseMismatch {
            kid: key.kid.clone(),
            expected: KeyUse::Sig,
        });
    }
    let algorithm =
        jwt_algorithm(alg).ok_or_else(|| JwtError::UnsupportedAlgorithm(alg.jwa_name().to_string()))?;

    let mut header = Header::new(algorithm);
    header.kid = Some(key.kid.clone());
    header.typ = Some("JWT".to_string());

    encode(&header, payload.claims(), &encoding_key(key, alg)?)
        .map_err(|e| JwtError::Signing(e.to_string()))
}

/// Serializes an unsecured JWS (`alg=none`).
///
/// # Errors
///
/// Returns an error if the payload cannot be serialized.
pub fn sign_unsecured(payload: &JwsPayload) -> Result<String, JwtError> {
    let header = serde_json::json!({ "alg": JwsAlg::None.jwa_name(), "typ": "JWT" });
    let header = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&header)?);
    let body = URL_SAFE_NO_PAD.encode(serde_json::to_vec(payload)?);
    Ok(format!("{header}.{body}."))
}

/// Verifies the signature of `jws` with `key` and returns its payload.
///
/// Returns `None` if the header algorithm is not the key's algorithm, the
/// key material is unusable, or the signature does not verify.
#[must_use]
pub fn verify(jws: &str, key: &JsonWebKey) -> Option<JwsPayload> {
    let alg = read_header(jws)?.jws_alg()?;
    if key.jws_alg() != Some(alg) {
        return None;
    }
    let algorithm = jwt_algorithm(alg)?;
    let decoding_key = decoding_key(key, alg)?;

    let mut validation = Validation::new(algorithm);
    validation.required_spec_claims.clear();
    validation.validate_exp = false;
    validation.validate_aud = false;

    decode::<ClaimSet>(jws, &decoding_key, &validation)
        .map(|data| JwsPayload::from(data.claims))
        .map_err(|e| tracing::debug!(kid = %key.kid, error = %e, "jws signature rejected"))
        .ok()
}

/// Returns the payload of a JWS without checking its signature.
#[must_use]
pub fn unverified_payload(jws: &str) -> Option<JwsPayload> {
    let body = jws.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD.decode(body).ok()?;
    serde_json::from_slice::<ClaimSet>(&bytes).ok().map(JwsPayload::from)
}

fn encoding_key(key: &JsonWebKey, alg: JwsAlg) -> Result<EncodingKey, JwtError> {
    let invalid = |reason: &str| JwtError::InvalidKey {
        kid: key.kid.clone(),
        reason: reason.to_string(),
    };

    if alg.is_hmac() {
        let secret = key.symmetric_key().ok_or_else(|| invalid("missing symmetric value"))?;
        return Ok(EncodingKey::from_secret(&secret));
    }

    let pem = key
        .private_key_pem
        .as_deref()
        .ok_or_else(|| invalid("missing private key"))?;
    if alg.is_rsa() {
        EncodingKey::from_rsa_pem(pem.as_bytes()).map_err(|e| invalid(&e.to_string()))
    } else if alg.is_ecdsa() {
        EncodingKey::from_ec_pem(pem.as_bytes()).map_err(|e| invalid(&e.to_string()))
    } else {
        Err(JwtError::UnsupportedAlgorithm(alg.jwa_name().to_string()))
    }
}

fn decoding_key(key: &JsonWebKey, alg: JwsAlg) -> Option<DecodingKey> {
    if alg.is_hmac() {
        return key.symmetric_key().map(|secret| DecodingKey::from_secret(&secret));
    }
    if alg.is_rsa() {
        let (n, e) = (key.n.as_deref()?, key.e.as_deref()?);
        return DecodingKey::from_rsa_components(n, e).ok();
    }
    if alg.is_ecdsa() {
        let (x, y) = (key.x.as_deref()?, key.y.as_deref()?);
        return DecodingKey::from_ec_components(x, y).ok();
    }
    None
}
