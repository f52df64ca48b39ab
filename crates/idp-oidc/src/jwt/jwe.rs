//! Compact JWE serialization (RFC 7516).

use idp_crypto::{JweAlg, JweEnc};
use idp_model::{JsonWebKey, KeyUse};
use josekit::jwe::{self, JweDecrypter, JweEncrypter, JweHeader};
use josekit::jwk::Jwk;
use serde_json::{Map, Value};

use crate::error::JwtError;
use crate::jwt::read_header;

/// Encrypts a compact JWS for `key`.
///
/// # Errors
///
/// Returns an error if the key is not an encryption key, its material does
/// not fit `alg`, or encryption fails.
pub fn encrypt(plaintext: &str, alg: JweAlg, enc: JweEnc, key: &JsonWebKey) -> Result<String, JwtError> {
    check_encryption_key(key)?;
    if alg == JweAlg::Dir && secret(key)?.len() != enc.key_len() {
        return Err(invalid(key, format!("{enc} needs a {} byte direct key", enc.key_len())));
    }
    let encrypter = encrypter(key, alg)?;
    serialize(plaintext, enc, key, encrypter.as_ref())
}

/// Encrypts with a key derived from `password` (PBES2).
///
/// # Errors
///
/// Returns an error if `alg` is not password based or `key` is not an
/// encryption key.
pub fn encrypt_with_password(
    plaintext: &str,
    alg: JweAlg,
    enc: JweEnc,
    key: &JsonWebKey,
    password: &str,
) -> Result<String, JwtError> {
    check_encryption_key(key)?;
    let encrypter = password_encrypter(alg, password)?;
    serialize(plaintext, enc, key, encrypter.as_ref())
}

/// Decrypts `jwe` with `key`.
///
/// Returns `None` if the header algorithm is not the key's algorithm or
/// decryption fails.
#[must_use]
pub fn decrypt(jwe: &str, key: &JsonWebKey) -> Option<String> {
    let alg = header_alg(jwe, key)?;
    let decrypter = decrypter(key, alg)
        .map_err(|e| tracing::debug!(kid = %key.kid, error = %e, "no jwe decrypter for key"))
        .ok()?;
    deserialize(jwe, decrypter.as_ref(), &key.kid)
}

/// Decrypts `jwe` with a key derived from `password`.
#[must_use]
pub fn decrypt_with_password(jwe: &str, key: &JsonWebKey, password: &str) -> Option<String> {
    let alg = header_alg(jwe, key)?;
    let decrypter = password_decrypter(alg, password).ok()?;
    deserialize(jwe, decrypter.as_ref(), &key.kid)
}

fn check_encryption_key(key: &JsonWebKey) -> Result<(), JwtError> {
    if key.key_use == KeyUse::Enc {
        Ok(())
    } else {
        Err(JwtError::KeyUseMismatch {
            kid: key.kid.clone(),
            expected: KeyUse::Enc,
        })
    }
}

fn header_alg(jwe: &str, key: &JsonWebKey) -> Option<JweAlg> {
    let alg = read_header(jwe)?.jwe_alg()?;
    (key.jwe_alg() == Some(alg)).then_some(alg)
}

fn serialize(
    plaintext: &str,
    enc: JweEnc,
    key: &JsonWebKey,
    encrypter: &dyn JweEncrypter,
) -> Result<String, JwtError> {
    let mut header = JweHeader::new();
    header.set_content_encryption(enc.jwa_name());
    header.set_key_id(key.kid.as_str());
    header.set_content_type("JWT");

    jwe::serialize_compact(plaintext.as_bytes(), &header, encrypter)
        .map_err(|e| JwtError::Encryption(e.to_string()))
}

fn deserialize(jwe: &str, decrypter: &dyn JweDecrypter, kid: &str) -> Option<String> {
    let (bytes, _) = jwe::deserialize_compact(jwe, decrypter)
        .map_err(|e| tracing::debug!(kid, error = %e, "jwe decryption failed"))
        .ok()?;
    String::from_utf8(bytes).ok()
}

fn invalid(key: &JsonWebKey, reason: impl ToString) -> JwtError {
    JwtError::InvalidKey {
        kid: key.kid.clone(),
        reason: reason.to_string(),
    }
}

fn public_rsa_jwk(key: &JsonWebKey) -> Result<Jwk, JwtError> {
    let (Some(n), Some(e)) = (key.n.as_deref(), key.e.as_deref()) else {
        return Err(invalid(key, "missing RSA public members"));
    };
    let mut map = Map::new();
    map.insert("kty".to_string(), Value::from("RSA"));
    map.insert("n".to_string(), Value::from(n));
    map.insert("e".to_string(), Value::from(e));
    Jwk::from_map(map).map_err(|e| invalid(key, e))
}

fn secret(key: &JsonWebKey) -> Result<Vec<u8>, JwtError> {
    key.symmetric_key()
        .ok_or_else(|| invalid(key, "missing symmetric value"))
}

#[allow(deprecated)]
fn encrypter(key: &JsonWebKey, alg: JweAlg) -> Result<Box<dyn JweEncrypter>, JwtError> {
    let boxed: Box<dyn JweEncrypter> = match alg {
        JweAlg::RsaPkcs1V15 => Box::new(
            jwe::RSA1_5
                .encrypter_from_jwk(&public_rsa_jwk(key)?)
                .map_err(|e| invalid(key, e))?,
        ),
        JweAlg::RsaOaep => Box::new(
            jwe::RSA_OAEP
                .encrypter_from_jwk(&public_rsa_jwk(key)?)
                .map_err(|e| invalid(key, e))?,
        ),
        JweAlg::RsaOaep256 => Box::new(
            jwe::RSA_OAEP_256
                .encrypter_from_jwk(&public_rsa_jwk(key)?)
                .map_err(|e| invalid(key, e))?,
        ),
        JweAlg::A128Kw => Box::new(jwe::A128KW.encrypter_from_bytes(secret(key)?).map_err(|e| invalid(key, e))?),
        JweAlg::A256Kw => Box::new(jwe::A256KW.encrypter_from_bytes(secret(key)?).map_err(|e| invalid(key, e))?),
        JweAlg::Dir => Box::new(jwe::Dir.encrypter_from_bytes(secret(key)?).map_err(|e| invalid(key, e))?),
        JweAlg::Pbes2Hs256A128Kw | JweAlg::Pbes2Hs512A256Kw => {
            return Err(JwtError::UnsupportedAlgorithm(format!(
                "{} requires a password",
                alg.jwa_name()
            )))
        }
    };
    Ok(boxed)
}

#[allow(deprecated)]
fn decrypter(key: &JsonWebKey, alg: JweAlg) -> Result<Box<dyn JweDecrypter>, JwtError> {
    let private_pem = || {
        key.private_key_pem
            .as_deref()
            .ok_or_else(|| invalid(key, "missing private key"))
    };
    let boxed: Box<dyn JweDecrypter> = match alg {
        JweAlg::RsaPkcs1V15 => Box::new(jwe::RSA1_5.decrypter_from_pem(private_pem()?).map_err(|e| invalid(key, e))?),
        JweAlg::RsaOaep => Box::new(jwe::RSA_OAEP.decrypter_from_pem(private_pem()?).map_err(|e| invalid(key, e))?),
        JweAlg::RsaOaep256 => {
            Box::new(jwe::RSA_OAEP_256.decrypter_from_pem(private_pem()?).map_err(|e| invalid(key, e))?)
        }
        JweAlg::A128Kw => Box::new(jwe::A128KW.decrypter_from_bytes(secret(key)?).map_err(|e| invalid(key, e))?),
        JweAlg::A256Kw => Box::new(jwe::A256KW.decrypter_from_bytes(secret(key)?).map_err(|e| invalid(key, e))?),
        JweAlg::Dir => Box::new(jwe::Dir.decrypter_from_bytes(secret(key)?).map_err(|e| invalid(key, e))?),
        JweAlg::Pbes2Hs256A128Kw | JweAlg::Pbes2Hs512A256Kw => {
            return Err(JwtError::UnsupportedAlgorithm(format!(
                "{} requires a password",
                alg.jwa_name()
            )))
        }
    };
    Ok(boxed)
}

fn password_encrypter(alg: JweAlg, password: &str) -> Result<Box<dyn JweEncrypter>, JwtError> {
    let failed = |e: josekit::JoseError| JwtError::Encryption(e.to_string());
    match alg {
        JweAlg::Pbes2Hs256A128Kw => Ok(Box::new(
            jwe::PBES2_HS256_A128KW.encrypter_from_bytes(password.as_bytes()).map_err(failed)?,
        )),
        JweAlg::Pbes2Hs512A256Kw => Ok(Box::new(
            jwe::PBES2_HS512_A256KW.encrypter_from_bytes(password.as_bytes()).map_err(failed)?,
        )),
        other => Err(JwtError::UnsupportedAlgorithm(format!(
            "{} is not password based",
            other.jwa_name()
        ))),
    }
}

fn password_decrypter(alg: JweAlg, password: &str) -> Result<Box<dyn JweDecrypter>, JwtError> {
    let failed = |e: josekit::JoseError| JwtError::Encryption(e.to_string());
    match alg {
        JweAlg::Pbes2Hs256A128Kw => Ok(Box::new(
            jwe::PBES2_HS256_A128KW.decrypter_from_bytes(password.as_bytes()).map_err(failed)?,
        )),
        JweAlg::Pbes2Hs512A256Kw => Ok(Box::new(
            jwe::PBES2_HS512_A256KW.decrypter_from_bytes(password.as_bytes()).map_err(failed)?,
        )),
        other => Err(JwtError::UnsupportedAlgorithm(format!(
            "{} is not password based",
            other.jwa_name()
        ))),
    }
}
