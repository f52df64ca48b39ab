//! Cryptographically secure random number generation.
//!
//! This module provides secure random generation for:
//! - Authorization codes (OAuth 2.0/OIDC)
//! - Opaque access and refresh tokens
//! - Token identifiers
//!
//! All functions use the thread-local generator, which is cryptographically
//! secure.

use rand::distr::{Alphanumeric, SampleString};
use rand::Rng;

/// Generates a cryptographically secure random byte array.
#[must_use]
pub fn random_bytes(len: usize) -> Vec<u8> {
    let mut rng = rand::rng();
    let mut bytes = vec![0u8; len];
    rng.fill(&mut bytes[..]);
    bytes
}

/// Generates a cryptographically secure random alphanumeric string.
#[must_use]
pub fn random_alphanumeric(len: usize) -> String {
    let mut rng = rand::rng();
    Alphanumeric.sample_string(&mut rng, len)
}

/// Generates a secure random authorization code.
///
/// Creates a 32-character alphanumeric code suitable for OAuth 2.0
/// authorization code flow.
///
/// # Security
///
/// The code has approximately 190 bits of entropy (log2(62^32)),
/// exceeding the minimum 128 bits recommended by RFC 6749.
#[must_use]
pub fn generate_auth_code() -> String {
    random_alphanumeric(32)
}

/// Generates an opaque bearer token (access or refresh token).
///
/// 32 random bytes, URL-safe base64 without padding.
#[must_use]
pub fn generate_opaque_token() -> String {
    random_base64url(32)
}

/// Generates a secure random token identifier.
///
/// Creates a 24-character alphanumeric identifier suitable for
/// token JTI (JWT ID) claims.
#[must_use]
pub fn generate_token_id() -> String {
    random_alphanumeric(24)
}

/// Generates a URL-safe base64-encoded random string.
///
/// # Arguments
///
/// * `byte_len` - Number of random bytes (output will be ~4/3 this length)
#[must_use]
pub fn random_base64url(byte_len: usize) -> String {
    let bytes = random_bytes(byte_len);
    base64::Engine::encode(&base64::engine::general_purpose::URL_SAFE_NO_PAD, bytes)
}
