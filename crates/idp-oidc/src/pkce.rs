//! PKCE (RFC 7636) checks.
//!
//! The authorization endpoint only validates the shape of the challenge and
//! stores it with the code; [`PkceVerifier::verify`] is what the token
//! endpoint runs when the code is exchanged.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use idp_model::{AuthorizationCode, CodeChallengeMethod};

use crate::error::{AuthError, AuthResult};

/// PKCE verifier.
pub struct PkceVerifier;

impl PkceVerifier {
    /// Checks that a code challenge is 43 to 128 unreserved characters.
    ///
    /// A `plain` challenge is the verifier itself, so the verifier alphabet
    /// (`A-Z a-z 0-9 - . _ ~`) applies to both methods.
    ///
    /// # Errors
    ///
    /// Returns `invalid_request` otherwise.
    pub fn validate_challenge(code_challenge: &str) -> AuthResult<()> {
        if code_challenge.len() < 43 || code_challenge.len() > 128 {
            return Err(AuthError::invalid_request(
                "code_challenge must be between 43 and 128 characters",
            ));
        }

        if !code_challenge.chars().all(is_unreserved) {
            return Err(AuthError::invalid_request(
                "code_challenge contains invalid characters",
            ));
        }

        Ok(())
    }

    /// Verifies the PKCE `code_verifier` against the stored `code_challenge`.
    ///
    /// # Errors
    ///
    /// Returns `invalid_grant` if the verifier is malformed or does not
    /// match.
    pub fn verify(
        code_verifier: &str,
        code_challenge: &str,
        method: CodeChallengeMethod,
    ) -> AuthResult<()> {
        // 43-128 characters, unreserved only
        if code_verifier.len() < 43 || code_verifier.len() > 128 {
            return Err(AuthError::invalid_grant(
                "code_verifier must be between 43 and 128 characters",
            ));
        }

        if !code_verifier.chars().all(is_unreserved) {
            return Err(AuthError::invalid_grant(
                "code_verifier contains invalid characters",
            ));
        }

        let computed_challenge = match method {
            CodeChallengeMethod::Plain => code_verifier.to_string(),
            CodeChallengeMethod::S256 => URL_SAFE_NO_PAD.encode(idp_crypto::sha256(code_verifier.as_bytes())),
        };

        if !idp_crypto::constant_time_eq(computed_challenge.as_bytes(), code_challenge.as_bytes()) {
            return Err(AuthError::invalid_grant("PKCE verification failed"));
        }

        Ok(())
    }

    /// Verifies a verifier against a stored authorization code.
    ///
    /// A code stored without a challenge accepts any exchange.
    ///
    /// # Errors
    ///
    /// Returns `invalid_grant` if the code carries a challenge and the
    /// verifier is missing or does not match.
    pub fn verify_code(code: &AuthorizationCode, code_verifier: Option<&str>) -> AuthResult<()> {
        let Some(challenge) = code.code_challenge.as_deref() else {
            return Ok(());
        };
        let verifier = code_verifier
            .ok_or_else(|| AuthError::invalid_grant("the code_verifier parameter is missing"))?;
        Self::verify(verifier, challenge, code.code_challenge_method.unwrap_or_default())
    }
}

const fn is_unreserved(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_' | '~')
}
