//! Configuration management for the identity provider.
//!
//! Configuration is loaded from environment variables (optionally seeded from a
//! `.env` file) with sensible defaults, and validated before use.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Issuer configuration.
    pub issuer: IssuerConfig,
    /// Token lifetimes.
    pub tokens: TokenConfig,
    /// Cryptographic configuration.
    pub crypto: CryptoConfig,
    /// Remote JSON Web Key Set retrieval.
    pub jwks: JwksConfig,
}

/// Issuer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssuerConfig {
    /// Issuer identifier placed in the `iss` claim and expected in the
    /// audience of `id_token_hint` tokens.
    pub name: String,
}

/// Token lifetimes, in seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenConfig {
    /// Default validity of access and identity tokens.
    pub validity_seconds: i64,
    /// Validity of authorization codes.
    pub authorization_code_validity_seconds: i64,
}

/// Cryptographic configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CryptoConfig {
    /// JWS algorithm used for identity tokens when the client has no preference.
    pub default_id_token_signing_alg: String,
    /// Content encryption used when a client asks for encrypted identity tokens
    /// without naming an `enc` value.
    pub default_id_token_encryption_enc: String,
    /// Accept `alg=none` tokens when reading request objects and hints.
    ///
    /// Unsigned tokens skip signature validation entirely, so this stays off
    /// unless a deployment explicitly relies on them.
    pub allow_unsigned_tokens: bool,
}

/// Remote JSON Web Key Set retrieval.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwksConfig {
    /// Timeout applied to every JWKS fetch, in milliseconds.
    pub fetch_timeout_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            issuer: IssuerConfig {
                name: "https://localhost:5443".to_string(),
            },
            tokens: TokenConfig {
                validity_seconds: 3600,
                authorization_code_validity_seconds: 600,
            },
            crypto: CryptoConfig {
                default_id_token_signing_alg: "RS256".to_string(),
                default_id_token_encryption_enc: "A128CBC-HS256".to_string(),
                allow_unsigned_tokens: false,
            },
            jwks: JwksConfig {
                fetch_timeout_ms: 5000,
            },
        }
    }
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// A `.env` file in the working directory is read first when present.
    ///
    /// ## Errors
    ///
    /// Returns [`Error::Config`] when the resulting configuration is invalid.
    pub fn from_env() -> Result<Self> {
        // Load .env file if it exists
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds configuration from an arbitrary variable lookup.
    ///
    /// Unset or unparsable variables fall back to [`Config::default`].
    ///
    /// ## Errors
    ///
    /// Returns [`Error::Config`] when the resulting configuration is invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let name = lookup("IDP_ISSUER").unwrap_or(defaults.issuer.name);

        let validity_seconds = lookup("IDP_TOKEN_VALIDITY_SECONDS")
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.tokens.validity_seconds);

        let authorization_code_validity_seconds = lookup("IDP_AUTH_CODE_VALIDITY_SECONDS")
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.tokens.authorization_code_validity_seconds);

        let default_id_token_signing_alg = lookup("IDP_ID_TOKEN_SIGNING_ALG")
            .unwrap_or(defaults.crypto.default_id_token_signing_alg);

        let default_id_token_encryption_enc = lookup("IDP_ID_TOKEN_ENCRYPTION_ENC")
            .unwrap_or(defaults.crypto.default_id_token_encryption_enc);

        let allow_unsigned_tokens = lookup("IDP_ALLOW_UNSIGNED_TOKENS")
            .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
            .unwrap_or(defaults.crypto.allow_unsigned_tokens);

        let fetch_timeout_ms = lookup("IDP_JWKS_FETCH_TIMEOUT_MS")
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.jwks.fetch_timeout_ms);

        let config = Self {
            issuer: IssuerConfig { name },
            tokens: TokenConfig {
                validity_seconds,
                authorization_code_validity_seconds,
            },
            crypto: CryptoConfig {
                default_id_token_signing_alg,
                default_id_token_encryption_enc,
                allow_unsigned_tokens,
            },
            jwks: JwksConfig { fetch_timeout_ms },
        };
        config.validate()?;
        Ok(config)
    }

    /// Checks the configuration for values the authorization core cannot use.
    ///
    /// ## Errors
    ///
    /// Returns [`Error::Config`] naming the first offending setting.
    pub fn validate(&self) -> Result<()> {
        if self.issuer.name.trim().is_empty() {
            return Err(Error::Config("issuer name must not be empty".to_string()));
        }
        if self.tokens.validity_seconds <= 0 {
            return Err(Error::Config(
                "token validity must be a positive number of seconds".to_string(),
            ));
        }
        if self.tokens.authorization_code_validity_seconds <= 0 {
            return Err(Error::Config(
                "authorization code validity must be a positive number of seconds".to_string(),
            ));
        }
        if self.crypto.default_id_token_signing_alg.trim().is_empty() {
            return Err(Error::Config(
                "default id_token signing algorithm must be set".to_string(),
            ));
        }
        if self.jwks.fetch_timeout_ms == 0 {
            return Err(Error::Config("JWKS fetch timeout must be non-zero".to_string()));
        }
        Ok(())
    }

    /// Configuration suited to tests: short lifetimes, default issuer.
    #[must_use]
    pub fn for_testing() -> Self {
        let mut config = Self::default();
        config.issuer.name = "https://idp.test".to_string();
        config.tokens.validity_seconds = 300;
        config.tokens.authorization_code_validity_seconds = 60;
        config.jwks.fetch_timeout_ms = 1000;
        config
    }

    /// Returns the JWKS fetch timeout as a duration.
    #[must_use]
    pub const fn jwks_fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.jwks.fetch_timeout_ms)
    }
}
