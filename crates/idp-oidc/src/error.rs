//! Authorization error types.
//!
//! Implements OAuth 2.0 and `OpenID` Connect error responses as defined in:
//! - RFC 6749 Section 4.1.2.1 (authorization endpoint errors)
//! - `OpenID` Connect Core 1.0 Section 3.1.2.6
//!
//! Every failure of the authorization pipeline is an [`AuthError`] carrying
//! the error code, a description and, when the request carried one, the
//! original `state` so the caller can redirect the error back to the client.
//! Failures of the JWT codec are [`JwtError`]s; they surface to clients as
//! `server_error`.

use std::fmt;

use idp_model::KeyUse;
use idp_storage::StorageError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// OAuth 2.0 / OIDC error codes returned by the authorization endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthErrorCode {
    /// Missing or malformed parameter, unsupported prompt, PKCE missing.
    InvalidRequest,
    /// Unknown client.
    InvalidClient,
    /// Claims request cannot be satisfied.
    InvalidGrant,
    /// Client is not allowed to use the grant type.
    UnauthorizedClient,
    /// Response type not supported.
    UnsupportedResponseType,
    /// Requested scope unknown or not allowed.
    InvalidScope,
    /// `prompt=none` but the resource owner is not authenticated.
    LoginRequired,
    /// `prompt=none` but the resource owner must interact (consent).
    InteractionRequired,
    /// Unexpected failure of a collaborator.
    ServerError,
}

impl AuthErrorCode {
    /// Returns the OAuth 2.0 error code.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidRequest => "invalid_request",
            Self::InvalidClient => "invalid_client",
            Self::InvalidGrant => "invalid_grant",
            Self::UnauthorizedClient => "unauthorized_client",
            Self::UnsupportedResponseType => "unsupported_response_type",
            Self::InvalidScope => "invalid_scope",
            Self::LoginRequired => "login_required",
            Self::InteractionRequired => "interaction_required",
            Self::ServerError => "server_error",
        }
    }

    /// Returns the HTTP status code used when the error is not redirected.
    #[must_use]
    pub const fn http_status(self) -> u16 {
        match self {
            Self::InvalidRequest
            | Self::InvalidScope
            | Self::UnsupportedResponseType
            | Self::InvalidGrant
            | Self::LoginRequired
            | Self::InteractionRequired => 400,
            Self::InvalidClient => 401,
            Self::UnauthorizedClient => 403,
            Self::ServerError => 500,
        }
    }
}

impl fmt::Display for AuthErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error raised while processing an authorization request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{code}: {message}")]
pub struct AuthError {
    /// Error code.
    pub code: AuthErrorCode,
    /// Human-readable description.
    pub message: String,
    /// `state` of the request, echoed back on redirect.
    pub state: Option<String>,
}

impl AuthError {
    /// Creates an error without state.
    #[must_use]
    pub fn new(code: AuthErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            state: None,
        }
    }

    /// Attaches the request state.
    #[must_use]
    pub fn with_state(mut self, state: Option<&str>) -> Self {
        self.state = state.map(str::to_string);
        self
    }

    /// `invalid_request` error.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(AuthErrorCode::InvalidRequest, message)
    }

    /// `invalid_client` error.
    #[must_use]
    pub fn invalid_client(message: impl Into<String>) -> Self {
        Self::new(AuthErrorCode::InvalidClient, message)
    }

    /// `invalid_grant` error.
    #[must_use]
    pub fn invalid_grant(message: impl Into<String>) -> Self {
        Self::new(AuthErrorCode::InvalidGrant, message)
    }

    /// `unauthorized_client` error.
    #[must_use]
    pub fn unauthorized_client(message: impl Into<String>) -> Self {
        Self::new(AuthErrorCode::UnauthorizedClient, message)
    }

    /// `invalid_scope` error.
    #[must_use]
    pub fn invalid_scope(message: impl Into<String>) -> Self {
        Self::new(AuthErrorCode::InvalidScope, message)
    }

    /// `server_error` error.
    #[must_use]
    pub fn server_error(message: impl Into<String>) -> Self {
        Self::new(AuthErrorCode::ServerError, message)
    }

    /// Returns whether the error can be reported by redirecting to the client.
    ///
    /// An unknown client has no trusted redirection URL, so it is always
    /// rendered directly.
    #[must_use]
    pub fn is_redirectable(&self) -> bool {
        self.code != AuthErrorCode::InvalidClient
    }

    /// Creates an error response for OAuth 2.0/OIDC.
    #[must_use]
    pub fn to_error_response(&self) -> ErrorResponse {
        ErrorResponse {
            error: self.code.as_str().to_string(),
            error_description: Some(self.message.clone()),
            state: self.state.clone(),
        }
    }
}

impl From<StorageError> for AuthError {
    fn from(err: StorageError) -> Self {
        tracing::error!(error = %err, "repository failure during authorization");
        Self::server_error(format!("the request cannot be processed: {err}"))
    }
}

impl From<JwtError> for AuthError {
    fn from(err: JwtError) -> Self {
        tracing::error!(error = %err, "jwt codec failure during authorization");
        Self::server_error(format!("the request cannot be processed: {err}"))
    }
}

/// Errors raised by the JWT codec.
///
/// Failing to *find* a verification or decryption key is not an error: the
/// parser reports it as an empty result. These variants cover misuse and
/// misconfiguration.
#[derive(Debug, Error)]
pub enum JwtError {
    /// A claim was added twice to the same payload.
    #[error("the claim {0} is already present in the payload")]
    DuplicateClaim(String),

    /// No key with `use=sig` supports the algorithm.
    #[error("no signing key available for algorithm {0}")]
    NoSigningKey(String),

    /// No key with `use=enc` supports the algorithm.
    #[error("no encryption key available for algorithm {0}")]
    NoEncryptionKey(String),

    /// A key was selected for an operation its `use` forbids.
    #[error("the key {kid} cannot be used for {expected}")]
    KeyUseMismatch {
        /// Key identifier.
        kid: String,
        /// Use the operation requires.
        expected: KeyUse,
    },

    /// Key material is missing or malformed.
    #[error("invalid key material for {kid}: {reason}")]
    InvalidKey {
        /// Key identifier.
        kid: String,
        /// What is wrong with it.
        reason: String,
    },

    /// The algorithm is not supported by the codec.
    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// Signing failed.
    #[error("signing failed: {0}")]
    Signing(String),

    /// Encryption failed.
    #[error("encryption failed: {0}")]
    Encryption(String),

    /// The payload cannot be serialized.
    #[error("payload serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The client id passed to the parser is empty.
    #[error("the client id is missing")]
    MissingClientId,

    /// The client id passed to the parser is unknown.
    #[error("the client id parameter {0} doesn't exist or is not valid")]
    UnknownClient(String),

    /// A repository failed.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// OAuth 2.0 error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code.
    pub error: String,

    /// Human-readable error description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_description: Option<String>,

    /// State of the failed request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

/// Result type for authorization operations.
pub type AuthResult<T> = Result<T, AuthError>;
